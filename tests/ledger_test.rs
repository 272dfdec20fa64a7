mod common;

use common::TestApp;
use medstock_api::{
    entities::stock_movement::MovementType, models::PoolTag, services::ledger::MovementFilter,
};

#[tokio::test]
async fn receiving_stock_writes_an_opening_entrada() {
    let app = TestApp::new().await;
    let record = app.receive(PoolTag::GeneralStock, "Glucómetro", 7).await;

    let movements = app
        .services
        .ledger
        .query(MovementFilter::default())
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    let opening = &movements[0];
    assert_eq!(opening.item_id, record.id);
    assert_eq!(opening.movement_type, MovementType::Entrada);
    assert_eq!(opening.quantity, 7);
    assert_eq!(opening.quantity_before, 0);
    assert_eq!(opening.quantity_after, 7);
    assert_eq!(opening.reference.as_deref(), Some("CARGA-001"));
}

#[tokio::test]
async fn product_filter_matches_on_the_normalized_key() {
    let app = TestApp::new().await;
    app.receive(PoolTag::GeneralStock, "Oxímetro", 3).await;
    app.receive(PoolTag::TechnicalInventory, "OXIMETRO", 2).await;
    app.receive(PoolTag::GeneralStock, "Camilla", 1).await;

    // Case and accent differences collapse into the same product.
    let movements = app
        .services
        .ledger
        .query(MovementFilter {
            product: Some((
                "oximetro".to_string(),
                "MINDRAY".to_string(),
                "uMEC-12".to_string(),
            )),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements
        .iter()
        .all(|m| m.product_name.to_lowercase().starts_with("ox")));
}

#[tokio::test]
async fn pool_and_type_filters_combine() {
    let app = TestApp::new().await;
    app.receive(PoolTag::GeneralStock, "Monitor", 3).await;
    app.receive(PoolTag::TechnicalInventory, "Monitor", 2).await;

    let movements = app
        .services
        .ledger
        .query(MovementFilter {
            pool: Some(PoolTag::TechnicalInventory),
            movement_type: Some(MovementType::Entrada),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].pool, PoolTag::TechnicalInventory);
}

#[tokio::test]
async fn movements_come_back_most_recent_first() {
    let app = TestApp::new().await;
    let first = app.receive(PoolTag::GeneralStock, "Andadera", 1).await;
    let second = app.receive(PoolTag::GeneralStock, "Bastón", 1).await;

    let movements = app
        .services
        .ledger
        .query(MovementFilter::default())
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].item_id, second.id);
    assert_eq!(movements[1].item_id, first.id);
}

#[tokio::test]
async fn statistics_aggregate_entradas_and_salidas() {
    let app = TestApp::new().await;
    let record = app.receive(PoolTag::GeneralStock, "Oxímetro", 10).await;
    app.receive(PoolTag::TechnicalInventory, "Monitor", 5).await;

    // One deduction through a confirmed delivery document.
    let doc = app
        .services
        .settlement
        .create_document(medstock_api::services::settlement::CreateDocumentInput {
            client: "Hospital del Norte".to_string(),
            delivery_address: None,
            technician: "J. Torres".to_string(),
            kind: "entrega".to_string(),
            invoice_number: None,
            lines: vec![medstock_api::services::settlement::NewDocumentLine {
                pool: PoolTag::GeneralStock,
                item_id: record.id,
                quantity: 4,
                notes: None,
            }],
        })
        .await
        .unwrap();
    app.services.settlement.confirm(doc.document.id).await.unwrap();

    let stats = app.services.ledger.statistics(30).await.unwrap();
    assert_eq!(stats.total_movements, 3);
    assert_eq!(stats.movements_today, 3);
    assert_eq!(stats.entradas, 2);
    assert_eq!(stats.salidas, 1);
    assert_eq!(stats.entrada_units, 15);
    assert_eq!(stats.salida_units, 4);
    assert_eq!(stats.general_movements, 2);
    assert_eq!(stats.technical_movements, 1);
    assert_eq!(stats.top_references.len(), 2);

    // The oximeter moved twice, the monitor once.
    assert_eq!(stats.top_products[0].movements, 2);
}
