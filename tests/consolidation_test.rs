mod common;

use common::TestApp;
use medstock_api::models::PoolTag;

#[tokio::test]
async fn accent_and_case_variants_consolidate_into_one_product() {
    let app = TestApp::new().await;
    app.receive(PoolTag::GeneralStock, "Oxímetro de pulso", 3).await;
    app.receive(PoolTag::TechnicalInventory, "OXIMETRO   DE PULSO", 2)
        .await;

    let products = app.services.consolidation.list_all().await.unwrap();
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.total_quantity, 5);
    assert_eq!(product.general.as_ref().unwrap().quantity_available, 3);
    assert_eq!(product.technical.as_ref().unwrap().quantity_available, 2);
}

#[tokio::test]
async fn find_normalizes_the_lookup_identity() {
    let app = TestApp::new().await;
    app.receive(PoolTag::GeneralStock, "Nebulizador", 4).await;

    let found = app
        .services
        .consolidation
        .find("NEBULIZADOR", "mindray", "UMEC-12")
        .await
        .unwrap();
    assert!(found.is_some());
    assert_eq!(found.unwrap().total_quantity, 4);

    let missing = app
        .services
        .consolidation
        .find("Nebulizador", "otra marca", "UMEC-12")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn listing_sorts_by_display_name() {
    let app = TestApp::new().await;
    app.receive(PoolTag::GeneralStock, "Tensiómetro", 1).await;
    app.receive(PoolTag::GeneralStock, "Aspirador", 1).await;
    app.receive(PoolTag::TechnicalInventory, "monitor fetal", 1).await;

    let products = app.services.consolidation.list_all().await.unwrap();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Aspirador", "monitor fetal", "Tensiómetro"]);
}
