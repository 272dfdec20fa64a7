mod common;

use assert_matches::assert_matches;
use common::TestApp;
use medstock_api::{
    entities::stock_movement::MovementType,
    errors::ServiceError,
    models::PoolTag,
    services::{
        assignments::{AssignComponentInput, ReturnComponentInput},
        ledger::MovementFilter,
        stock_pools,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn assigning_a_component_deducts_technical_stock() {
    let app = TestApp::new().await;
    let component = app
        .receive(PoolTag::TechnicalInventory, "Módulo SpO2", 4)
        .await;
    let equipment_id = Uuid::new_v4();

    let assignment = app
        .services
        .assignments
        .assign(AssignComponentInput {
            component_id: component.id,
            equipment_id,
            quantity: 3,
            reason: "repair of patient monitor".to_string(),
            technician: "M. Rivas".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(assignment.quantity, 3);
    assert_eq!(assignment.equipment_id, equipment_id);

    assert_eq!(
        app.quantity(PoolTag::TechnicalInventory, component.id).await,
        1
    );

    let movements = app
        .services
        .ledger
        .query(MovementFilter {
            reference: Some(format!("equipment {}", equipment_id)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Salida);
    assert_eq!(movements[0].quantity, 3);
    assert_eq!(movements[0].quantity_after, 1);

    let listed = app
        .services
        .assignments
        .list_for_equipment(equipment_id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, assignment.id);
}

#[tokio::test]
async fn insufficient_component_stock_leaves_everything_untouched() {
    let app = TestApp::new().await;
    let component = app
        .receive(PoolTag::TechnicalInventory, "Batería", 2)
        .await;
    let equipment_id = Uuid::new_v4();

    let err = app
        .services
        .assignments
        .assign(AssignComponentInput {
            component_id: component.id,
            equipment_id,
            quantity: 5,
            reason: "battery swap".to_string(),
            technician: "M. Rivas".to_string(),
        })
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            requested: 5,
            available: 2,
            shortfall: 3
        }
    );

    assert_eq!(
        app.quantity(PoolTag::TechnicalInventory, component.id).await,
        2
    );
    let listed = app
        .services
        .assignments
        .list_for_equipment(equipment_id)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn returning_a_component_restores_quantity() {
    let app = TestApp::new().await;
    let component = app
        .receive(PoolTag::TechnicalInventory, "Sensor de flujo", 4)
        .await;

    app.services
        .assignments
        .assign(AssignComponentInput {
            component_id: component.id,
            equipment_id: Uuid::new_v4(),
            quantity: 2,
            reason: "ventilator repair".to_string(),
            technician: "M. Rivas".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        app.quantity(PoolTag::TechnicalInventory, component.id).await,
        2
    );

    app.services
        .assignments
        .return_to_stock(ReturnComponentInput {
            component_id: component.id,
            quantity: 2,
            reason: "component not needed after all".to_string(),
            technician: "M. Rivas".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        app.quantity(PoolTag::TechnicalInventory, component.id).await,
        4
    );

    let entradas = app
        .services
        .ledger
        .query(MovementFilter {
            pool: Some(PoolTag::TechnicalInventory),
            movement_type: Some(MovementType::Entrada),
            ..Default::default()
        })
        .await
        .unwrap();
    // The opening Entrada from receiving plus the return.
    assert_eq!(entradas.len(), 2);
    assert_eq!(entradas[0].quantity, 2);
    assert_eq!(entradas[0].reason, "component not needed after all");
}

#[tokio::test]
async fn deduction_exceeding_current_quantity_is_insufficient_stock() {
    let app = TestApp::new().await;
    let component = app
        .receive(PoolTag::TechnicalInventory, "Fusible", 2)
        .await;

    // The quantity may drop between a caller's availability check and the
    // write; the deduction itself must still answer with the recoverable
    // error, not an invariant breach.
    let err = stock_pools::move_stock(
        app.db.as_ref(),
        PoolTag::TechnicalInventory,
        component.id,
        MovementType::Salida,
        3,
        "ventilator repair",
        None,
        "M. Rivas",
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            requested: 3,
            available: 2,
            shortfall: 1
        }
    );
    assert_eq!(
        app.quantity(PoolTag::TechnicalInventory, component.id).await,
        2
    );
}

#[tokio::test]
async fn assignment_rejects_non_positive_quantities() {
    let app = TestApp::new().await;
    let component = app
        .receive(PoolTag::TechnicalInventory, "Cable ECG", 3)
        .await;

    let err = app
        .services
        .assignments
        .assign(AssignComponentInput {
            component_id: component.id,
            equipment_id: Uuid::new_v4(),
            quantity: 0,
            reason: "noop".to_string(),
            technician: "M. Rivas".to_string(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
