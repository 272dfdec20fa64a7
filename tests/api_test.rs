mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use common::TestApp;
use medstock_api::{
    models::PoolTag,
    services::settlement::{CreateDocumentInput, NewDocumentLine},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = TestApp::new().await;

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn receiving_stock_over_http_creates_the_record() {
    let app = TestApp::new().await;

    let payload = json!({
        "pool": "general_stock",
        "name": "Tensiómetro",
        "brand": "Riester",
        "model": "ri-champion",
        "quantity": 3,
        "responsible": "bodega"
    });
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/stock/receive")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["quantity_available"], 3);
    assert_eq!(body["pool"], "general_stock");

    let products = app.services.consolidation.list_all().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].total_quantity, 3);
}

#[tokio::test]
async fn insufficient_confirmation_maps_to_conflict_with_shortfall() {
    let app = TestApp::new().await;
    let record = app.receive(PoolTag::GeneralStock, "Oxímetro", 2).await;

    let doc = app
        .services
        .settlement
        .create_document(CreateDocumentInput {
            client: "Clínica Santa Fe".to_string(),
            delivery_address: None,
            technician: "J. Torres".to_string(),
            kind: "entrega".to_string(),
            invoice_number: None,
            lines: vec![NewDocumentLine {
                pool: PoolTag::GeneralStock,
                item_id: record.id,
                quantity: 5,
                notes: None,
            }],
        })
        .await
        .unwrap();

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/documents/{}/confirm", doc.document.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Conflict");
    assert_eq!(body["details"]["requested"], 5);
    assert_eq!(body["details"]["available"], 2);
    assert_eq!(body["details"]["shortfall"], 3);

    // Fail-closed: the rejected request changed nothing.
    assert_eq!(app.quantity(PoolTag::GeneralStock, record.id).await, 2);
}

#[tokio::test]
async fn unknown_document_maps_to_not_found() {
    let app = TestApp::new().await;

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/documents/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn invalid_transition_maps_to_conflict() {
    let app = TestApp::new().await;
    let record = app.receive(PoolTag::GeneralStock, "Camilla", 2).await;

    let doc = app
        .services
        .settlement
        .create_document(CreateDocumentInput {
            client: "Hospital del Norte".to_string(),
            delivery_address: None,
            technician: "J. Torres".to_string(),
            kind: "entrega".to_string(),
            invoice_number: None,
            lines: vec![NewDocumentLine {
                pool: PoolTag::GeneralStock,
                item_id: record.id,
                quantity: 1,
                notes: None,
            }],
        })
        .await
        .unwrap();

    // InTransit straight from Draft is not a legal move.
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/documents/{}/status", doc.document.id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "status": "InTransit" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn malformed_receive_request_maps_to_bad_request() {
    let app = TestApp::new().await;

    let payload = json!({
        "pool": "general_stock",
        "name": "",
        "brand": "Riester",
        "model": "ri-champion",
        "quantity": 0,
        "responsible": "bodega"
    });
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/stock/receive")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad Request");
}
