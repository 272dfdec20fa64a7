use crate::AppState;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub mod assignments;
pub mod documents;
pub mod movements;
pub mod stock;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Assembles the full API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/stock", stock::router())
        .nest("/api/v1/documents", documents::router())
        .nest("/api/v1/assignments", assignments::router())
        .nest("/api/v1/movements", movements::router())
}
