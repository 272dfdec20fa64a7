use crate::{
    errors::ServiceError,
    models::{ConsolidatedProduct, NewStockRecord, PoolTag, StockRecord},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
    pub brand: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub pool: PoolTag,
    #[serde(flatten)]
    pub record: NewStockRecord,
}

/// Consolidated view of both pools, sorted by display name.
async fn list_stock(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConsolidatedProduct>>, ServiceError> {
    let products = state.services.consolidation.list_all().await?;
    Ok(Json(products))
}

async fn search_stock(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ConsolidatedProduct>, ServiceError> {
    state
        .services
        .consolidation
        .find(&query.name, &query.brand, &query.model)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ServiceError::RecordNotFound(format!(
                "product '{} {} {}'",
                query.name, query.brand, query.model
            ))
        })
}

async fn get_record(
    State(state): State<AppState>,
    Path((pool, item_id)): Path<(PoolTag, i64)>,
) -> Result<Json<StockRecord>, ServiceError> {
    let record = state.services.pools.get_record(pool, item_id).await?;
    Ok(Json(record))
}

async fn receive_stock(
    State(state): State<AppState>,
    Json(request): Json<ReceiveStockRequest>,
) -> Result<(StatusCode, Json<StockRecord>), ServiceError> {
    let record = state
        .services
        .pools
        .receive_stock(request.pool, request.record)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock))
        .route("/search", get(search_stock))
        .route("/receive", post(receive_stock))
        .route("/:pool/:item_id", get(get_record))
}
