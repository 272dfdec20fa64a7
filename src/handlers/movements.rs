use crate::{
    entities::stock_movement::{self, MovementType},
    errors::ServiceError,
    models::PoolTag,
    services::ledger::{MovementFilter, MovementStatistics},
    AppState,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub reference: Option<String>,
    pub pool: Option<PoolTag>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    #[serde(default = "default_period")]
    pub days: i64,
}

fn default_period() -> i64 {
    30
}

async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> Result<Json<Vec<stock_movement::Model>>, ServiceError> {
    // Product identity needs the full triple; partial triples are rejected
    // rather than silently ignored.
    let product = match (&query.name, &query.brand, &query.model) {
        (Some(name), Some(brand), Some(model)) => {
            Some((name.clone(), brand.clone(), model.clone()))
        }
        (None, None, None) => None,
        _ => {
            return Err(ServiceError::InvalidInput(
                "product filter requires name, brand and model together".to_string(),
            ))
        }
    };

    let movements = state
        .services
        .ledger
        .query(MovementFilter {
            product,
            reference: query.reference,
            pool: query.pool,
            movement_type: query.movement_type,
            from: query.from,
            to: query.to,
        })
        .await?;
    Ok(Json(movements))
}

async fn statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<MovementStatistics>, ServiceError> {
    if query.days < 0 {
        return Err(ServiceError::InvalidInput(
            "days must not be negative".to_string(),
        ));
    }
    let stats = state.services.ledger.statistics(query.days).await?;
    Ok(Json(stats))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movements))
        .route("/statistics", get(statistics))
}
