use crate::{
    entities::component_assignment,
    errors::ServiceError,
    services::assignments::{AssignComponentInput, ReturnComponentInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

async fn assign_component(
    State(state): State<AppState>,
    Json(input): Json<AssignComponentInput>,
) -> Result<(StatusCode, Json<component_assignment::Model>), ServiceError> {
    let assignment = state.services.assignments.assign(input).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn return_component(
    State(state): State<AppState>,
    Json(input): Json<ReturnComponentInput>,
) -> Result<Json<Value>, ServiceError> {
    state.services.assignments.return_to_stock(input).await?;
    Ok(Json(json!({ "returned": true })))
}

async fn list_for_equipment(
    State(state): State<AppState>,
    Path(equipment_id): Path<Uuid>,
) -> Result<Json<Vec<component_assignment::Model>>, ServiceError> {
    let assignments = state
        .services
        .assignments
        .list_for_equipment(equipment_id)
        .await?;
    Ok(Json(assignments))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(assign_component))
        .route("/return", post(return_component))
        .route("/equipment/:equipment_id", get(list_for_equipment))
}
