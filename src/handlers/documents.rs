use crate::{
    entities::delivery_document::DocumentStatus,
    errors::ServiceError,
    services::settlement::{ConfirmResult, CreateDocumentInput, DeletionResult, DocumentWithLines},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: DocumentStatus,
}

#[derive(Debug, Deserialize)]
pub struct DeleteDocumentRequest {
    pub reason: String,
}

async fn create_document(
    State(state): State<AppState>,
    Json(input): Json<CreateDocumentInput>,
) -> Result<(StatusCode, Json<DocumentWithLines>), ServiceError> {
    let created = state.services.settlement.create_document(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentWithLines>, ServiceError> {
    let document = state.services.settlement.get_document(id).await?;
    Ok(Json(document))
}

async fn confirm_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmResult>, ServiceError> {
    let result = state.services.settlement.confirm(id).await?;
    Ok(Json(result))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<crate::entities::delivery_document::Model>, ServiceError> {
    let updated = state
        .services
        .settlement
        .transition(id, request.status)
        .await?;
    Ok(Json(updated))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeleteDocumentRequest>,
) -> Result<Json<DeletionResult>, ServiceError> {
    let result = state
        .services
        .settlement
        .delete_with_restoration(id, &request.reason)
        .await?;
    Ok(Json(result))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_document))
        .route("/:id", get(get_document).delete(delete_document))
        .route("/:id/confirm", post(confirm_document))
        .route("/:id/status", post(change_status))
}
