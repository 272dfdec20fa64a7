use crate::models::PoolTag;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict").
    pub error: String,
    /// Human-readable, actionable description.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp when the error occurred.
    pub timestamp: String,
}

/// Error taxonomy for the stock ledger and settlement core.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed request, rejected before touching storage.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("not found: {0}")]
    RecordNotFound(String),

    /// Requested quantity exceeds availability. Recoverable by the caller;
    /// never partially honored.
    #[error("insufficient stock: need {requested}, have {available} (short {shortfall})")]
    InsufficientStock {
        requested: i32,
        available: i32,
        shortfall: i32,
    },

    /// Operation not valid in the target's current lifecycle state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Optimistic version check lost against a concurrent writer.
    #[error("concurrent modification of {pool} record {item_id}, retry the operation")]
    ConcurrentModification { pool: PoolTag, item_id: i64 },

    /// Internal consistency breach (e.g. a write that would drive a
    /// quantity negative). Always a bug or corrupt data, never expected.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] DbErr),

    /// A pool read failed. Distinct from an empty pool: callers must never
    /// see a failed read as "no records".
    #[error("failed to read {pool} pool: {source}")]
    PoolRead {
        pool: PoolTag,
        #[source]
        source: DbErr,
    },

    /// A multi-line settlement or restoration stopped partway. Lists
    /// exactly what was applied before the failure so the caller can retry
    /// without double-applying.
    #[error("settlement incomplete on document {document_id}: completed {completed:?}, failed at {failed}: {message}")]
    SettlementIncomplete {
        document_id: Uuid,
        completed: Vec<String>,
        failed: String,
        message: String,
    },

    #[error("event error: {0}")]
    EventError(String),
}

impl ServiceError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::InvalidInput(_) | ServiceError::ValidationError(_) => {
                (StatusCode::BAD_REQUEST, "Bad Request")
            }
            ServiceError::RecordNotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ServiceError::InsufficientStock { .. }
            | ServiceError::InvalidOperation(_)
            | ServiceError::ConcurrentModification { .. } => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::InvariantViolation(_)
            | ServiceError::StorageFailure(_)
            | ServiceError::PoolRead { .. }
            | ServiceError::SettlementIncomplete { .. }
            | ServiceError::EventError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::InsufficientStock {
                requested,
                available,
                shortfall,
            } => Some(serde_json::json!({
                "requested": requested,
                "available": available,
                "shortfall": shortfall,
            })),
            ServiceError::SettlementIncomplete {
                completed, failed, ..
            } => Some(serde_json::json!({
                "completed": completed,
                "failed": failed,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: label.to_string(),
            message: self.to_string(),
            details: self.details(),
            timestamp: Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_is_actionable() {
        let err = ServiceError::InsufficientStock {
            requested: 5,
            available: 3,
            shortfall: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock: need 5, have 3 (short 2)"
        );
    }

    #[test]
    fn status_mapping() {
        let (status, _) = ServiceError::RecordNotFound("x".into()).status_and_label();
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = ServiceError::InsufficientStock {
            requested: 1,
            available: 0,
            shortfall: 1,
        }
        .status_and_label();
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) =
            ServiceError::InvariantViolation("negative quantity".into()).status_and_label();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
