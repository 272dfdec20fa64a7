use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a delivery document (remisión).
///
/// `Draft → Confirmed → InTransit → Delivered`, with `Cancelled` reachable
/// from any non-terminal state. Transitions are one-directional; the only
/// way back is delete-with-restoration, which removes the document
/// entirely after putting the stock back.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Confirmed")]
    Confirmed,
    #[sea_orm(string_value = "InTransit")]
    InTransit,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl DocumentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Delivered | DocumentStatus::Cancelled)
    }

    /// Whether the document has passed confirmation (stock was deducted).
    pub fn is_confirmed_or_later(self) -> bool {
        matches!(
            self,
            DocumentStatus::Confirmed | DocumentStatus::InTransit | DocumentStatus::Delivered
        )
    }

    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        match (self, next) {
            (Draft, Confirmed) => true,
            (Confirmed, InTransit) => true,
            (InTransit, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Delivery document header. Owns an ordered set of `delivery_lines`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable number, globally unique and monotonically increasing.
    #[sea_orm(unique)]
    pub number: String,
    pub document_date: DateTime<Utc>,
    pub client: String,
    pub delivery_address: Option<String>,
    pub technician: String,
    pub kind: String,
    pub status: DocumentStatus,
    pub invoice_number: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delivery_line::Entity")]
    DeliveryLine,
}

impl Related<super::delivery_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
