use crate::models::PoolTag;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a delivery document: a reference to a specific stock record
/// (and its pool), the requested quantity, and a snapshot of what was
/// available when the line was created.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub document_id: Uuid,
    pub pool: PoolTag,
    pub item_id: i64,
    pub product_name: String,
    pub product_brand: String,
    pub product_model: String,
    pub requested_quantity: i32,
    pub available_at_creation: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_document::Entity",
        from = "Column::DocumentId",
        to = "super::delivery_document::Column::Id"
    )]
    DeliveryDocument,
}

impl Related<super::delivery_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryDocument.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
