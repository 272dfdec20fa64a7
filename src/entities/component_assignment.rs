use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of technical-pool stock drawn onto a piece of equipment.
/// Permanent: never updated, never deleted. Putting a component back is a
/// fresh Entrada movement, not an undo of this row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "component_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Technical-inventory record the component came from.
    pub component_id: i64,
    pub equipment_id: Uuid,
    pub quantity: i32,
    pub reason: String,
    pub technician: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
