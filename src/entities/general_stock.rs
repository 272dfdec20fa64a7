use crate::models::StockState;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The general-stock pool: the warehouse table merchandise is received
/// into. Same row shape as `technical_stock`; the two tables are kept
/// separate and consolidated at read time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "general_stock")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub quantity_available: i32,
    pub quantity_received: i32,
    pub state: StockState,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub origin_reference: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
