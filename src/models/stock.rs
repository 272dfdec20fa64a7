use crate::models::product_key::ProductKey;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The two physical stock pools. `TechnicalInventory` is the legacy
/// components table used by the service workshop; `GeneralStock` is the
/// newer warehouse table. They are kept as distinct tables behind one
/// consolidation interface so the draw-order policy stays explicit.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PoolTag {
    #[sea_orm(string_value = "technical_inventory")]
    #[strum(serialize = "technical_inventory")]
    TechnicalInventory,
    #[sea_orm(string_value = "general_stock")]
    #[strum(serialize = "general_stock")]
    GeneralStock,
}

/// Lifecycle state of a physical stock record.
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
pub enum StockState {
    #[sea_orm(string_value = "Available")]
    Available,
    #[sea_orm(string_value = "Assigned")]
    Assigned,
    #[sea_orm(string_value = "InRepair")]
    InRepair,
}

/// Uniform view over a row from either pool table. Pool readers map the
/// per-table entity models into this shape so everything above the reader
/// is pool-agnostic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub pool: PoolTag,
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

impl StockRecord {
    pub fn product_key(&self) -> ProductKey {
        ProductKey::new(&self.name, &self.brand, &self.model)
    }
}

impl From<crate::entities::technical_stock::Model> for StockRecord {
    fn from(m: crate::entities::technical_stock::Model) -> Self {
        StockRecord {
            pool: PoolTag::TechnicalInventory,
            id: m.id,
            name: m.name,
            brand: m.brand,
            model: m.model,
            serial_number: m.serial_number,
            quantity_available: m.quantity_available,
            quantity_received: m.quantity_received,
            state: m.state,
            location: m.location,
            notes: m.notes,
            origin_reference: m.origin_reference,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<crate::entities::general_stock::Model> for StockRecord {
    fn from(m: crate::entities::general_stock::Model) -> Self {
        StockRecord {
            pool: PoolTag::GeneralStock,
            id: m.id,
            name: m.name,
            brand: m.brand,
            model: m.model,
            serial_number: m.serial_number,
            quantity_available: m.quantity_available,
            quantity_received: m.quantity_received,
            state: m.state,
            location: m.location,
            notes: m.notes,
            origin_reference: m.origin_reference,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Input for merchandise intake into a pool.
#[derive(Clone, Debug, Deserialize, validator::Validate)]
pub struct NewStockRecord {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    pub serial_number: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub location: Option<String>,
    pub notes: Option<String>,
    /// Load/shipment code the merchandise arrived under.
    pub origin_reference: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub responsible: String,
}

/// In-memory aggregate of one logical product across both pools.
/// Recomputed on demand, never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct ConsolidatedProduct {
    pub key: ProductKey,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub total_quantity: i32,
    pub technical: Option<StockRecord>,
    pub general: Option<StockRecord>,
}

impl ConsolidatedProduct {
    pub fn contributors(&self) -> impl Iterator<Item = &StockRecord> {
        self.general.iter().chain(self.technical.iter())
    }
}

/// One pool-level decrement inside an exit plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExitStep {
    pub pool: PoolTag,
    pub item_id: i64,
    pub quantity: i32,
}

/// Precomputed, pool-by-pool breakdown of how a requested quantity will be
/// deducted. Steps always sum exactly to `requested`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExitPlan {
    pub requested: i32,
    pub steps: Vec<ExitStep>,
}
