use crate::models::PoolTag;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of ledger entry. The sign of the effect on the target record's
/// quantity is fixed per kind, except Ajuste which carries a signed
/// quantity.
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
pub enum MovementType {
    /// Merchandise in (receipt or restoration).
    #[sea_orm(string_value = "Entrada")]
    Entrada,
    /// Merchandise out (delivery or component assignment).
    #[sea_orm(string_value = "Salida")]
    Salida,
    /// Manual correction; quantity may be negative.
    #[sea_orm(string_value = "Ajuste")]
    Ajuste,
    /// Client return back into stock.
    #[sea_orm(string_value = "Devolucion")]
    Devolucion,
}

impl MovementType {
    /// Signed effect of a movement of this kind on the target quantity.
    pub fn signed_delta(self, quantity: i32) -> i32 {
        match self {
            MovementType::Entrada | MovementType::Devolucion => quantity,
            MovementType::Salida => -quantity,
            MovementType::Ajuste => quantity,
        }
    }
}

/// Append-only movement ledger. Rows are never updated or deleted;
/// corrections are new Ajuste entries. The product fields are a snapshot
/// taken at write time so history survives later renames.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub item_id: i64,
    pub pool: PoolTag,
    pub product_name: String,
    pub product_brand: String,
    pub product_model: String,
    pub product_serial: Option<String>,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub reason: String,
    /// Document number, invoice number, equipment or client reference.
    pub reference: Option<String>,
    pub responsible: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_delta_per_kind() {
        assert_eq!(MovementType::Entrada.signed_delta(4), 4);
        assert_eq!(MovementType::Devolucion.signed_delta(4), 4);
        assert_eq!(MovementType::Salida.signed_delta(4), -4);
        assert_eq!(MovementType::Ajuste.signed_delta(-3), -3);
    }
}
