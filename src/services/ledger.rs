use crate::{
    db::DbPool,
    entities::stock_movement::{self, Entity as StockMovement, MovementType},
    errors::ServiceError,
    models::{PoolTag, ProductKey, StockRecord},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// Input for one ledger append. The product snapshot is denormalized from
/// the target record at write time.
#[derive(Clone, Debug)]
pub struct NewMovement {
    pub item_id: i64,
    pub pool: PoolTag,
    pub product_name: String,
    pub product_brand: String,
    pub product_model: String,
    pub product_serial: Option<String>,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub quantity_before: i32,
    pub reason: String,
    pub reference: Option<String>,
    pub responsible: String,
}

impl NewMovement {
    pub fn for_record(record: &StockRecord, movement_type: MovementType, quantity: i32) -> Self {
        NewMovement {
            item_id: record.id,
            pool: record.pool,
            product_name: record.name.clone(),
            product_brand: record.brand.clone(),
            product_model: record.model.clone(),
            product_serial: record.serial_number.clone(),
            movement_type,
            quantity,
            quantity_before: record.quantity_available,
            reason: String::new(),
            reference: None,
            responsible: String::new(),
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn responsible(mut self, responsible: impl Into<String>) -> Self {
        self.responsible = responsible.into();
        self
    }
}

/// Appends one movement on the caller's connection. Run this on the same
/// transaction as the quantity write so both commit or roll back together.
///
/// Computes `quantity_after` from the kind's signed delta and rejects a
/// negative result as an invariant violation; availability checks belong in
/// the callers, so hitting this means a bug or corrupt data.
pub async fn append_movement<C: ConnectionTrait>(
    conn: &C,
    new: NewMovement,
) -> Result<stock_movement::Model, ServiceError> {
    if new.movement_type != MovementType::Ajuste && new.quantity <= 0 {
        return Err(ServiceError::InvalidInput(format!(
            "movement quantity must be positive, got {}",
            new.quantity
        )));
    }

    let quantity_after = new.quantity_before + new.movement_type.signed_delta(new.quantity);
    if quantity_after < 0 {
        error!(
            pool = %new.pool,
            item_id = new.item_id,
            quantity_before = new.quantity_before,
            quantity = new.quantity,
            movement_type = %new.movement_type,
            "movement would drive quantity negative"
        );
        return Err(ServiceError::InvariantViolation(format!(
            "{} of {} on {} record {} would leave quantity at {}",
            new.movement_type, new.quantity, new.pool, new.item_id, quantity_after
        )));
    }

    let movement = stock_movement::ActiveModel {
        item_id: Set(new.item_id),
        pool: Set(new.pool),
        product_name: Set(new.product_name),
        product_brand: Set(new.product_brand),
        product_model: Set(new.product_model),
        product_serial: Set(new.product_serial),
        movement_type: Set(new.movement_type),
        quantity: Set(new.quantity),
        quantity_before: Set(new.quantity_before),
        quantity_after: Set(quantity_after),
        reason: Set(new.reason),
        reference: Set(new.reference),
        responsible: Set(new.responsible),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    movement.insert(conn).await.map_err(ServiceError::from)
}

/// Filter for ledger queries. All fields are optional and combined with
/// AND; product identity matches by normalized key.
#[derive(Clone, Debug, Default)]
pub struct MovementFilter {
    pub product: Option<(String, String, String)>,
    pub reference: Option<String>,
    pub pool: Option<PoolTag>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Read-side statistics over the ledger for a trailing period.
#[derive(Clone, Debug, serde::Serialize)]
pub struct MovementStatistics {
    pub total_movements: u64,
    pub movements_in_period: u64,
    pub movements_today: u64,
    pub entradas: u64,
    pub salidas: u64,
    pub entrada_units: i64,
    pub salida_units: i64,
    pub technical_movements: u64,
    pub general_movements: u64,
    pub top_products: Vec<ProductActivity>,
    pub top_references: Vec<ReferenceActivity>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ProductActivity {
    pub name: String,
    pub brand: String,
    pub model: String,
    pub movements: u64,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ReferenceActivity {
    pub reference: String,
    pub movements: u64,
}

const TOP_N: usize = 5;

/// Query and aggregation surface over the append-only movement ledger.
#[derive(Clone)]
pub struct MovementLedgerService {
    db: Arc<DbPool>,
}

impl MovementLedgerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Movement history, most recent first.
    #[instrument(skip(self))]
    pub async fn query(
        &self,
        filter: MovementFilter,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let mut select = StockMovement::find();

        if let Some(pool) = filter.pool {
            select = select.filter(stock_movement::Column::Pool.eq(pool));
        }
        if let Some(movement_type) = filter.movement_type {
            select = select.filter(stock_movement::Column::MovementType.eq(movement_type));
        }
        if let Some(reference) = &filter.reference {
            select = select.filter(stock_movement::Column::Reference.contains(reference));
        }
        if let Some(from) = filter.from {
            select = select.filter(stock_movement::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            select = select.filter(stock_movement::Column::CreatedAt.lte(to));
        }

        let mut rows = select
            .order_by_desc(stock_movement::Column::CreatedAt)
            .order_by_desc(stock_movement::Column::Id)
            .all(self.db.as_ref())
            .await?;

        // Product identity matches on the normalized key, which is derived,
        // never stored; filter after the fetch.
        if let Some((name, brand, model)) = &filter.product {
            let key = ProductKey::new(name, brand, model);
            rows.retain(|m| {
                ProductKey::new(&m.product_name, &m.product_brand, &m.product_model) == key
            });
        }

        Ok(rows)
    }

    /// Aggregates ledger activity over the trailing `period_days`. Pure
    /// read-side computation; malformed rows are skipped with a warning
    /// rather than failing the whole aggregate.
    #[instrument(skip(self))]
    pub async fn statistics(&self, period_days: i64) -> Result<MovementStatistics, ServiceError> {
        let now = Utc::now();
        let period_start = now - Duration::days(period_days.max(0));
        let today_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(now);

        let rows = StockMovement::find()
            .order_by_desc(stock_movement::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let mut stats = MovementStatistics {
            total_movements: 0,
            movements_in_period: 0,
            movements_today: 0,
            entradas: 0,
            salidas: 0,
            entrada_units: 0,
            salida_units: 0,
            technical_movements: 0,
            general_movements: 0,
            top_products: Vec::new(),
            top_references: Vec::new(),
        };
        let mut by_product: HashMap<ProductKey, (String, String, String, u64)> = HashMap::new();
        let mut by_reference: HashMap<String, u64> = HashMap::new();

        for row in rows {
            let expected = row.quantity_before + row.movement_type.signed_delta(row.quantity);
            if row.quantity_after != expected {
                warn!(
                    movement_id = row.id,
                    quantity_before = row.quantity_before,
                    quantity_after = row.quantity_after,
                    "skipping inconsistent ledger row in statistics"
                );
                continue;
            }

            stats.total_movements += 1;
            if row.created_at >= period_start {
                stats.movements_in_period += 1;
            }
            if row.created_at >= today_start {
                stats.movements_today += 1;
            }
            match row.movement_type {
                MovementType::Entrada | MovementType::Devolucion => {
                    stats.entradas += 1;
                    stats.entrada_units += i64::from(row.quantity);
                }
                MovementType::Salida => {
                    stats.salidas += 1;
                    stats.salida_units += i64::from(row.quantity);
                }
                MovementType::Ajuste => {}
            }
            match row.pool {
                PoolTag::TechnicalInventory => stats.technical_movements += 1,
                PoolTag::GeneralStock => stats.general_movements += 1,
            }

            let key = ProductKey::new(&row.product_name, &row.product_brand, &row.product_model);
            by_product
                .entry(key)
                .or_insert_with(|| {
                    (
                        row.product_name.clone(),
                        row.product_brand.clone(),
                        row.product_model.clone(),
                        0,
                    )
                })
                .3 += 1;
            if let Some(reference) = &row.reference {
                *by_reference.entry(reference.clone()).or_insert(0) += 1;
            }
        }

        let mut products: Vec<ProductActivity> = by_product
            .into_values()
            .map(|(name, brand, model, movements)| ProductActivity {
                name,
                brand,
                model,
                movements,
            })
            .collect();
        products.sort_by(|a, b| b.movements.cmp(&a.movements).then(a.name.cmp(&b.name)));
        products.truncate(TOP_N);
        stats.top_products = products;

        let mut references: Vec<ReferenceActivity> = by_reference
            .into_iter()
            .map(|(reference, movements)| ReferenceActivity {
                reference,
                movements,
            })
            .collect();
        references.sort_by(|a, b| {
            b.movements
                .cmp(&a.movements)
                .then(a.reference.cmp(&b.reference))
        });
        references.truncate(TOP_N);
        stats.top_references = references;

        Ok(stats)
    }
}
