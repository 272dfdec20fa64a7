use crate::{
    db::DbPool,
    entities::{
        general_stock,
        stock_movement::{self, MovementType},
        technical_stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{NewStockRecord, PoolTag, StockRecord, StockState},
    services::ledger::{self, NewMovement},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Fetches one record from its pool on the caller's connection.
pub async fn fetch_record<C: ConnectionTrait>(
    conn: &C,
    pool: PoolTag,
    item_id: i64,
) -> Result<Option<StockRecord>, ServiceError> {
    let record = match pool {
        PoolTag::TechnicalInventory => technical_stock::Entity::find_by_id(item_id)
            .one(conn)
            .await?
            .map(StockRecord::from),
        PoolTag::GeneralStock => general_stock::Entity::find_by_id(item_id)
            .one(conn)
            .await?
            .map(StockRecord::from),
    };
    Ok(record)
}

/// Writes a new quantity to a record with an optimistic version check.
/// Zero rows updated means a concurrent writer got there first.
async fn write_quantity<C: ConnectionTrait>(
    conn: &C,
    record: &StockRecord,
    new_quantity: i32,
) -> Result<(), ServiceError> {
    let rows_affected = match record.pool {
        PoolTag::TechnicalInventory => {
            technical_stock::Entity::update_many()
                .col_expr(
                    technical_stock::Column::QuantityAvailable,
                    Expr::value(new_quantity),
                )
                .col_expr(
                    technical_stock::Column::Version,
                    Expr::value(record.version + 1),
                )
                .col_expr(technical_stock::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(technical_stock::Column::Id.eq(record.id))
                .filter(technical_stock::Column::Version.eq(record.version))
                .exec(conn)
                .await?
                .rows_affected
        }
        PoolTag::GeneralStock => {
            general_stock::Entity::update_many()
                .col_expr(
                    general_stock::Column::QuantityAvailable,
                    Expr::value(new_quantity),
                )
                .col_expr(
                    general_stock::Column::Version,
                    Expr::value(record.version + 1),
                )
                .col_expr(general_stock::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(general_stock::Column::Id.eq(record.id))
                .filter(general_stock::Column::Version.eq(record.version))
                .exec(conn)
                .await?
                .rows_affected
        }
    };

    if rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification {
            pool: record.pool,
            item_id: record.id,
        });
    }
    Ok(())
}

/// The per-record critical section: read current quantity, apply the
/// movement's delta, write the new quantity and append the ledger entry.
/// Run on a transaction so the quantity write and the ledger append commit
/// together.
pub async fn move_stock<C: ConnectionTrait>(
    conn: &C,
    pool: PoolTag,
    item_id: i64,
    movement_type: MovementType,
    quantity: i32,
    reason: &str,
    reference: Option<&str>,
    responsible: &str,
) -> Result<stock_movement::Model, ServiceError> {
    let record = fetch_record(conn, pool, item_id)
        .await?
        .ok_or_else(|| ServiceError::RecordNotFound(format!("{} record {}", pool, item_id)))?;

    // Availability is re-checked against the fresh row: a quantity that
    // raced below the caller's earlier check surfaces as InsufficientStock,
    // not an invariant breach.
    if movement_type == MovementType::Salida && record.quantity_available < quantity {
        return Err(ServiceError::InsufficientStock {
            requested: quantity,
            available: record.quantity_available,
            shortfall: quantity - record.quantity_available,
        });
    }

    let new_quantity = record.quantity_available + movement_type.signed_delta(quantity);
    let mut movement = NewMovement::for_record(&record, movement_type, quantity)
        .reason(reason)
        .responsible(responsible);
    if let Some(reference) = reference {
        movement = movement.reference(reference);
    }

    // append_movement rejects a negative result before anything is written.
    let entry = ledger::append_movement(conn, movement).await?;
    write_quantity(conn, &record, new_quantity).await?;
    Ok(entry)
}

/// Read access to the two stock pools plus merchandise intake.
#[derive(Clone)]
pub struct StockPoolService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockPoolService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// All records of one pool. A read failure is surfaced with the pool
    /// name attached; it is never presented as an empty pool.
    #[instrument(skip(self))]
    pub async fn read_pool(&self, pool: PoolTag) -> Result<Vec<StockRecord>, ServiceError> {
        let db = self.db.as_ref();
        let records = match pool {
            PoolTag::TechnicalInventory => technical_stock::Entity::find()
                .order_by_asc(technical_stock::Column::Id)
                .all(db)
                .await
                .map_err(|source| ServiceError::PoolRead { pool, source })?
                .into_iter()
                .map(StockRecord::from)
                .collect(),
            PoolTag::GeneralStock => general_stock::Entity::find()
                .order_by_asc(general_stock::Column::Id)
                .all(db)
                .await
                .map_err(|source| ServiceError::PoolRead { pool, source })?
                .into_iter()
                .map(StockRecord::from)
                .collect(),
        };
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn get_record(
        &self,
        pool: PoolTag,
        item_id: i64,
    ) -> Result<StockRecord, ServiceError> {
        fetch_record(self.db.as_ref(), pool, item_id)
            .await?
            .ok_or_else(|| ServiceError::RecordNotFound(format!("{} record {}", pool, item_id)))
    }

    /// Merchandise intake: inserts a new record into the pool and appends
    /// the opening Entrada in the same transaction.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn receive_stock(
        &self,
        pool: PoolTag,
        input: NewStockRecord,
    ) -> Result<StockRecord, ServiceError> {
        input.validate()?;

        let record = self
            .db
            .transaction::<_, StockRecord, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let record: StockRecord = match pool {
                        PoolTag::TechnicalInventory => technical_stock::ActiveModel {
                            name: Set(input.name.clone()),
                            brand: Set(input.brand.clone()),
                            model: Set(input.model.clone()),
                            serial_number: Set(input.serial_number.clone()),
                            quantity_available: Set(input.quantity),
                            quantity_received: Set(input.quantity),
                            state: Set(StockState::Available),
                            location: Set(input.location.clone()),
                            notes: Set(input.notes.clone()),
                            origin_reference: Set(input.origin_reference.clone()),
                            version: Set(0),
                            created_at: Set(now),
                            updated_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?
                        .into(),
                        PoolTag::GeneralStock => general_stock::ActiveModel {
                            name: Set(input.name.clone()),
                            brand: Set(input.brand.clone()),
                            model: Set(input.model.clone()),
                            serial_number: Set(input.serial_number.clone()),
                            quantity_available: Set(input.quantity),
                            quantity_received: Set(input.quantity),
                            state: Set(StockState::Available),
                            location: Set(input.location.clone()),
                            notes: Set(input.notes.clone()),
                            origin_reference: Set(input.origin_reference.clone()),
                            version: Set(0),
                            created_at: Set(now),
                            updated_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?
                        .into(),
                    };

                    // The opening Entrada records the received quantity
                    // against a zero baseline.
                    let opening = StockRecord {
                        quantity_available: 0,
                        ..record.clone()
                    };
                    let mut movement =
                        NewMovement::for_record(&opening, MovementType::Entrada, input.quantity)
                            .reason("merchandise received")
                            .responsible(&input.responsible);
                    if let Some(origin) = &input.origin_reference {
                        movement = movement.reference(origin);
                    }
                    ledger::append_movement(txn, movement).await?;

                    Ok(record)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::StorageFailure(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            pool = %record.pool,
            item_id = record.id,
            quantity = record.quantity_available,
            "stock received"
        );
        self.event_sender
            .send(Event::StockReceived {
                pool: record.pool,
                item_id: record.id,
                quantity: record.quantity_available,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(record)
    }
}
