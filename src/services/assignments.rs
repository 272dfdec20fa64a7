use crate::{
    db::DbPool,
    entities::{
        component_assignment::{self, Entity as ComponentAssignment},
        stock_movement::MovementType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::PoolTag,
    services::stock_pools::{self, StockPoolService},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, serde::Deserialize, Validate)]
pub struct AssignComponentInput {
    pub component_id: i64,
    pub equipment_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(length(min = 1, max = 100))]
    pub technician: String,
}

#[derive(Clone, Debug, serde::Deserialize, Validate)]
pub struct ReturnComponentInput {
    pub component_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(length(min = 1, max = 100))]
    pub technician: String,
}

/// Draws technical-pool stock onto a piece of equipment: the single-pool
/// case of settlement. Assignment rows are permanent; there is no undo.
#[derive(Clone)]
pub struct ComponentAssignmentService {
    db: Arc<DbPool>,
    pools: StockPoolService,
    event_sender: EventSender,
}

impl ComponentAssignmentService {
    pub fn new(db: Arc<DbPool>, pools: StockPoolService, event_sender: EventSender) -> Self {
        Self {
            db,
            pools,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(component_id = input.component_id))]
    pub async fn assign(
        &self,
        input: AssignComponentInput,
    ) -> Result<component_assignment::Model, ServiceError> {
        input.validate()?;

        // Fail-closed availability check before anything is written; the
        // optimistic version check inside the transaction catches races.
        let record = self
            .pools
            .get_record(PoolTag::TechnicalInventory, input.component_id)
            .await?;
        if record.quantity_available < input.quantity {
            return Err(ServiceError::InsufficientStock {
                requested: input.quantity,
                available: record.quantity_available,
                shortfall: input.quantity - record.quantity_available,
            });
        }

        let assignment = self
            .db
            .transaction::<_, component_assignment::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    stock_pools::move_stock(
                        txn,
                        PoolTag::TechnicalInventory,
                        input.component_id,
                        MovementType::Salida,
                        input.quantity,
                        &input.reason,
                        Some(&format!("equipment {}", input.equipment_id)),
                        &input.technician,
                    )
                    .await?;

                    component_assignment::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        component_id: Set(input.component_id),
                        equipment_id: Set(input.equipment_id),
                        quantity: Set(input.quantity),
                        reason: Set(input.reason.clone()),
                        technician: Set(input.technician.clone()),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::from)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::StorageFailure(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            assignment_id = %assignment.id,
            component_id = assignment.component_id,
            equipment_id = %assignment.equipment_id,
            quantity = assignment.quantity,
            "component assigned to equipment"
        );
        self.event_sender
            .send(Event::ComponentAssigned {
                assignment_id: assignment.id,
                component_id: assignment.component_id,
                equipment_id: assignment.equipment_id,
                quantity: assignment.quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(assignment)
    }

    /// Puts component stock back. Modeled as a fresh Entrada plus quantity
    /// increment, not an undo of any assignment row.
    #[instrument(skip(self, input), fields(component_id = input.component_id))]
    pub async fn return_to_stock(&self, input: ReturnComponentInput) -> Result<(), ServiceError> {
        input.validate()?;

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    stock_pools::move_stock(
                        txn,
                        PoolTag::TechnicalInventory,
                        input.component_id,
                        MovementType::Entrada,
                        input.quantity,
                        &input.reason,
                        None,
                        &input.technician,
                    )
                    .await?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::StorageFailure(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
    }

    #[instrument(skip(self))]
    pub async fn list_for_equipment(
        &self,
        equipment_id: Uuid,
    ) -> Result<Vec<component_assignment::Model>, ServiceError> {
        ComponentAssignment::find()
            .filter(component_assignment::Column::EquipmentId.eq(equipment_id))
            .order_by_desc(component_assignment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::from)
    }
}
