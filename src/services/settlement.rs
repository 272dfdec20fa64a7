use crate::{
    db::DbPool,
    entities::{
        delivery_document::{self, DocumentStatus, Entity as DeliveryDocument},
        delivery_line::{self, Entity as DeliveryLine},
        stock_movement::{self, Entity as StockMovement, MovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{ExitStep, PoolTag, ProductKey},
    services::{
        consolidation::consolidate,
        exit_planner,
        numbering::DocumentNumberService,
        stock_pools::{self, StockPoolService},
    },
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Prefix for delivery-document numbers (remisiones).
pub const DOCUMENT_NUMBER_PREFIX: &str = "REM";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, Validate)]
pub struct NewDocumentLine {
    pub pool: PoolTag,
    pub item_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, serde::Deserialize, Validate)]
pub struct CreateDocumentInput {
    #[validate(length(min = 1, max = 200))]
    pub client: String,
    pub delivery_address: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub technician: String,
    #[validate(length(min = 1, max = 50))]
    pub kind: String,
    pub invoice_number: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<NewDocumentLine>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct DocumentWithLines {
    pub document: delivery_document::Model,
    pub lines: Vec<delivery_line::Model>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct LineSettlement {
    pub line_id: i64,
    pub steps: Vec<ExitStep>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ConfirmResult {
    pub document_id: Uuid,
    pub number: String,
    /// True when the document was already confirmed and nothing was done.
    pub already_confirmed: bool,
    pub lines: Vec<LineSettlement>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct RestorationStep {
    pub pool: PoolTag,
    pub item_id: i64,
    pub quantity: i32,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct DeletionResult {
    pub document_id: Uuid,
    pub number: String,
    pub restored: Vec<RestorationStep>,
}

/// Drives the delivery-document lifecycle and its effect on stock.
#[derive(Clone)]
pub struct SettlementService {
    db: Arc<DbPool>,
    pools: StockPoolService,
    numbering: DocumentNumberService,
    event_sender: EventSender,
}

impl SettlementService {
    pub fn new(
        db: Arc<DbPool>,
        pools: StockPoolService,
        numbering: DocumentNumberService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            pools,
            numbering,
            event_sender,
        }
    }

    /// Creates a draft document with its lines. No stock effect.
    #[instrument(skip(self, input), fields(client = %input.client))]
    pub async fn create_document(
        &self,
        input: CreateDocumentInput,
    ) -> Result<DocumentWithLines, ServiceError> {
        input.validate()?;

        // Every line must point at an existing record; snapshot what is
        // available right now for later reference.
        let mut snapshots = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            line.validate()?;
            let record = self.pools.get_record(line.pool, line.item_id).await?;
            snapshots.push(record);
        }

        let number = self.numbering.next_number(DOCUMENT_NUMBER_PREFIX).await?;
        let document_id = Uuid::new_v4();
        let now = Utc::now();

        let lines = input.lines.clone();
        let header = delivery_document::ActiveModel {
            id: Set(document_id),
            number: Set(number.clone()),
            document_date: Set(now),
            client: Set(input.client.clone()),
            delivery_address: Set(input.delivery_address.clone()),
            technician: Set(input.technician.clone()),
            kind: Set(input.kind.clone()),
            status: Set(DocumentStatus::Draft),
            invoice_number: Set(input.invoice_number.clone()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self
            .db
            .transaction::<_, DocumentWithLines, ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = header.insert(txn).await?;
                    let mut inserted = Vec::with_capacity(lines.len());
                    for (line, record) in lines.iter().zip(snapshots.iter()) {
                        let row = delivery_line::ActiveModel {
                            document_id: Set(document_id),
                            pool: Set(line.pool),
                            item_id: Set(line.item_id),
                            product_name: Set(record.name.clone()),
                            product_brand: Set(record.brand.clone()),
                            product_model: Set(record.model.clone()),
                            requested_quantity: Set(line.quantity),
                            available_at_creation: Set(record.quantity_available),
                            notes: Set(line.notes.clone()),
                            created_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                        inserted.push(row);
                    }
                    Ok(DocumentWithLines {
                        document,
                        lines: inserted,
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(document_id = %document_id, number = %number, "delivery document created");
        self.event_sender
            .send(Event::DocumentCreated {
                document_id,
                number,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_document(&self, document_id: Uuid) -> Result<DocumentWithLines, ServiceError> {
        let document = self.load_document(document_id).await?;
        let lines = document
            .find_related(DeliveryLine)
            .order_by_asc(delivery_line::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(DocumentWithLines { document, lines })
    }

    /// Confirms a draft: plans every line against the consolidated pools,
    /// then executes the deductions. All-or-nothing at planning time; at
    /// execution time each step is its own per-record transaction, and a
    /// mid-flight failure reports exactly what was applied and leaves the
    /// document in Draft for a retry (already-applied steps are detected
    /// through the ledger and skipped on retry).
    #[instrument(skip(self))]
    pub async fn confirm(&self, document_id: Uuid) -> Result<ConfirmResult, ServiceError> {
        let document = self.load_document(document_id).await?;

        // Idempotence: a second confirm is a no-op, never a double deduction.
        if document.status.is_confirmed_or_later() {
            return Ok(ConfirmResult {
                document_id,
                number: document.number,
                already_confirmed: true,
                lines: Vec::new(),
            });
        }
        if document.status != DocumentStatus::Draft {
            return Err(ServiceError::InvalidOperation(format!(
                "document {} cannot be confirmed from status {}",
                document.number, document.status
            )));
        }

        let lines = document
            .find_related(DeliveryLine)
            .order_by_asc(delivery_line::Column::Id)
            .all(self.db.as_ref())
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "document {} has no lines to confirm",
                document.number
            )));
        }

        let settlements = self.plan_confirmation(&document, &lines).await?;

        // Execution: one transaction per step. Nothing is rolled back
        // implicitly on failure; the ledger makes a retry skip what was
        // already applied.
        let mut completed: Vec<String> = Vec::new();
        for settlement in &settlements {
            for step in &settlement.steps {
                let number = document.number.clone();
                let technician = document.technician.clone();
                let client = document.client.clone();
                let (pool, item_id, quantity) = (step.pool, step.item_id, step.quantity);
                self.db
                    .transaction::<_, stock_movement::Model, ServiceError>(move |txn| {
                        Box::pin(async move {
                            stock_pools::move_stock(
                                txn,
                                pool,
                                item_id,
                                MovementType::Salida,
                                quantity,
                                &format!("delivery to {}", client),
                                Some(&number),
                                &technician,
                            )
                            .await
                        })
                    })
                    .await
                    .map_err(unwrap_txn_err)
                    .map_err(|e| ServiceError::SettlementIncomplete {
                        document_id,
                        completed: completed.clone(),
                        failed: format!("line {} ({} record {})", settlement.line_id, pool, item_id),
                        message: e.to_string(),
                    })?;
            }
            completed.push(format!("line {}", settlement.line_id));
        }

        self.update_status(&document, DocumentStatus::Confirmed).await?;

        info!(
            document_id = %document_id,
            number = %document.number,
            lines = settlements.len(),
            "delivery document confirmed"
        );
        self.event_sender
            .send(Event::DocumentConfirmed {
                document_id,
                number: document.number.clone(),
                lines: settlements.len(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ConfirmResult {
            document_id,
            number: document.number,
            already_confirmed: false,
            lines: settlements,
        })
    }

    /// Pure state transitions after confirmation: InTransit, Delivered, or
    /// Cancelled from any non-terminal state. No stock effect; confirmation
    /// goes through `confirm`.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        document_id: Uuid,
        new_status: DocumentStatus,
    ) -> Result<delivery_document::Model, ServiceError> {
        if new_status == DocumentStatus::Confirmed || new_status == DocumentStatus::Draft {
            return Err(ServiceError::InvalidOperation(format!(
                "transition to {} is not allowed here",
                new_status
            )));
        }

        let document = self.load_document(document_id).await?;
        if !document.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidOperation(format!(
                "document {} cannot move from {} to {}",
                document.number, document.status, new_status
            )));
        }

        let old_status = document.status;
        let updated = self.update_status(&document, new_status).await?;

        self.event_sender
            .send(Event::DocumentStatusChanged {
                document_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes a document after putting every deducted unit back.
    ///
    /// Valid for any document past Draft, including one cancelled after
    /// confirmation (cancellation is a pure transition, so its deductions
    /// stay applied until this operation restores them). What to restore
    /// comes from the ledger, not the status: restoration replays the
    /// document's Salida movements in reverse, so a line that was split
    /// across pools restores to exactly the records it drew from.
    /// Retry-safe: movements already matched by a restoration Entrada are
    /// skipped. The document row is only removed once every deduction is
    /// restored; a mid-flight failure reports what was restored and keeps
    /// the document.
    #[instrument(skip(self))]
    pub async fn delete_with_restoration(
        &self,
        document_id: Uuid,
        reason: &str,
    ) -> Result<DeletionResult, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "a deletion reason is required".to_string(),
            ));
        }

        let document = self.load_document(document_id).await?;
        if document.status == DocumentStatus::Draft {
            return Err(ServiceError::InvalidOperation(format!(
                "document {} is a draft with no settled stock to restore; cancel it instead",
                document.number
            )));
        }

        let outstanding = self.outstanding_deductions(&document.number).await?;
        let restoration_reference = format!(
            "{} {}",
            restoration_reference_prefix(&document.number),
            reason
        );

        let mut restored: Vec<RestorationStep> = Vec::new();
        for ((pool, item_id), quantity) in outstanding {
            let reference = restoration_reference.clone();
            let technician = document.technician.clone();
            self.db
                .transaction::<_, stock_movement::Model, ServiceError>(move |txn| {
                    Box::pin(async move {
                        stock_pools::move_stock(
                            txn,
                            pool,
                            item_id,
                            MovementType::Entrada,
                            quantity,
                            "stock restoration",
                            Some(&reference),
                            &technician,
                        )
                        .await
                    })
                })
                .await
                .map_err(unwrap_txn_err)
                .map_err(|e| ServiceError::SettlementIncomplete {
                    document_id,
                    completed: restored
                        .iter()
                        .map(|r| format!("{} record {}", r.pool, r.item_id))
                        .collect(),
                    failed: format!("{} record {}", pool, item_id),
                    message: e.to_string(),
                })?;
            restored.push(RestorationStep {
                pool,
                item_id,
                quantity,
            });
        }

        // Only now is it safe to drop the document.
        let number = document.number.clone();
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    DeliveryLine::delete_many()
                        .filter(delivery_line::Column::DocumentId.eq(document_id))
                        .exec(txn)
                        .await?;
                    DeliveryDocument::delete_by_id(document_id).exec(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            document_id = %document_id,
            number = %number,
            restored = restored.len(),
            "delivery document deleted with restoration"
        );
        self.event_sender
            .send(Event::DocumentDeleted {
                document_id,
                number: number.clone(),
                reason: reason.to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(DeletionResult {
            document_id,
            number,
            restored,
        })
    }

    async fn load_document(
        &self,
        document_id: Uuid,
    ) -> Result<delivery_document::Model, ServiceError> {
        DeliveryDocument::find_by_id(document_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::RecordNotFound(format!("document {}", document_id)))
    }

    /// Planning pass: resolves every line to pool-level steps against a
    /// consolidated snapshot with running deductions, so several lines of
    /// the same product cannot oversubscribe a record. Quantities this
    /// document already deducted (a retried confirm) are subtracted from
    /// what still needs planning.
    async fn plan_confirmation(
        &self,
        document: &delivery_document::Model,
        lines: &[delivery_line::Model],
    ) -> Result<Vec<LineSettlement>, ServiceError> {
        let general = self.pools.read_pool(PoolTag::GeneralStock).await?;
        let technical = self.pools.read_pool(PoolTag::TechnicalInventory).await?;

        let mut remaining: HashMap<(PoolTag, i64), i32> = general
            .iter()
            .chain(technical.iter())
            .map(|r| ((r.pool, r.id), r.quantity_available))
            .collect();
        let consolidated = consolidate(general.into_iter().chain(technical));

        let mut already_deducted = self.deductions_by_key(&document.number).await?;

        let mut settlements = Vec::with_capacity(lines.len());
        for line in lines {
            let key = ProductKey::new(&line.product_name, &line.product_brand, &line.product_model);
            let product = consolidated.get(&key).ok_or_else(|| {
                ServiceError::RecordNotFound(format!(
                    "no stock found for product '{}' on line {}",
                    line.product_name, line.id
                ))
            })?;

            let mut to_plan = line.requested_quantity;
            if let Some(prior) = already_deducted.get_mut(&key) {
                let settled = to_plan.min(*prior);
                if settled > 0 {
                    warn!(
                        line_id = line.id,
                        settled, "line partially settled by an earlier confirm attempt"
                    );
                }
                *prior -= settled;
                to_plan -= settled;
            }
            if to_plan == 0 {
                settlements.push(LineSettlement {
                    line_id: line.id,
                    steps: Vec::new(),
                });
                continue;
            }

            // Rebuild the product view with the running availability.
            let mut view = product.clone();
            for slot in [&mut view.general, &mut view.technical] {
                if let Some(record) = slot {
                    if let Some(rem) = remaining.get(&(record.pool, record.id)) {
                        record.quantity_available = *rem;
                    }
                }
            }
            view.total_quantity = view.contributors().map(|r| r.quantity_available).sum();

            let plan = exit_planner::plan(&view, to_plan)?;
            for step in &plan.steps {
                // Planned steps always target snapshotted records.
                if let Some(rem) = remaining.get_mut(&(step.pool, step.item_id)) {
                    *rem -= step.quantity;
                }
            }
            settlements.push(LineSettlement {
                line_id: line.id,
                steps: plan.steps,
            });
        }

        Ok(settlements)
    }

    /// Net quantity this document has already deducted, per product key
    /// (Salidas minus restoration Entradas).
    async fn deductions_by_key(
        &self,
        number: &str,
    ) -> Result<HashMap<ProductKey, i32>, ServiceError> {
        let mut net: HashMap<ProductKey, i32> = HashMap::new();
        for movement in self.document_movements(number).await? {
            let key = ProductKey::new(
                &movement.product_name,
                &movement.product_brand,
                &movement.product_model,
            );
            let entry = net.entry(key).or_insert(0);
            match movement.movement_type {
                MovementType::Salida => *entry += movement.quantity,
                MovementType::Entrada => *entry -= movement.quantity,
                _ => {}
            }
        }
        net.retain(|_, v| *v > 0);
        Ok(net)
    }

    /// Net outstanding deductions per record: Salidas referencing the
    /// document minus restoration Entradas already written for it.
    async fn outstanding_deductions(
        &self,
        number: &str,
    ) -> Result<Vec<((PoolTag, i64), i32)>, ServiceError> {
        let mut net: HashMap<(PoolTag, i64), i32> = HashMap::new();
        let mut order: Vec<(PoolTag, i64)> = Vec::new();
        for movement in self.document_movements(number).await? {
            let slot = (movement.pool, movement.item_id);
            if !net.contains_key(&slot) {
                order.push(slot);
            }
            let entry = net.entry(slot).or_insert(0);
            match movement.movement_type {
                MovementType::Salida => *entry += movement.quantity,
                MovementType::Entrada => *entry -= movement.quantity,
                _ => {}
            }
        }
        Ok(order
            .into_iter()
            .filter_map(|slot| {
                let quantity = net[&slot];
                (quantity > 0).then_some((slot, quantity))
            })
            .collect())
    }

    /// All movements belonging to a document: the Salidas referencing its
    /// number plus the restoration Entradas that point back at it.
    async fn document_movements(
        &self,
        number: &str,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let salidas = StockMovement::find()
            .filter(stock_movement::Column::MovementType.eq(MovementType::Salida))
            .filter(stock_movement::Column::Reference.eq(number))
            .order_by_asc(stock_movement::Column::Id)
            .all(self.db.as_ref())
            .await?;
        let restorations = StockMovement::find()
            .filter(stock_movement::Column::MovementType.eq(MovementType::Entrada))
            .filter(
                stock_movement::Column::Reference
                    .starts_with(restoration_reference_prefix(number)),
            )
            .order_by_asc(stock_movement::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(salidas.into_iter().chain(restorations).collect())
    }

    /// Writes a new status with an optimistic version check.
    async fn update_status(
        &self,
        document: &delivery_document::Model,
        new_status: DocumentStatus,
    ) -> Result<delivery_document::Model, ServiceError> {
        let result = DeliveryDocument::update_many()
            .col_expr(delivery_document::Column::Status, Expr::value(new_status))
            .col_expr(
                delivery_document::Column::Version,
                Expr::value(document.version + 1),
            )
            .col_expr(delivery_document::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(delivery_document::Column::Id.eq(document.id))
            .filter(delivery_document::Column::Version.eq(document.version))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "document {} was modified concurrently, retry",
                document.number
            )));
        }
        self.load_document(document.id).await
    }
}

/// Reference prefix shared by every restoration Entrada of one document.
/// Ends at the reason delimiter so one number is never a prefix of another
/// (REM-10000 vs REM-100000).
fn restoration_reference_prefix(number: &str) -> String {
    format!("restoration due to deletion of document {}, reason:", number)
}

fn unwrap_txn_err(e: TransactionError<ServiceError>) -> ServiceError {
    match e {
        TransactionError::Connection(db_err) => ServiceError::StorageFailure(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
