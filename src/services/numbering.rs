use crate::{
    db::DbPool,
    entities::document_counter::{self, Entity as DocumentCounter},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionError, TransactionTrait};
use std::sync::Arc;
use tracing::instrument;

/// Issues globally unique, monotonically increasing human-readable
/// document numbers, one counter per prefix (e.g. `REM-00042`). The
/// counter bump runs in its own transaction so numbers are race-free.
#[derive(Clone)]
pub struct DocumentNumberService {
    db: Arc<DbPool>,
}

impl DocumentNumberService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn next_number(&self, prefix: &str) -> Result<String, ServiceError> {
        let key = prefix.to_string();
        let value = self
            .db
            .transaction::<_, i64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let counter = DocumentCounter::find_by_id(key.clone()).one(txn).await?;
                    let next = match counter {
                        Some(counter) => {
                            let next = counter.last_value + 1;
                            let mut active: document_counter::ActiveModel = counter.into();
                            active.last_value = Set(next);
                            active.updated_at = Set(Utc::now());
                            active.update(txn).await?;
                            next
                        }
                        None => {
                            document_counter::ActiveModel {
                                prefix: Set(key),
                                last_value: Set(1),
                                updated_at: Set(Utc::now()),
                            }
                            .insert(txn)
                            .await?;
                            1
                        }
                    };
                    Ok(next)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::StorageFailure(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        Ok(format!("{}-{:05}", prefix, value))
    }
}
