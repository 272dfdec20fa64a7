use crate::{
    errors::ServiceError,
    models::{ConsolidatedProduct, PoolTag, ProductKey, StockRecord},
    services::stock_pools::StockPoolService,
};
use std::collections::BTreeMap;
use tracing::{instrument, warn};

/// Merges records from both pools into one logical view per product key.
///
/// At most one record contributes per pool; a second record with the same
/// key inside one pool is a data-quality problem and is logged, not merged.
/// Deterministic for a given input order, and the sum invariant
/// (`total_quantity == sum of contributors`) holds after every insertion.
pub fn consolidate(
    records: impl IntoIterator<Item = StockRecord>,
) -> BTreeMap<ProductKey, ConsolidatedProduct> {
    let mut merged: BTreeMap<ProductKey, ConsolidatedProduct> = BTreeMap::new();

    for record in records {
        let key = record.product_key();
        let entry = merged
            .entry(key.clone())
            .or_insert_with(|| ConsolidatedProduct {
                key,
                name: record.name.clone(),
                brand: record.brand.clone(),
                model: record.model.clone(),
                total_quantity: 0,
                technical: None,
                general: None,
            });

        let slot = match record.pool {
            PoolTag::TechnicalInventory => &mut entry.technical,
            PoolTag::GeneralStock => &mut entry.general,
        };
        if let Some(existing) = slot {
            warn!(
                pool = %record.pool,
                first_seen = existing.id,
                duplicate = record.id,
                key = %entry.key,
                "duplicate product within one pool, keeping first-seen record"
            );
            continue;
        }
        entry.total_quantity += record.quantity_available;
        *slot = Some(record);

        debug_assert_eq!(
            entry.total_quantity,
            entry.contributors().map(|r| r.quantity_available).sum::<i32>()
        );
    }

    merged
}

/// Query surface over the consolidated two-pool view.
#[derive(Clone)]
pub struct ConsolidationService {
    pools: StockPoolService,
}

impl ConsolidationService {
    pub fn new(pools: StockPoolService) -> Self {
        Self { pools }
    }

    /// Reads both pools and consolidates them. Each pool is read
    /// independently; either failure aborts with the pool named in the
    /// error.
    async fn snapshot(&self) -> Result<BTreeMap<ProductKey, ConsolidatedProduct>, ServiceError> {
        let general = self.pools.read_pool(PoolTag::GeneralStock).await?;
        let technical = self.pools.read_pool(PoolTag::TechnicalInventory).await?;
        Ok(consolidate(general.into_iter().chain(technical)))
    }

    /// All consolidated products, sorted by display name.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ConsolidatedProduct>, ServiceError> {
        let mut products: Vec<ConsolidatedProduct> = self.snapshot().await?.into_values().collect();
        products.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(products)
    }

    /// Looks a product up by its normalized identity.
    #[instrument(skip(self))]
    pub async fn find(
        &self,
        name: &str,
        brand: &str,
        model: &str,
    ) -> Result<Option<ConsolidatedProduct>, ServiceError> {
        let key = ProductKey::new(name, brand, model);
        Ok(self.snapshot().await?.remove(&key))
    }

    /// Consolidated view of a single product key.
    pub async fn find_by_key(
        &self,
        key: &ProductKey,
    ) -> Result<Option<ConsolidatedProduct>, ServiceError> {
        Ok(self.snapshot().await?.remove(key))
    }
}
