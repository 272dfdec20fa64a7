use crate::{
    errors::ServiceError,
    models::{ConsolidatedProduct, ExitPlan, ExitStep},
};

/// Decides how a requested quantity is split across the pools, without
/// touching storage.
///
/// Fixed policy: general stock drains first, the remainder comes from
/// technical inventory. The order is deliberately not configurable so
/// behavior stays predictable. On shortfall the whole request fails with
/// the missing amount; a partial plan is never produced.
pub fn plan(product: &ConsolidatedProduct, requested: i32) -> Result<ExitPlan, ServiceError> {
    if requested <= 0 {
        return Err(ServiceError::InvalidInput(format!(
            "requested quantity must be positive, got {}",
            requested
        )));
    }

    let available = product.total_quantity;
    if available < requested {
        return Err(ServiceError::InsufficientStock {
            requested,
            available,
            shortfall: requested - available,
        });
    }

    let mut steps = Vec::with_capacity(2);
    let mut remaining = requested;

    for record in [&product.general, &product.technical].into_iter().flatten() {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(record.quantity_available);
        if take > 0 {
            steps.push(ExitStep {
                pool: record.pool,
                item_id: record.id,
                quantity: take,
            });
            remaining -= take;
        }
    }

    // Guarded by the availability check above; a leftover here means the
    // consolidated snapshot was inconsistent.
    if remaining != 0 {
        return Err(ServiceError::InvariantViolation(format!(
            "exit plan for {} left {} units unassigned",
            product.key, remaining
        )));
    }

    Ok(ExitPlan { requested, steps })
}
