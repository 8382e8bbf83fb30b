use tracing::{debug, error, info, instrument, warn};

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, Versioned};
use crate::app_system::RetryPolicy;
use crate::domain::{StockCreate, StockEntry, StockPatch};
use crate::error::StoreError;
use crate::stock_actor::StockAction;

/// Per-product available quantities.
///
/// Decrements are read-check-write cycles made safe by a conditional write on
/// the record version; on a conflict the cycle is retried with backoff.
/// Increments are applied inside the stock actor and never conflict.
#[derive(Clone)]
pub struct InventoryLedger {
    inner: ResourceClient<StockEntry>,
    retry: RetryPolicy,
}

impl_client_methods!(InventoryLedger, StockEntry, stock_entry);

impl InventoryLedger {
    pub fn new(inner: ResourceClient<StockEntry>, retry: RetryPolicy) -> Self {
        Self { inner, retry }
    }

    #[instrument(skip(self))]
    pub async fn register(&self, product_id: String, available: u32) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner
            .insert(product_id, StockCreate { available })
            .await
            .map_err(StoreError::from)
    }

    #[instrument(skip(self))]
    pub async fn available(&self, product_id: &str) -> Result<u32, StoreError> {
        debug!("Sending request");
        self.inner
            .get(product_id.to_string())
            .await?
            .map(|entry| entry.available)
            .ok_or_else(|| missing(product_id))
    }

    /// Delists a product. Later restorations for it become logged no-ops.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: &str) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner
            .delete(product_id.to_string())
            .await
            .map_err(StoreError::from)
    }

    /// Takes `quantity` units out of stock and returns what is left.
    ///
    /// # Errors
    /// - `InsufficientStock` when fewer than `quantity` units are available.
    /// - `TransientWriteConflict` when every attempt lost a race to another writer.
    #[instrument(skip(self))]
    pub async fn decrement(&self, product_id: &str, quantity: u32) -> Result<u32, StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let mut attempt = 1;
        loop {
            let Versioned { version, entity } = self
                .inner
                .get_versioned(product_id.to_string())
                .await?
                .ok_or_else(|| missing(product_id))?;

            if entity.available < quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available: entity.available,
                    requested: quantity,
                });
            }

            let patch = StockPatch {
                available: entity.available - quantity,
            };
            match self.inner.update(product_id.to_string(), patch, Some(version)).await {
                Ok(updated) => {
                    debug!(remaining = updated.entity.available, attempt, "Stock decremented");
                    return Ok(updated.entity.available);
                }
                Err(FrameworkError::VersionConflict { actual, .. }) if attempt < self.retry.max_attempts => {
                    debug!(attempt, expected = version, actual, "Stock changed underneath, retrying");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                Err(FrameworkError::VersionConflict { .. }) => {
                    warn!(attempts = attempt, "Giving up on stock decrement after repeated conflicts");
                    return Err(StoreError::TransientWriteConflict {
                        product_id: product_id.to_string(),
                        attempts: attempt,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Puts `quantity` units back. A product that no longer exists is skipped
    /// with a warning and yields `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn increment(&self, product_id: &str, quantity: u32) -> Result<Option<u32>, StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        match self
            .inner
            .perform_action(product_id.to_string(), StockAction::Restock(quantity))
            .await
        {
            Ok(available) => Ok(Some(available)),
            Err(FrameworkError::NotFound { .. }) => {
                warn!("Product no longer stocked, skipping restoration");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Decrements every item or none of them.
    ///
    /// Duplicate product ids are merged first. Items are applied in order; on the
    /// first failure the items already applied are given back in reverse order
    /// and the original failure is returned.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn batch_decrement(&self, items: &[(String, u32)]) -> Result<(), StoreError> {
        let merged = merge_quantities(items)?;
        let mut applied: Vec<(&str, u32)> = Vec::with_capacity(merged.len());

        for (product_id, quantity) in &merged {
            match self.decrement(product_id, *quantity).await {
                Ok(_) => applied.push((product_id.as_str(), *quantity)),
                Err(e) => {
                    info!(
                        product_id = %product_id,
                        error = %e,
                        rollback = applied.len(),
                        "Batch decrement failed, compensating"
                    );
                    self.compensate(&applied).await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn compensate(&self, applied: &[(&str, u32)]) {
        for (product_id, quantity) in applied.iter().rev() {
            if let Err(e) = self.increment(product_id, *quantity).await {
                error!(product_id = %product_id, quantity, error = %e, "Compensating increment failed");
            }
        }
    }
}

fn missing(product_id: &str) -> StoreError {
    StoreError::NotFound {
        entity: StockEntry::KIND,
        id: product_id.to_string(),
    }
}

/// Sums quantities per product, keeping first-seen order.
fn merge_quantities(items: &[(String, u32)]) -> Result<Vec<(String, u32)>, StoreError> {
    let mut merged: Vec<(String, u32)> = Vec::with_capacity(items.len());
    for (product_id, quantity) in items {
        match merged.iter_mut().find(|(id, _)| id == product_id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(*quantity)
                    .ok_or(StoreError::InvalidQuantity(*quantity))?;
            }
            None => merged.push((product_id.clone(), *quantity)),
        }
    }
    Ok(merged)
}
