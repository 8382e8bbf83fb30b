use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::actor_framework::{Entity, ResourceClient};
use crate::clients::{CartStore, InventoryLedger};
use crate::domain::{DeliveryDetails, Order, OrderDraft, OrderStatus, PaymentMethod, ShippingOption, Tariff};
use crate::error::StoreError;
use crate::events::{EventPublisher, LifecycleEvent};
use crate::order_actor::OrderAction;

/// Order lifecycle controller.
///
/// Drives cart → order → stock commit → payment or cancellation → stock
/// release across the order store, the cart store and the inventory ledger.
/// Mutations of one order are serialized by a per-order lock, and checkouts of
/// one customer by a per-customer lock. Multi-step
/// operations (placing, committing, cancelling) run on a detached task so a
/// caller that stops waiting cannot leave an order half-processed.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    ledger: InventoryLedger,
    carts: CartStore,
    events: EventPublisher,
    tariff: Tariff,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    checkouts: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl_client_methods!(OrderClient, Order, order);

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        ledger: InventoryLedger,
        carts: CartStore,
        events: EventPublisher,
        tariff: Tariff,
    ) -> Self {
        Self {
            inner,
            ledger,
            carts,
            events,
            tariff,
            locks: Arc::new(DashMap::new()),
            checkouts: Arc::new(DashMap::new()),
        }
    }

    /// Checks out the customer's cart.
    ///
    /// The order record is written before any stock moves. If the stock commit
    /// fails the order stays `pending` with `stock_committed == false`, the
    /// cart is left as it was and the failure is returned; see
    /// [`OrderClient::retry_stock_commit`]. On success only the ordered
    /// quantities leave the cart.
    ///
    /// # Errors
    /// `EmptyCart` (nothing written), `InvalidDeliveryDetails`,
    /// `InsufficientStock`, `TransientWriteConflict`, `Unavailable`.
    #[instrument(skip(self, delivery))]
    pub async fn place_order(
        &self,
        customer_id: &str,
        delivery: DeliveryDetails,
        shipping: ShippingOption,
    ) -> Result<Order, StoreError> {
        info!("Processing place_order request");
        let this = self.clone();
        let customer_id = customer_id.to_string();
        detached(async move { this.place_order_inner(customer_id, delivery, shipping).await }).await
    }

    async fn place_order_inner(
        &self,
        customer_id: String,
        delivery: DeliveryDetails,
        shipping: ShippingOption,
    ) -> Result<Order, StoreError> {
        let _checkout = lock_key(&self.checkouts, &customer_id).await;
        let cart = self.carts.snapshot(&customer_id).await?;
        let draft = OrderDraft::from_cart(cart, delivery, shipping, &self.tariff)?;

        let order_id = self.inner.create(draft).await?;
        let (_guard, order) = self.lock_order(&order_id).await?;
        info!(order_id = %order.id, short_code = %order.short_code(), "Order record created");
        self.events.publish(LifecycleEvent::OrderPlaced {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            short_code: order.short_code(),
            total: order.total(),
        });

        let order = self.commit_stock(order).await?;

        if let Err(e) = self.carts.remove_ordered(&customer_id, order.reservations()).await {
            error!(order_id = %order.id, error = %e, "Stock committed but ordered items stayed in the cart");
        }
        Ok(order)
    }

    /// Re-attempts the stock commit of an order whose checkout failed at that
    /// step. The customer's current cart is not touched.
    ///
    /// # Errors
    /// `OrderTerminal` if cancelled, `StockCommitClosed` once fulfilment has
    /// started, plus any ledger failure.
    #[instrument(skip(self))]
    pub async fn retry_stock_commit(&self, order_id: &str) -> Result<Order, StoreError> {
        info!("Processing retry_stock_commit request");
        let this = self.clone();
        let order_id = order_id.to_string();
        detached(async move { this.retry_stock_commit_inner(order_id).await }).await
    }

    async fn retry_stock_commit_inner(&self, order_id: String) -> Result<Order, StoreError> {
        let (_guard, order) = self.lock_order(&order_id).await?;
        if order.stock_committed {
            debug!("Stock already committed");
            return Ok(order);
        }
        match order.status {
            OrderStatus::Cancelled => Err(StoreError::OrderTerminal(order.id)),
            OrderStatus::Pending | OrderStatus::Confirmed => self.commit_stock(order).await,
            other => Err(StoreError::StockCommitClosed(other)),
        }
    }

    /// Caller must hold the order's lock.
    async fn commit_stock(&self, order: Order) -> Result<Order, StoreError> {
        if let Err(e) = self.ledger.batch_decrement(&order.reservations()).await {
            warn!(order_id = %order.id, error = %e, "Stock commit failed, order left pending");
            self.events.publish(LifecycleEvent::StockCommitFailed {
                order_id: order.id.clone(),
                customer_id: order.customer_id.clone(),
                reason: e.to_string(),
            });
            return Err(e);
        }

        let committed = self
            .inner
            .perform_action(order.id.clone(), OrderAction::MarkStockCommitted)
            .await
            .inspect_err(|e| error!(order_id = %order.id, error = %e, "Stock decremented but commit flag not recorded"))?;
        info!(order_id = %committed.id, "Stock committed");
        self.events.publish(LifecycleEvent::StockCommitted {
            order_id: committed.id.clone(),
            customer_id: committed.customer_id.clone(),
        });
        self.publish_changes(&order, &committed);
        Ok(committed)
    }

    /// Cancels a `pending` or `confirmed` order, giving committed stock back
    /// exactly once.
    ///
    /// Restoration is recorded per product and then for the whole order before
    /// the status flips, so a repeat after an interrupted cancellation gives
    /// back only what is still missing. A product the ledger refuses outright
    /// is logged and skipped so the order does not get stuck.
    ///
    /// # Errors
    /// `OrderTerminal` if already cancelled, `OrderNotCancellable(status)`
    /// once processing has started, and retryable ledger failures.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<Order, StoreError> {
        info!("Processing cancel_order request");
        let this = self.clone();
        let order_id = order_id.to_string();
        detached(async move { this.cancel_order_inner(order_id).await }).await
    }

    async fn cancel_order_inner(&self, order_id: String) -> Result<Order, StoreError> {
        let (_guard, order) = self.lock_order(&order_id).await?;
        if order.is_cancelled() {
            return Err(StoreError::OrderTerminal(order.id));
        }
        if !order.status.is_cancellable() {
            return Err(StoreError::OrderNotCancellable(order.status));
        }

        let mut restored_now = false;
        if order.stock_committed && !order.stock_restored {
            for (product_id, quantity) in order.reservations() {
                if order.restored_lines.contains(&product_id) {
                    debug!(product_id = %product_id, "Already restored");
                    continue;
                }
                match self.ledger.increment(&product_id, quantity).await {
                    Ok(_) => {}
                    Err(e) if e.is_retryable() => return Err(e),
                    Err(e) => {
                        error!(
                            order_id = %order_id,
                            product_id = %product_id,
                            quantity,
                            error = %e,
                            "Stock could not be restored, skipping"
                        );
                    }
                }
                self.inner
                    .perform_action(order_id.clone(), OrderAction::MarkLineRestored(product_id))
                    .await?;
            }
            self.inner
                .perform_action(order_id.clone(), OrderAction::MarkStockRestored)
                .await?;
            restored_now = true;
            info!(order_id = %order_id, "Stock restored");
        }

        let cancelled = self.inner.perform_action(order_id, OrderAction::Cancel).await?;
        info!(order_id = %cancelled.id, from = %order.status, "Order cancelled");
        self.events.publish(LifecycleEvent::OrderCancelled {
            order_id: cancelled.id.clone(),
            customer_id: cancelled.customer_id.clone(),
            stock_restored: restored_now || order.stock_restored,
        });
        Ok(cancelled)
    }

    /// Records the payment method and its fee. Defaults to the tariff fee.
    /// Cash on delivery also confirms the order once its stock is committed.
    #[instrument(skip(self))]
    pub async fn set_payment_method(
        &self,
        order_id: &str,
        method: PaymentMethod,
        fee_override: Option<Decimal>,
    ) -> Result<Order, StoreError> {
        info!("Processing set_payment_method request");
        let fee = fee_override.unwrap_or_else(|| self.tariff.payment_fee(method));
        self.apply(order_id, OrderAction::SetPaymentMethod { method, fee }).await
    }

    #[instrument(skip(self))]
    pub async fn attach_payment_proof(&self, order_id: &str, reference: &str) -> Result<Order, StoreError> {
        info!("Processing attach_payment_proof request");
        let order = self
            .apply(order_id, OrderAction::AttachPaymentProof(reference.to_string()))
            .await?;
        self.events.publish(LifecycleEvent::PaymentProofAttached {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
        });
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, order_id: &str) -> Result<Order, StoreError> {
        info!("Processing confirm_payment request");
        self.apply(order_id, OrderAction::ConfirmPayment).await
    }

    #[instrument(skip(self))]
    pub async fn reject_payment(&self, order_id: &str) -> Result<Order, StoreError> {
        info!("Processing reject_payment request");
        self.apply(order_id, OrderAction::RejectPayment).await
    }

    /// Moves the order along the status table. `Cancelled` is routed through
    /// [`OrderClient::cancel_order`] so stock is restored.
    #[instrument(skip(self))]
    pub async fn transition_order_status(&self, order_id: &str, next: OrderStatus) -> Result<Order, StoreError> {
        if next == OrderStatus::Cancelled {
            return self.cancel_order(order_id).await;
        }
        info!("Processing transition_order_status request");
        self.apply(order_id, OrderAction::Transition(next)).await
    }

    /// Like `get_order`, but a missing order is an error.
    pub async fn order(&self, order_id: &str) -> Result<Order, StoreError> {
        self.require(order_id).await
    }

    /// Order history, newest first.
    #[instrument(skip(self))]
    pub async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, StoreError> {
        debug!("Sending request");
        let mut orders: Vec<Order> = self
            .inner
            .list()
            .await?
            .into_iter()
            .filter(|order| order.customer_id == customer_id)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(orders)
    }

    /// Single-action mutation under the order lock, publishing whatever
    /// status changes it caused.
    async fn apply(&self, order_id: &str, action: OrderAction) -> Result<Order, StoreError> {
        let (_guard, before) = self.lock_order(order_id).await?;
        let after = self.inner.perform_action(order_id.to_string(), action).await?;
        self.publish_changes(&before, &after);
        Ok(after)
    }

    fn publish_changes(&self, before: &Order, after: &Order) {
        if before.status != after.status {
            info!(order_id = %after.id, from = %before.status, to = %after.status, "Order status changed");
            self.events.publish(LifecycleEvent::OrderStatusChanged {
                order_id: after.id.clone(),
                customer_id: after.customer_id.clone(),
                from: before.status,
                to: after.status,
            });
        }
        if before.payment_status != after.payment_status {
            info!(
                order_id = %after.id,
                from = %before.payment_status,
                to = %after.payment_status,
                "Payment status changed"
            );
            self.events.publish(LifecycleEvent::PaymentStatusChanged {
                order_id: after.id.clone(),
                customer_id: after.customer_id.clone(),
                from: before.payment_status,
                to: after.payment_status,
            });
        }
    }

    async fn require(&self, order_id: &str) -> Result<Order, StoreError> {
        self.inner
            .get(order_id.to_string())
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: Order::KIND,
                id: order_id.to_string(),
            })
    }

    /// Locks the order and reads it. Ids that do not resolve leave no entry
    /// behind in the lock map.
    async fn lock_order(&self, order_id: &str) -> Result<(OwnedMutexGuard<()>, Order), StoreError> {
        let guard = lock_key(&self.locks, order_id).await;
        match self.require(order_id).await {
            Ok(order) => Ok((guard, order)),
            Err(e) => {
                drop(guard);
                if matches!(e, StoreError::NotFound { .. }) {
                    self.locks.remove_if(order_id, |_, lock| Arc::strong_count(lock) == 1);
                }
                Err(e)
            }
        }
    }
}

async fn lock_key(locks: &DashMap<String, Arc<Mutex<()>>>, key: &str) -> OwnedMutexGuard<()> {
    let lock = locks.entry(key.to_string()).or_default().clone();
    lock.lock_owned().await
}

/// Runs `work` on its own task in the caller's span.
async fn detached<F>(work: F) -> Result<Order, StoreError>
where
    F: std::future::Future<Output = Result<Order, StoreError>> + Send + 'static,
{
    tokio::spawn(work.in_current_span())
        .await
        .map_err(|e| StoreError::Unavailable(format!("order task failed: {e}")))?
}
