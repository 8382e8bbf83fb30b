use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actor_framework::ResourceActor;
use crate::app_system::StoreConfig;
use crate::clients::{CartStore, InventoryLedger, OrderClient};
use crate::domain::{Cart, Order, StockEntry};
use crate::error::StoreError;
use crate::events::{EventPublisher, LifecycleEvent};

/// The running store: three record actors and the clients wired over them.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct StoreSystem {
    pub orders: OrderClient,
    pub carts: CartStore,
    pub ledger: InventoryLedger,
    events: EventPublisher,
    handles: Vec<JoinHandle<()>>,
}

impl StoreSystem {
    pub fn new(config: &StoreConfig) -> Self {
        // 1. Inventory, keyed by product id
        let (stock_actor, stock_client) = ResourceActor::<StockEntry>::keyed(config.mailbox_capacity);
        let ledger = InventoryLedger::new(stock_client, config.retry);
        let stock_handle = tokio::spawn(stock_actor.run());

        // 2. Carts, keyed by customer id
        let (cart_actor, cart_client) = ResourceActor::<Cart>::keyed(config.mailbox_capacity);
        let carts = CartStore::new(cart_client);
        let cart_handle = tokio::spawn(cart_actor.run());

        // 3. Orders, with store-generated ids
        let next_order_id = || uuid::Uuid::new_v4().to_string();
        let (order_actor, order_client) = ResourceActor::<Order>::new(config.mailbox_capacity, next_order_id);
        let events = EventPublisher::new(config.event_buffer);
        let orders = OrderClient::new(
            order_client,
            ledger.clone(),
            carts.clone(),
            events.clone(),
            config.tariff.clone(),
        );
        let order_handle = tokio::spawn(order_actor.run());

        info!(mailbox_capacity = config.mailbox_capacity, "Store system started");
        Self {
            orders,
            carts,
            ledger,
            events,
            handles: vec![order_handle, cart_handle, stock_handle],
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Stops orders first, then carts, then inventory, and waits for each actor
    /// to drain its queue.
    pub async fn shutdown(self) -> Result<(), StoreError> {
        info!("Shutting down store system...");
        self.orders.shutdown().await?;
        self.carts.shutdown().await?;
        self.ledger.shutdown().await?;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(StoreError::Unavailable(format!("actor task failed: {e}")));
            }
        }

        info!("Store system shutdown complete.");
        Ok(())
    }
}
