//! Lifecycle events published after each successful order change.
//!
//! Subscribers (a notification emitter, an admin feed) each get their own
//! receiver. Publishing never blocks and never fails the operation that
//! triggered it; a subscriber that falls behind sees `RecvError::Lagged`.

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{OrderStatus, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    OrderPlaced {
        order_id: String,
        customer_id: String,
        short_code: String,
        total: Decimal,
    },
    StockCommitted {
        order_id: String,
        customer_id: String,
    },
    StockCommitFailed {
        order_id: String,
        customer_id: String,
        reason: String,
    },
    OrderStatusChanged {
        order_id: String,
        customer_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    PaymentStatusChanged {
        order_id: String,
        customer_id: String,
        from: PaymentStatus,
        to: PaymentStatus,
    },
    PaymentProofAttached {
        order_id: String,
        customer_id: String,
    },
    OrderCancelled {
        order_id: String,
        customer_id: String,
        stock_restored: bool,
    },
}

impl LifecycleEvent {
    pub fn order_id(&self) -> &str {
        match self {
            Self::OrderPlaced { order_id, .. }
            | Self::StockCommitted { order_id, .. }
            | Self::StockCommitFailed { order_id, .. }
            | Self::OrderStatusChanged { order_id, .. }
            | Self::PaymentStatusChanged { order_id, .. }
            | Self::PaymentProofAttached { order_id, .. }
            | Self::OrderCancelled { order_id, .. } => order_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: LifecycleEvent) {
        // No subscribers is not an error.
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(order_id = %event.order_id(), "Lifecycle event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}
