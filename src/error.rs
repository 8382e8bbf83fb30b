use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::domain::{OrderStatus, PaymentStatus};

/// Every failure the order/inventory core can report to its callers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        available: u32,
        requested: u32,
    },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Invalid payment status transition: {from} -> {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },
    #[error("Payment method is locked once the order is {0}")]
    PaymentMethodLocked(OrderStatus),
    #[error("Order cannot be cancelled while {0}")]
    OrderNotCancellable(OrderStatus),
    #[error("Order {0} is cancelled")]
    OrderTerminal(String),
    #[error("Order {0} cannot advance before its stock is committed")]
    StockNotCommitted(String),
    #[error("Stock can no longer be committed for an order that is {0}")]
    StockCommitClosed(OrderStatus),
    #[error("Write conflict on {product_id} persisted after {attempts} attempts")]
    TransientWriteConflict { product_id: String, attempts: u32 },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },
    #[error("Invalid delivery details: {0}")]
    InvalidDeliveryDetails(String),
    #[error("Payment proof reference is empty")]
    InvalidProofReference,
    #[error("Invalid catalog document: {0}")]
    InvalidCatalogDocument(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Worth retrying the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientWriteConflict { .. } | Self::Unavailable(_))
    }

    /// Text for the customer-facing layer.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientStock {
                product_id,
                available,
                requested,
            } => format!(
                "Not enough stock for {product_id}: {available} available, short by {}",
                requested.saturating_sub(*available)
            ),
            Self::OrderNotCancellable(status) => {
                format!("This order can no longer be cancelled because it is {status}")
            }
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}

impl From<FrameworkError<StoreError>> for StoreError {
    fn from(err: FrameworkError<StoreError>) -> Self {
        match err {
            FrameworkError::NotFound { kind, id } => Self::NotFound { entity: kind, id },
            FrameworkError::AlreadyExists { kind, id } => Self::AlreadyExists { entity: kind, id },
            FrameworkError::VersionConflict { id, .. } => Self::TransientWriteConflict {
                product_id: id,
                attempts: 1,
            },
            FrameworkError::Entity(inner) => inner,
            other @ (FrameworkError::IdRequired { .. }
            | FrameworkError::ActorClosed
            | FrameworkError::ActorDropped) => Self::Unavailable(other.to_string()),
        }
    }
}
