use rust_decimal::Decimal;

use crate::domain::{OrderStatus, PaymentMethod};

/// Order mutations. Each one answers with the updated order.
#[derive(Debug, Clone)]
pub enum OrderAction {
    SetPaymentMethod { method: PaymentMethod, fee: Decimal },
    /// Forward move along the status table. Cancellation has its own action.
    Transition(OrderStatus),
    Cancel,
    AttachPaymentProof(String),
    ConfirmPayment,
    RejectPayment,
    MarkStockCommitted,
    /// One product's quantity went back to the ledger.
    MarkLineRestored(String),
    MarkStockRestored,
}
