use std::convert::Infallible;

use chrono::Utc;

use super::actions::OrderAction;
use crate::actor_framework::Entity;
use crate::domain::{validate_payment_transition, validate_transition, Order, OrderDraft, OrderStatus, PaymentStatus};
use crate::error::StoreError;

impl Entity for Order {
    const KIND: &'static str = "order";

    type Id = String;
    type CreateParams = OrderDraft;
    type Patch = Infallible;
    type Action = OrderAction;
    type ActionResult = Order;
    type Error = StoreError;

    fn from_create_params(id: String, draft: OrderDraft) -> Result<Self, StoreError> {
        if draft.line_items.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        Ok(Order::from_draft(id, draft))
    }

    /// Orders only change through actions.
    fn on_update(&mut self, patch: Infallible) -> Result<(), StoreError> {
        match patch {}
    }

    /// Applies one order mutation.
    ///
    /// # Errors
    /// - `OrderTerminal` for any action on a cancelled order.
    /// - `PaymentMethodLocked` when choosing a method after the order left `pending`.
    /// - `InvalidTransition` / `InvalidPaymentTransition` for moves outside the tables.
    /// - `OrderNotCancellable` once processing has started.
    /// - `StockNotCommitted` when advancing an order whose stock was never taken.
    fn handle_action(&mut self, action: OrderAction) -> Result<Order, StoreError> {
        if self.is_cancelled() {
            return Err(StoreError::OrderTerminal(self.id.clone()));
        }

        match action {
            OrderAction::SetPaymentMethod { method, fee } => {
                if self.status != OrderStatus::Pending {
                    return Err(StoreError::PaymentMethodLocked(self.status));
                }
                self.payment_method = Some(method);
                self.payment_fee = fee;
                // Cash is collected on delivery, so only the stock commit blocks fulfilment.
                if method.is_cash_on_delivery() && self.stock_committed {
                    self.status = OrderStatus::Confirmed;
                }
            }
            OrderAction::Transition(next) => {
                if next == OrderStatus::Cancelled {
                    return Err(StoreError::InvalidTransition {
                        from: self.status,
                        to: next,
                    });
                }
                validate_transition(self.status, next)?;
                if !self.stock_committed {
                    return Err(StoreError::StockNotCommitted(self.id.clone()));
                }
                self.status = next;
            }
            OrderAction::Cancel => {
                if !self.status.is_cancellable() {
                    return Err(StoreError::OrderNotCancellable(self.status));
                }
                self.status = OrderStatus::Cancelled;
            }
            OrderAction::AttachPaymentProof(reference) => {
                let reference = reference.trim();
                if reference.is_empty() {
                    return Err(StoreError::InvalidProofReference);
                }
                validate_payment_transition(self.payment_status, PaymentStatus::PendingVerification)?;
                self.payment_proof = Some(reference.to_string());
                self.payment_status = PaymentStatus::PendingVerification;
            }
            OrderAction::ConfirmPayment => {
                let cash_collected = self.payment_status == PaymentStatus::Unpaid
                    && self.payment_method.is_some_and(|m| m.is_cash_on_delivery());
                if !cash_collected {
                    validate_payment_transition(self.payment_status, PaymentStatus::Paid)?;
                }
                self.payment_status = PaymentStatus::Paid;
            }
            OrderAction::RejectPayment => {
                validate_payment_transition(self.payment_status, PaymentStatus::Failed)?;
                self.payment_status = PaymentStatus::Failed;
            }
            OrderAction::MarkStockCommitted => {
                self.stock_committed = true;
                // A cash-on-delivery choice made while the commit was outstanding.
                if self.status == OrderStatus::Pending && self.payment_method.is_some_and(|m| m.is_cash_on_delivery()) {
                    self.status = OrderStatus::Confirmed;
                }
            }
            OrderAction::MarkLineRestored(product_id) => {
                self.restored_lines.insert(product_id);
            }
            OrderAction::MarkStockRestored => self.stock_restored = true,
        }

        self.updated_at = Utc::now();
        Ok(self.clone())
    }
}
