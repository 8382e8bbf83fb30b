//! Order and payment status machines.
//!
//! The two axes move independently. Order status follows
//! `pending → confirmed → processing → shipped → delivered`, with cancellation
//! allowed only before processing starts. Payment status follows
//! `unpaid → pending_verification → paid`, with `failed` reachable from the
//! first two and left again by resubmitting proof.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped],
            Shipped => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Cancellation window: closes once processing begins.
    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PendingVerification,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Unpaid,
        PaymentStatus::PendingVerification,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
    ];

    pub fn allowed_transitions(self) -> &'static [PaymentStatus] {
        use PaymentStatus::*;
        match self {
            Unpaid => &[PendingVerification, Failed],
            PendingVerification => &[Paid, Failed],
            Failed => &[PendingVerification],
            Paid => &[],
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PendingVerification => "pending_verification",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition { from, to })
    }
}

pub fn validate_payment_transition(from: PaymentStatus, to: PaymentStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::InvalidPaymentTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_happy_path_is_forward_only() {
        use OrderStatus::*;
        assert!(validate_transition(Pending, Confirmed).is_ok());
        assert!(validate_transition(Confirmed, Processing).is_ok());
        assert!(validate_transition(Processing, Shipped).is_ok());
        assert!(validate_transition(Shipped, Delivered).is_ok());

        assert_eq!(
            validate_transition(Delivered, Pending),
            Err(StoreError::InvalidTransition {
                from: Delivered,
                to: Pending
            })
        );
        assert!(validate_transition(Processing, Confirmed).is_err());
        assert!(validate_transition(Pending, Shipped).is_err());
    }

    #[test]
    fn test_cancellation_window() {
        use OrderStatus::*;
        assert!(Pending.is_cancellable());
        assert!(Confirmed.is_cancellable());
        for status in [Processing, Shipped, Delivered, Cancelled] {
            assert!(!status.is_cancellable(), "{status} should not be cancellable");
            assert!(!status.can_transition_to(Cancelled));
        }
        assert!(Cancelled.allowed_transitions().is_empty());
    }

    #[test]
    fn test_payment_proof_resubmission_after_failure() {
        use PaymentStatus::*;
        assert!(validate_payment_transition(Unpaid, PendingVerification).is_ok());
        assert!(validate_payment_transition(PendingVerification, Failed).is_ok());
        assert!(validate_payment_transition(Failed, PendingVerification).is_ok());
        assert!(validate_payment_transition(PendingVerification, Paid).is_ok());
        assert!(validate_payment_transition(Paid, Failed).is_err());
        assert!(validate_payment_transition(Unpaid, Paid).is_err());
    }

    #[test]
    fn test_serde_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PendingVerification).unwrap(),
            "\"pending_verification\""
        );
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
    }

    fn any_order_status() -> impl Strategy<Value = OrderStatus> {
        proptest::sample::select(OrderStatus::ALL.to_vec())
    }

    fn any_payment_status() -> impl Strategy<Value = PaymentStatus> {
        proptest::sample::select(PaymentStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_order_transitions_match_table(from in any_order_status(), to in any_order_status()) {
            let res = validate_transition(from, to);
            prop_assert_eq!(res.is_ok(), from.allowed_transitions().contains(&to));
            // Nothing ever moves backwards into pending.
            if to == OrderStatus::Pending {
                prop_assert!(res.is_err());
            }
        }

        #[test]
        fn prop_payment_transitions_match_table(from in any_payment_status(), to in any_payment_status()) {
            let res = validate_payment_transition(from, to);
            prop_assert_eq!(res.is_ok(), from.allowed_transitions().contains(&to));
            if from == PaymentStatus::Paid {
                prop_assert!(res.is_err());
            }
        }
    }
}
