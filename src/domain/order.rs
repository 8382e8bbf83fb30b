use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartLine, CartSnapshot};
use super::pricing::{PaymentMethod, ShippingOption, Tariff};
use super::status::{OrderStatus, PaymentStatus};
use crate::error::StoreError;

/// Purchased item, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl From<CartLine> for LineItem {
    fn from(line: CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            image: line.image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub recipient_name: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl DeliveryDetails {
    /// Rejects the first blank required field, by name.
    pub fn validate(&self) -> Result<(), StoreError> {
        let required = [
            ("recipient_name", &self.recipient_name),
            ("phone_number", &self.phone_number),
            ("address", &self.address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(StoreError::InvalidDeliveryDetails(format!("{field} is required"))),
            None => Ok(()),
        }
    }
}

/// Everything needed to create an order record, already validated.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_id: String,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping: ShippingOption,
    pub shipping_fee: Decimal,
    pub delivery: DeliveryDetails,
}

impl OrderDraft {
    pub fn from_cart(
        cart: CartSnapshot,
        delivery: DeliveryDetails,
        shipping: ShippingOption,
        tariff: &Tariff,
    ) -> Result<Self, StoreError> {
        if cart.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        delivery.validate()?;

        let line_items: Vec<LineItem> = cart.items.into_iter().map(LineItem::from).collect();
        let subtotal = line_items.iter().map(LineItem::line_total).sum();
        Ok(Self {
            customer_id: cart.customer_id,
            line_items,
            subtotal,
            shipping,
            shipping_fee: tariff.shipping_fee(shipping),
            delivery,
        })
    }
}

/// An order record. Line items, amounts and delivery details never change after
/// creation; only the status and bookkeeping fields move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping: ShippingOption,
    pub shipping_fee: Decimal,
    pub delivery: DeliveryDetails,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_fee: Decimal,
    pub payment_proof: Option<String>,
    /// Line-item quantities have been taken out of the ledger.
    pub stock_committed: bool,
    /// Those quantities have been given back by a cancellation.
    pub stock_restored: bool,
    /// Products already given back by a cancellation that has not finished.
    #[serde(default)]
    pub restored_lines: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_draft(id: String, draft: OrderDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            customer_id: draft.customer_id,
            line_items: draft.line_items,
            subtotal: draft.subtotal,
            shipping: draft.shipping,
            shipping_fee: draft.shipping_fee,
            delivery: draft.delivery,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            payment_fee: Decimal::ZERO,
            payment_proof: None,
            stock_committed: false,
            stock_restored: false,
            restored_lines: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total(&self) -> Decimal {
        self.subtotal + self.shipping_fee + self.payment_fee
    }

    /// Display code: the last six characters of the id, upper-cased.
    pub fn short_code(&self) -> String {
        let start = self.id.len().saturating_sub(6);
        self.id.get(start..).unwrap_or(self.id.as_str()).to_uppercase()
    }

    /// `(product_id, quantity)` pairs taken from the ledger for this order.
    pub fn reservations(&self) -> Vec<(String, u32)> {
        self.line_items
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::Cart;
    use crate::domain::catalog::ProductSnapshot;

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            recipient_name: "Sari".into(),
            phone_number: "08123456789".into(),
            address: "Jl. Merdeka 1".into(),
            city: "Bandung".into(),
            postal_code: "40111".into(),
            special_instructions: None,
        }
    }

    fn cart() -> CartSnapshot {
        let mut cart = Cart::new("c1");
        cart.add(ProductSnapshot::new("a", "A", Decimal::from(10_000)), 2).unwrap();
        cart.add(ProductSnapshot::new("b", "B", Decimal::from(5_000)), 1).unwrap();
        cart.snapshot()
    }

    #[test]
    fn test_draft_copies_cart_and_prices_shipping() {
        let draft = OrderDraft::from_cart(cart(), delivery(), ShippingOption::Courier, &Tariff::default()).unwrap();
        assert_eq!(draft.line_items.len(), 2);
        assert_eq!(draft.subtotal, Decimal::from(25_000));
        assert_eq!(draft.shipping_fee, Decimal::from(15_000));

        let order = Order::from_draft("0f5e2c1a-9b7d-4e3f-8a21-c0ffee123abc".into(), draft);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total(), Decimal::from(40_000));
        assert_eq!(order.short_code(), "123ABC");
        assert_eq!(order.reservations(), vec![("a".to_string(), 2), ("b".to_string(), 1)]);
    }

    #[test]
    fn test_empty_cart_checked_before_delivery() {
        let mut blank = delivery();
        blank.city = "  ".into();
        let result = OrderDraft::from_cart(CartSnapshot::empty("c1"), blank, ShippingOption::Courier, &Tariff::default());
        assert!(matches!(result, Err(StoreError::EmptyCart)));
    }

    #[test]
    fn test_blank_delivery_field_is_named() {
        let mut blank = delivery();
        blank.postal_code = String::new();
        let result = OrderDraft::from_cart(cart(), blank, ShippingOption::StorePickup, &Tariff::default());
        assert_eq!(
            result.map(|_| ()),
            Err(StoreError::InvalidDeliveryDetails("postal_code is required".into()))
        );
    }
}
