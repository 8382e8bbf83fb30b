use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::ProductSnapshot;
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    /// Price when the product was first added.
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A customer's cart. Entries always have `quantity >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: String,
    pub items: BTreeMap<String, CartLine>,
    pub updated_at: DateTime<Utc>,
}

/// Read-time view of a cart with its total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub customer_id: String,
    pub items: Vec<CartLine>,
    pub total: Decimal,
}

impl CartSnapshot {
    pub fn empty(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            items: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, product_id: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }
}

impl Cart {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            items: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Adds to an existing entry or inserts one with a fresh price snapshot.
    pub fn add(&mut self, product: ProductSnapshot, quantity: u32) -> Result<(), StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        match self.items.get_mut(&product.product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(StoreError::InvalidQuantity(quantity))?;
            }
            None => {
                let line = CartLine {
                    product_id: product.product_id.clone(),
                    name: product.name,
                    unit_price: product.unit_price,
                    image: product.image,
                    quantity,
                };
                self.items.insert(product.product_id, line);
            }
        }
        self.touch();
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), StoreError> {
        if quantity < 1 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        let line = self.items.get_mut(product_id).ok_or_else(|| StoreError::NotFound {
            entity: "cart item",
            id: product_id.to_string(),
        })?;
        line.quantity = quantity;
        self.touch();
        Ok(())
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let removed = self.items.remove(product_id).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    /// Takes checked-out quantities off the cart. Lines that drop to zero are
    /// removed; anything added after the checkout read stays.
    pub fn remove_ordered(&mut self, ordered: &[(String, u32)]) {
        for (product_id, quantity) in ordered {
            if let Some(line) = self.items.get_mut(product_id) {
                line.quantity = line.quantity.saturating_sub(*quantity);
                if line.quantity == 0 {
                    self.items.remove(product_id);
                }
            }
        }
        self.touch();
    }

    pub fn snapshot(&self) -> CartSnapshot {
        let items: Vec<CartLine> = self.items.values().cloned().collect();
        let total = items.iter().map(CartLine::line_total).sum();
        CartSnapshot {
            customer_id: self.customer_id.clone(),
            items,
            total,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
