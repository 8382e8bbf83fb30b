use crate::domain::ProductSnapshot;

/// Cart mutations. Every variant answers with the cart's snapshot afterwards.
#[derive(Debug, Clone)]
pub enum CartAction {
    Add { product: ProductSnapshot, quantity: u32 },
    SetQuantity { product_id: String, quantity: u32 },
    Remove(String),
    Clear,
    /// Subtract what a checkout turned into an order.
    RemoveOrdered(Vec<(String, u32)>),
}
