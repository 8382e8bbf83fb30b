use serde::{Deserialize, Serialize};

/// Available quantity for one product. `u32` keeps the count non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub product_id: String,
    pub available: u32,
}

/// Payload for registering a product with the ledger.
#[derive(Debug, Clone)]
pub struct StockCreate {
    pub available: u32,
}

/// Absolute quantity write, applied conditionally on the version it was computed from.
#[derive(Debug, Clone)]
pub struct StockPatch {
    pub available: u32,
}
