//! Per-product stock records backing the inventory ledger.

mod actions;
pub mod entity;

pub use actions::*;
