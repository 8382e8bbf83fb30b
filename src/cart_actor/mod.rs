//! Customer carts, one record per customer id.

mod actions;
pub mod entity;

pub use actions::*;
