//! Order records and their status machine.

mod actions;
pub mod entity;

pub use actions::*;
