//! Typed clients over the store actors, plus the order lifecycle controller.

#[macro_use]
mod macros;

pub mod cart_store;
pub mod inventory_ledger;
pub mod order_client;

pub use cart_store::CartStore;
pub use inventory_ledger::InventoryLedger;
pub use order_client::OrderClient;
