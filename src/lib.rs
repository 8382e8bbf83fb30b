//! Order lifecycle and inventory reservation core of a storefront.
//!
//! Carts, orders and stock levels each live in a [`actor_framework::ResourceActor`].
//! [`clients::OrderClient`] orchestrates checkout, stock commit, payment and
//! cancellation across them; [`app_system::StoreSystem`] starts and stops the lot.

pub mod actor_framework;
pub mod app_system;
pub mod cart_actor;
pub mod clients;
pub mod domain;
pub mod error;
pub mod events;
pub mod order_actor;
pub mod stock_actor;

#[cfg(test)]
mod mock_framework;

pub use error::StoreError;
