pub mod cart;
pub mod catalog;
pub mod order;
pub mod pricing;
pub mod status;
pub mod stock;

pub use cart::*;
pub use catalog::*;
pub use order::*;
pub use pricing::*;
pub use status::*;
pub use stock::*;
