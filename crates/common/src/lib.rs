//! Identifier types shared by every layer of the checkout system.

pub mod types;

pub use types::{CustomerId, OrderId, ProductId};
