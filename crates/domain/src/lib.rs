//! Domain layer for the storefront checkout system.
//!
//! This crate provides the pure (storage-free) model of checkout:
//! - Product inventory state with its availability rules
//! - Order records with an append-only status timeline
//! - The `PlaceOrder` command, its validation and order assembly

pub mod order;
pub mod product;

pub use common::{CustomerId, OrderId, ProductId};
pub use order::{
    Address, CartLine, Money, Order, OrderError, OrderItem, OrderStatus, PaymentDetails,
    PaymentMethod, PlaceOrder, Timeline, TimelineEntry,
};
pub use product::{Product, ProductError, ProductStatus};
