//! Orders and the checkout command.

mod commands;
mod record;
mod state;
pub mod timeline;
mod value_objects;

pub use commands::{CartLine, PlaceOrder};
pub use record::Order;
pub use state::OrderStatus;
pub use timeline::{Timeline, TimelineEntry};
pub use value_objects::{Address, Money, OrderItem, PaymentDetails, PaymentMethod};

use thiserror::Error;

/// Validation errors for a checkout request.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Customer ID is required.
    #[error("Customer ID is required")]
    CustomerIdRequired,

    /// Cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line has no product ID.
    #[error("Cart line {line} has no product ID")]
    InvalidProductId { line: usize },

    /// A required address field is blank.
    #[error("Address field '{field}' is required")]
    MissingAddressField { field: &'static str },

    /// UPI payment chosen without a UPI ID.
    #[error("UPI ID is required for UPI payments")]
    UpiIdRequired,
}
