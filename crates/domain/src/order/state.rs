//! Order status.

use serde::{Deserialize, Serialize};

/// The status of an order.
///
/// Checkout only ever creates orders in `PendingPayment`. Later transitions
/// are driven by the back office:
/// ```text
/// PendingPayment ──► Paid ──► Shipped ──► Delivered
///        │            │
///        └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Stock reserved and order recorded, awaiting payment.
    #[default]
    PendingPayment,

    /// Payment confirmed.
    Paid,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PendingPayment",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
