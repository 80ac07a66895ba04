//! Checkout error types.

use common::ProductId;
use domain::OrderError;
use serde::Serialize;
use store::StoreError;
use thiserror::Error;

/// Stable, client-visible category of a checkout failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidInput,
    ItemUnavailable,
    PersistenceFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::ItemUnavailable => "ItemUnavailable",
            ErrorKind::PersistenceFailure => "PersistenceFailure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`ReservationEngine::place_order`].
///
/// [`ReservationEngine::place_order`]: crate::ReservationEngine::place_order
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request was rejected before any store access.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] OrderError),

    /// A cart line could not be reserved. Every other line reserved by the
    /// same request has been released again.
    #[error("Product {product_id} is no longer available")]
    ItemUnavailable { product_id: ProductId },

    /// The store failed. No order exists for this request.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}

impl CheckoutError {
    pub fn unavailable(product_id: impl Into<ProductId>) -> Self {
        CheckoutError::ItemUnavailable {
            product_id: product_id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::InvalidInput(_) => ErrorKind::InvalidInput,
            CheckoutError::ItemUnavailable { .. } => ErrorKind::ItemUnavailable,
            CheckoutError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
        }
    }

    /// Returns true if the same request may succeed when submitted again.
    pub fn is_retriable(&self) -> bool {
        self.kind() == ErrorKind::PersistenceFailure
    }

    /// The product that failed, for `ItemUnavailable`.
    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            CheckoutError::ItemUnavailable { product_id } => Some(product_id),
            _ => None,
        }
    }

    /// Message suitable for showing to the shopper.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::InvalidInput(err) => err.to_string(),
            CheckoutError::ItemUnavailable { .. } => {
                "This item is no longer available, please update your cart".to_string()
            }
            CheckoutError::PersistenceFailure(_) => {
                "We could not place your order, please try again".to_string()
            }
        }
    }
}

/// Errors raised by notification collaborators.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Customer lookup failed: {0}")]
    Lookup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_retriability() {
        let invalid = CheckoutError::from(OrderError::EmptyCart);
        assert_eq!(invalid.kind(), ErrorKind::InvalidInput);
        assert!(!invalid.is_retriable());

        let unavailable = CheckoutError::unavailable("P2");
        assert_eq!(unavailable.kind(), ErrorKind::ItemUnavailable);
        assert!(!unavailable.is_retriable());
        assert_eq!(unavailable.product_id().map(|p| p.as_str()), Some("P2"));

        let persistence = CheckoutError::from(StoreError::WriteFailed("disk".to_string()));
        assert_eq!(persistence.kind(), ErrorKind::PersistenceFailure);
        assert!(persistence.is_retriable());
        assert!(persistence.product_id().is_none());
    }

    #[test]
    fn test_kind_serializes_as_stable_name() {
        let value = serde_json::to_value(ErrorKind::ItemUnavailable).unwrap();
        assert_eq!(value, "ItemUnavailable");
        assert_eq!(ErrorKind::PersistenceFailure.to_string(), "PersistenceFailure");
    }

    #[test]
    fn test_user_messages() {
        assert!(
            CheckoutError::unavailable("P1")
                .user_message()
                .contains("no longer available")
        );
        assert!(
            CheckoutError::from(StoreError::TransactionsUnsupported)
                .user_message()
                .contains("try again")
        );
    }
}
