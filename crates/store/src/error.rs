use common::ProductId;
use domain::ProductError;
use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A transaction was requested from a store that cannot run one.
    #[error("Multi-document transactions are not supported by this store")]
    TransactionsUnsupported,

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A write was rejected by the backend.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Stored product data could not be decoded.
    #[error("Invalid product data: {0}")]
    InvalidProduct(#[from] ProductError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
