//! Persistence for products and orders.
//!
//! Two backends implement the same traits:
//! - [`InMemoryStore`] for tests and single-process deployments
//! - [`PostgresStore`] for production
//!
//! Each backend reports at construction time whether it can run
//! multi-document transactions ([`StoreCapabilities`]); callers branch on
//! that flag instead of probing with failing writes.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::{PostgresStore, PostgresStoreOptions};
pub use store::{
    CheckoutStore, OrderStore, ProductStore, Reservation, StoreCapabilities, StoreTransaction,
    TransactionalStore,
};
