//! Collaborators the engine calls after an order is placed.

pub mod customers;
pub mod notifier;

pub use customers::{CustomerDirectory, InMemoryCustomerDirectory};
pub use notifier::{Delivery, InMemoryNotifier, LogNotifier, Notifier};
