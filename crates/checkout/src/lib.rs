//! Checkout: turning a cart into an order.
//!
//! [`ReservationEngine`] reserves one unit of stock per cart line and creates
//! the order only if every line was reserved. It runs one of two paths,
//! chosen once from the injected store's capabilities:
//! 1. Transactional: reservations and the order insert commit together
//! 2. Compensating: each reservation is a standalone conditional decrement,
//!    and reserved units are released again if a later step fails
//!
//! After an order is stored, a confirmation is sent in the background
//! through a [`Notifier`]. Notification failures are logged and counted,
//! never returned.

pub mod engine;
pub mod error;
pub mod services;

pub use engine::{CheckoutPath, ReservationEngine};
pub use error::{CheckoutError, ErrorKind, NotifyError};
pub use services::{
    CustomerDirectory, Delivery, InMemoryCustomerDirectory, InMemoryNotifier, LogNotifier,
    Notifier,
};
