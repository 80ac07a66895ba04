//! Order confirmation delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use tokio::sync::{Mutex, Notify};

use crate::error::NotifyError;

/// Sends order confirmations to customers.
///
/// Called after an order is durably stored. Failures are reported to the
/// caller but never undo the order.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(&self, email: &str, order: &Order)
    -> Result<(), NotifyError>;
}

/// Notifier that writes confirmations to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &Order,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            %email,
            order_id = %order.id(),
            total = %order.total(),
            items = order.item_count(),
            "order confirmation sent"
        );
        Ok(())
    }
}

/// A confirmation recorded by [`InMemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub email: String,
    pub order_id: OrderId,
}

#[derive(Debug, Default)]
struct NotifierLog {
    delivered: Vec<Delivery>,
    attempts: usize,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    log: Arc<Mutex<NotifierLog>>,
    fail: Arc<AtomicBool>,
    attempted: Arc<Notify>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the confirmations delivered so far.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.log.lock().await.delivered.clone()
    }

    /// Returns the number of send attempts, failed ones included.
    pub async fn attempts(&self) -> usize {
        self.log.lock().await.attempts
    }

    /// Waits until at least `count` sends have been attempted.
    pub async fn wait_for_attempts(&self, count: usize) {
        loop {
            let attempted = self.attempted.notified();
            if self.attempts().await >= count {
                return;
            }
            attempted.await;
        }
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &Order,
    ) -> Result<(), NotifyError> {
        let result = {
            let mut log = self.log.lock().await;
            log.attempts += 1;
            if self.fail.load(Ordering::SeqCst) {
                Err(NotifyError::Delivery("mail relay unreachable".to_string()))
            } else {
                log.delivered.push(Delivery {
                    email: email.to_string(),
                    order_id: order.id(),
                });
                Ok(())
            }
        };
        self.attempted.notify_waiters();
        result
    }
}
