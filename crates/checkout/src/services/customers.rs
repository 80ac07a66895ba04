//! Customer contact lookup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CustomerId;
use tokio::sync::RwLock;

use crate::error::NotifyError;

/// Resolves where a customer wants order notifications sent.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Returns the customer's email address, or `None` if none is on file.
    async fn notification_address(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<String>, NotifyError>;
}

/// In-memory customer directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    emails: Arc<RwLock<HashMap<CustomerId, String>>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a customer's email address.
    pub async fn insert(&self, customer_id: impl Into<CustomerId>, email: impl Into<String>) {
        self.emails
            .write()
            .await
            .insert(customer_id.into(), email.into());
    }

    pub async fn len(&self) -> usize {
        self.emails.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.emails.read().await.is_empty()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn notification_address(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<String>, NotifyError> {
        Ok(self.emails.read().await.get(customer_id).cloned())
    }
}
