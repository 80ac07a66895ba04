//! Startup seed data for products and customer contacts.

use std::path::Path;

use checkout::InMemoryCustomerDirectory;
use domain::{Money, Product};
use serde::Deserialize;
use store::{ProductStore, StoreError};
use thiserror::Error;

/// Errors that can occur while loading seed data.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to store seed product: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub customers: Vec<SeedCustomer>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub id: String,
    pub title: String,
    pub price_cents: i64,
    pub stock: u32,
}

/// Status is always derived from stock.
impl From<SeedProduct> for Product {
    fn from(seed: SeedProduct) -> Self {
        Product::new(
            seed.id,
            seed.title,
            Money::from_cents(seed.price_cents),
            seed.stock,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedCustomer {
    pub id: String,
    pub email: String,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Writes every product to `store` and every contact to `directory`.
    pub async fn apply<S: ProductStore>(
        self,
        store: &S,
        directory: &InMemoryCustomerDirectory,
    ) -> Result<(), SeedError> {
        let products = self.products.len();
        let customers = self.customers.len();

        for product in self.products {
            store.put_product(product.into()).await?;
        }
        for customer in self.customers {
            directory.insert(customer.id, customer.email).await;
        }

        tracing::info!(products, customers, "seed data loaded");
        Ok(())
    }
}
