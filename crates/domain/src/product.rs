//! Product inventory state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Money, ProductId};

/// Errors raised when decoding product state.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Status string not recognised.
    #[error("Unknown product status: {0}")]
    UnknownStatus(String),

    /// Stored stock value is negative.
    #[error("Invalid stock for {product_id}: {stock}")]
    InvalidStock { product_id: ProductId, stock: i64 },

    /// Status is `sold` with stock left, or `available` with none.
    #[error("Status {status} does not match stock {stock} for {product_id}")]
    StatusMismatch {
        product_id: ProductId,
        stock: u32,
        status: ProductStatus,
    },
}

/// Listing status of a product.
///
/// `Sold` should only ever be observed together with `stock == 0`. The
/// reverse does not hold: a product may briefly show `Available` with no
/// stock left, so stock is the primary availability signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Available,
    Sold,
}

impl ProductStatus {
    /// Returns the status name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Sold => "sold",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "sold" => Ok(ProductStatus::Sold),
            other => Err(ProductError::UnknownStatus(other.to_string())),
        }
    }
}

/// A sellable item and its inventory counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Authoritative unit price.
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub status: ProductStatus,
}

impl Product {
    /// Creates a product whose status is derived from its stock.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            stock,
            status: if stock == 0 {
                ProductStatus::Sold
            } else {
                ProductStatus::Available
            },
        }
    }

    /// Returns true if at least one unit can still be reserved.
    pub fn has_stock(&self) -> bool {
        self.stock > 0
    }

    /// Checks that the status is `sold` exactly when no stock is left.
    pub fn check_status(&self) -> Result<(), ProductError> {
        if (self.status == ProductStatus::Sold) == self.has_stock() {
            return Err(ProductError::StatusMismatch {
                product_id: self.id.clone(),
                stock: self.stock,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Returns true if the product has stock and is listed as available.
    pub fn is_listed_available(&self) -> bool {
        self.has_stock() && self.status == ProductStatus::Available
    }

    /// Decrements stock by one if any is left, returning the remaining count.
    ///
    /// Status is left untouched; see [`Product::mark_sold_if_empty`].
    pub fn take_one(&mut self) -> Option<u32> {
        if self.stock == 0 {
            return None;
        }
        self.stock -= 1;
        Some(self.stock)
    }

    /// Sets status to `Sold` when no stock is left. Returns true if it did.
    pub fn mark_sold_if_empty(&mut self) -> bool {
        if self.stock == 0 {
            self.status = ProductStatus::Sold;
            true
        } else {
            false
        }
    }

    /// Decrements stock and updates status in one step.
    pub fn reserve_one(&mut self) -> Option<u32> {
        let remaining = self.take_one()?;
        self.mark_sold_if_empty();
        Some(remaining)
    }

    /// Returns one previously reserved unit and relists the product.
    pub fn restore_one(&mut self) {
        self.stock = self.stock.saturating_add(1);
        self.status = ProductStatus::Available;
    }
}
