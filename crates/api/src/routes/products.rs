//! Product availability endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use serde::Serialize;
use store::CheckoutStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub title: String,
    pub price_cents: i64,
    pub stock: u32,
    pub status: String,
    /// True when a unit can be bought right now. Decided by stock alone.
    pub available: bool,
}

/// GET /products/{id}: current stock and listing status.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .engine
        .store()
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(ProductResponse {
        available: product.has_stock(),
        id: product.id.to_string(),
        title: product.title,
        price_cents: product.price.cents(),
        stock: product.stock,
        status: product.status.to_string(),
    }))
}
