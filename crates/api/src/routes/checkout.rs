//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use domain::{Address, CartLine, Money, PaymentDetails, PaymentMethod, PlaceOrder};
use serde::Deserialize;
use store::CheckoutStore;

use super::orders::OrderResponse;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub items: Vec<CartLineRequest>,
    #[serde(default)]
    pub address: AddressRequest,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub upi_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    #[serde(default)]
    pub product_id: String,
    /// Price the storefront displayed. Only compared, never charged.
    #[serde(default)]
    pub client_price_cents: Option<i64>,
}

/// Missing fields default to empty and are rejected by checkout validation.
#[derive(Debug, Default, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

impl From<CheckoutRequest> for PlaceOrder {
    fn from(req: CheckoutRequest) -> Self {
        let lines = req
            .items
            .into_iter()
            .map(|line| CartLine {
                product_id: line.product_id.into(),
                client_price: line.client_price_cents.map(Money::from_cents),
            })
            .collect();
        let address = Address {
            line1: req.address.line1,
            line2: req.address.line2,
            city: req.address.city,
            country: req.address.country,
            postal_code: req.address.postal_code,
        };

        PlaceOrder::new(
            req.customer_id,
            lines,
            address,
            PaymentDetails::new(req.payment_method, req.upi_id),
        )
    }
}

// -- Handlers --

/// POST /checkout: reserve stock for every cart line and create the order.
///
/// Bodies that fail to decode are rejected as invalid input.
#[tracing::instrument(skip(state, payload))]
pub async fn place<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;
    let order = state.engine.place_order(req.into()).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}
