//! Order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{Address, Order};
use serde::Serialize;
use store::CheckoutStore;

use crate::AppState;
use crate::error::ApiError;

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub address: Address,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    pub timeline: Vec<TimelineEntryResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct TimelineEntryResponse {
    pub time: DateTime<Utc>,
    pub note: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    price_cents: item.price.cents(),
                })
                .collect(),
            total_cents: order.total().cents(),
            address: order.address().clone(),
            payment_method: order.payment().method.to_string(),
            upi_id: order.payment().upi_id.clone(),
            timeline: order
                .timeline()
                .entries()
                .iter()
                .map(|entry| TimelineEntryResponse {
                    time: entry.time,
                    note: entry.note.clone(),
                })
                .collect(),
            created_at: order.created_at(),
        }
    }
}

// -- Handlers --

/// GET /orders/{id}: load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .engine
        .store()
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /customers/{id}/orders: list a customer's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_customer<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .engine
        .store()
        .orders_for_customer(&CustomerId::new(customer_id))
        .await?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// Parses a string into an [`OrderId`], returning a 400 error on failure.
fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
