//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use store::CheckoutStore;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Checkout path chosen at startup.
    pub checkout_path: &'static str,
}

/// GET /health: returns system health status.
pub async fn check<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        checkout_path: state.engine.path().as_str(),
    })
}
