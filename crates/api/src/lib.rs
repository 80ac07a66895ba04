//! HTTP API server for storefront checkout.
//!
//! Provides REST endpoints for placing orders and reading orders and
//! product availability, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{InMemoryCustomerDirectory, LogNotifier, ReservationEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use store::CheckoutStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Engine type served by the API.
pub type Engine<S> = ReservationEngine<S, LogNotifier, InMemoryCustomerDirectory>;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub engine: Engine<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CheckoutStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/checkout", post(routes::checkout::place::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/customers/{id}/orders",
            get(routes::orders::list_for_customer::<S>),
        )
        .route("/products/{id}", get(routes::products::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over `store` with an empty customer directory
/// and log-based confirmations.
pub fn create_default_state<S: CheckoutStore + 'static>(store: S) -> Arc<AppState<S>> {
    create_state(store, InMemoryCustomerDirectory::new())
}

/// Creates application state over `store` and `customers`.
pub fn create_state<S: CheckoutStore + 'static>(
    store: S,
    customers: InMemoryCustomerDirectory,
) -> Arc<AppState<S>> {
    let engine = ReservationEngine::new(store, LogNotifier, customers);
    Arc::new(AppState { engine })
}
