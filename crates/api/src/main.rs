//! API server entry point.

use api::config::{Config, LogFormat};
use api::seed::SeedData;
use checkout::InMemoryCustomerDirectory;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{CheckoutStore, InMemoryStore, PostgresStore, PostgresStoreOptions};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn describe_metrics() {
    metrics::describe_counter!("checkout_attempts_total", "Checkout requests received");
    metrics::describe_counter!(
        "checkout_orders_placed_total",
        "Orders created, labelled by checkout path"
    );
    metrics::describe_counter!(
        "checkout_failures_total",
        "Rejected or failed checkouts, labelled by error kind"
    );
    metrics::describe_counter!(
        "checkout_compensations_total",
        "Checkouts that released already reserved stock"
    );
    metrics::describe_counter!(
        "checkout_compensation_failures_total",
        "Reserved units that could not be returned to stock"
    );
    metrics::describe_counter!(
        "checkout_notifications_failed_total",
        "Order confirmations that could not be sent"
    );
    metrics::describe_histogram!(
        "checkout_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent placing an order"
    );
}

/// Seeds the store, then serves requests until a shutdown signal arrives.
async fn serve<S: CheckoutStore + 'static>(
    config: &Config,
    store: S,
    metrics_handle: PrometheusHandle,
) {
    let customers = InMemoryCustomerDirectory::new();
    if let Some(path) = &config.seed_file {
        SeedData::load(path)
            .expect("failed to read seed file")
            .apply(&store, &customers)
            .await
            .expect("failed to apply seed data");
    }

    let state = api::create_state(store, customers);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);
    config.warn_ignored();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    describe_metrics();

    // 3. Build the store and serve
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let options = PostgresStoreOptions {
                allow_transactions: config.store_transactions.allows_transactions(),
            };
            let store = PostgresStore::connect(pool, options)
                .await
                .expect("failed to initialize store");
            if config.run_migrations {
                store
                    .run_migrations()
                    .await
                    .expect("failed to run migrations");
            }

            serve(&config, store.clone(), metrics_handle).await;
            store.close().await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            let store = if config.store_transactions.allows_transactions() {
                InMemoryStore::new()
            } else {
                InMemoryStore::without_transactions()
            };
            serve(&config, store, metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
