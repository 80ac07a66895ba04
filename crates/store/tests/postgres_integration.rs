//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{CustomerId, OrderId, ProductId};
use domain::{Address, Money, Order, OrderItem, PaymentDetails, Product, ProductStatus};
use sqlx::PgPool;
use store::{
    OrderStore, PostgresStore, PostgresStoreOptions, ProductStore, StoreError, TransactionalStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_products_and_orders.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store(options: PostgresStoreOptions) -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products, orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::connect(pool, options).await.unwrap()
}

fn artwork(id: &str, stock: u32) -> Product {
    Product::new(id, format!("Artwork {id}"), Money::from_cents(25_000), stock)
}

fn order_for(customer: &str, product: &str) -> Order {
    order_at(customer, product, Utc::now())
}

fn order_at(customer: &str, product: &str, at: DateTime<Utc>) -> Order {
    Order::place(
        OrderId::new(),
        CustomerId::new(customer),
        vec![OrderItem::new(product, Money::from_cents(25_000))],
        Address::new("12 Gallery Road", "Pune", "IN", "411001"),
        PaymentDetails::upi("buyer@bank"),
        at,
    )
}

async fn product(store: &PostgresStore, id: &str) -> Product {
    store
        .get_product(&ProductId::new(id))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn detects_transaction_support() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    assert!(store.capabilities().supports_transactions);

    let forced = get_test_store(PostgresStoreOptions {
        allow_transactions: false,
    })
    .await;
    assert!(!forced.capabilities().supports_transactions);
    assert!(matches!(
        forced.begin().await,
        Err(StoreError::TransactionsUnsupported)
    ));
}

#[tokio::test]
async fn put_and_get_product() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 2)).await.unwrap();

    let loaded = product(&store, "P1").await;
    assert_eq!(loaded, artwork("P1", 2));

    assert!(
        store
            .get_product(&ProductId::new("missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn single_document_reserve_and_mark_sold() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 1)).await.unwrap();
    let id = ProductId::new("P1");

    let reservation = store.reserve_one(&id).await.unwrap().unwrap();
    assert_eq!(reservation.price, Money::from_cents(25_000));
    assert!(reservation.took_last_unit());
    assert_eq!(product(&store, "P1").await.status, ProductStatus::Available);

    assert!(store.reserve_one(&id).await.unwrap().is_none());

    store.mark_sold(&id).await.unwrap();
    let sold = product(&store, "P1").await;
    assert_eq!(sold.stock, 0);
    assert_eq!(sold.status, ProductStatus::Sold);
}

#[tokio::test]
async fn release_restores_stock() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 1)).await.unwrap();
    let id = ProductId::new("P1");

    store.reserve_one(&id).await.unwrap().unwrap();
    store.mark_sold(&id).await.unwrap();
    store.release_one(&id).await.unwrap();

    let restored = product(&store, "P1").await;
    assert_eq!(restored.stock, 1);
    assert_eq!(restored.status, ProductStatus::Available);

    assert!(matches!(
        store.release_one(&ProductId::new("ghost")).await,
        Err(StoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn transaction_commit_is_atomic() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 1)).await.unwrap();
    let order = order_for("cust-1", "P1");

    let mut tx = store.begin().await.unwrap();
    let reservation = tx.reserve_one(&ProductId::new("P1")).await.unwrap().unwrap();
    assert!(reservation.took_last_unit());
    tx.create_order(&order).await.unwrap();
    tx.commit().await.unwrap();

    let sold = product(&store, "P1").await;
    assert_eq!(sold.stock, 0);
    assert_eq!(sold.status, ProductStatus::Sold);
    assert_eq!(store.get_order(order.id()).await.unwrap(), Some(order));
}

#[tokio::test]
async fn transaction_rollback_discards_everything() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 1)).await.unwrap();
    let order = order_for("cust-1", "P1");

    let mut tx = store.begin().await.unwrap();
    tx.reserve_one(&ProductId::new("P1")).await.unwrap().unwrap();
    tx.create_order(&order).await.unwrap();
    tx.rollback().await.unwrap();

    let untouched = product(&store, "P1").await;
    assert_eq!(untouched.stock, 1);
    assert_eq!(untouched.status, ProductStatus::Available);
    assert!(store.get_order(order.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn transaction_skips_stale_available_status() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 1)).await.unwrap();
    // Single-document reserve without the follow-up `mark_sold`.
    store.reserve_one(&ProductId::new("P1")).await.unwrap().unwrap();
    assert_eq!(product(&store, "P1").await.status, ProductStatus::Available);

    let mut tx = store.begin().await.unwrap();
    assert!(tx.reserve_one(&ProductId::new("P1")).await.unwrap().is_none());
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn put_product_rejects_contradictory_status() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    let mut delisted = artwork("P1", 2);
    delisted.status = ProductStatus::Sold;

    assert!(matches!(
        store.put_product(delisted).await,
        Err(StoreError::InvalidProduct(_))
    ));
    assert!(store.get_product(&ProductId::new("P1")).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_single_document_reservations_never_oversell() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    store.put_product(artwork("P1", 2)).await.unwrap();

    let attempts = (0..8).map(|_| {
        let store = store.clone();
        async move { store.reserve_one(&ProductId::new("P1")).await }
    });
    let results = futures_util::future::join_all(attempts).await;

    let won = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();
    assert_eq!(won, 2);
    assert_eq!(product(&store, "P1").await.stock, 0);
}

#[tokio::test]
async fn orders_for_customer_newest_first() {
    let store = get_test_store(PostgresStoreOptions::default()).await;
    let now = Utc::now();
    let first = order_at("cust-1", "P1", now - Duration::minutes(10));
    let second = order_at("cust-1", "P2", now);

    store.create_order(&first).await.unwrap();
    store.create_order(&second).await.unwrap();
    store.create_order(&order_for("cust-2", "P3")).await.unwrap();

    let orders = store
        .orders_for_customer(&CustomerId::new("cust-1"))
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id(), second.id());
    assert_eq!(orders[1].id(), first.id());
}
