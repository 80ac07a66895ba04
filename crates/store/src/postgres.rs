use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId};
use domain::{Money, Order, Product};
use sqlx::{PgExecutor, PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{
        OrderStore, ProductStore, Reservation, StoreCapabilities, StoreTransaction,
        TransactionalStore,
    },
};

/// Options for building a [`PostgresStore`].
#[derive(Debug, Clone)]
pub struct PostgresStoreOptions {
    /// When false, transactions are never used even if the server offers
    /// them.
    pub allow_transactions: bool,
}

impl Default for PostgresStoreOptions {
    fn default() -> Self {
        Self {
            allow_transactions: true,
        }
    }
}

/// PostgreSQL-backed product and order store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    capabilities: StoreCapabilities,
}

impl PostgresStore {
    /// Builds a store over an existing pool, detecting transaction support.
    ///
    /// The probe runs once here; the result is fixed for the lifetime of the
    /// handle.
    #[tracing::instrument(skip(pool))]
    pub async fn connect(pool: PgPool, options: PostgresStoreOptions) -> Result<Self> {
        let supports_transactions =
            options.allow_transactions && probe_transactions(&pool).await?;
        let capabilities = StoreCapabilities {
            supports_transactions,
        };
        tracing::info!(supports_transactions, "postgres store ready");
        Ok(Self { pool, capabilities })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Opens and rolls back an empty transaction.
async fn probe_transactions(pool: &PgPool) -> Result<bool> {
    match pool.begin().await {
        Ok(tx) => {
            tx.rollback().await?;
            Ok(true)
        }
        Err(sqlx::Error::Database(err)) => {
            tracing::warn!(
                error = %err,
                "transaction probe rejected, using single-document writes"
            );
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn row_to_product(row: PgRow) -> Result<Product> {
    let id = ProductId::new(row.try_get::<String, _>("id")?);
    let status: String = row.try_get("status")?;
    let stock = decode_stock(&id, row.try_get("stock")?)?;
    Ok(Product {
        title: row.try_get("title")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock,
        status: status.parse()?,
        id,
    })
}

fn row_to_reservation(product_id: &ProductId, row: PgRow) -> Result<Reservation> {
    Ok(Reservation {
        product_id: product_id.clone(),
        price: Money::from_cents(row.try_get("price_cents")?),
        remaining_stock: decode_stock(product_id, row.try_get("stock")?)?,
    })
}

fn decode_stock(product_id: &ProductId, stock: i32) -> Result<u32> {
    u32::try_from(stock).map_err(|_| {
        StoreError::InvalidProduct(domain::ProductError::InvalidStock {
            product_id: product_id.clone(),
            stock: i64::from(stock),
        })
    })
}

async fn insert_order<'e, E: PgExecutor<'e>>(executor: E, order: &Order) -> Result<OrderId> {
    let document = serde_json::to_value(order)?;
    sqlx::query(
        r#"
        INSERT INTO orders (id, customer_id, status, total_cents, created_at, document)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.customer_id().as_str())
    .bind(order.status().as_str())
    .bind(order.total().cents())
    .bind(order.created_at())
    .bind(document)
    .execute(executor)
    .await?;

    Ok(order.id())
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let document: serde_json::Value = row.try_get("document")?;
    Ok(serde_json::from_value(document)?)
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[tracing::instrument(skip(self, product_id), fields(%product_id))]
    async fn reserve_one(&self, product_id: &ProductId) -> Result<Option<Reservation>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - 1, updated_at = now()
            WHERE id = $1 AND stock > 0
            RETURNING price_cents, stock
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_reservation(product_id, row))
            .transpose()
    }

    #[tracing::instrument(skip(self, product_id), fields(%product_id))]
    async fn mark_sold(&self, product_id: &ProductId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET status = 'sold', updated_at = now()
            WHERE id = $1 AND stock = 0
            "#,
        )
        .bind(product_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, product_id), fields(%product_id))]
    async fn release_one(&self, product_id: &ProductId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + 1, status = 'available', updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product_id.clone()));
        }
        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, price_cents, stock, status
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_product).transpose()
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        product.check_status()?;
        let stock = i32::try_from(product.stock).map_err(|_| {
            StoreError::WriteFailed(format!("stock out of range for {}", product.id))
        })?;

        sqlx::query(
            r#"
            INSERT INTO products (id, title, price_cents, stock, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                status = EXCLUDED.status,
                updated_at = now()
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.title)
        .bind(product.price.cents())
        .bind(stock)
        .bind(product.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn create_order(&self, order: &Order) -> Result<OrderId> {
        insert_order(&self.pool, order).await
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_order).transpose()
    }

    async fn orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        if !self.capabilities.supports_transactions {
            return Err(StoreError::TransactionsUnsupported);
        }
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// Transaction over [`PostgresStore`].
///
/// Dropping it without committing rolls back.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    #[tracing::instrument(skip(self, product_id), fields(%product_id))]
    async fn reserve_one(&mut self, product_id: &ProductId) -> Result<Option<Reservation>> {
        // The row lock taken by UPDATE makes a concurrent transaction
        // re-check the WHERE clause against the committed stock.
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - 1,
                status = CASE WHEN stock - 1 = 0 THEN 'sold' ELSE status END,
                updated_at = now()
            WHERE id = $1 AND stock > 0 AND status = 'available'
            RETURNING price_cents, stock
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_reservation(product_id, row))
            .transpose()
    }

    async fn create_order(&mut self, order: &Order) -> Result<OrderId> {
        insert_order(&mut *self.tx, order).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
