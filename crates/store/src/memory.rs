use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId};
use domain::{Order, Product};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Result, StoreError,
    store::{
        OrderStore, ProductStore, Reservation, StoreCapabilities, StoreTransaction,
        TransactionalStore,
    },
};

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

impl Tables {
    fn product_mut(&mut self, product_id: &ProductId) -> Result<&mut Product> {
        self.products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))
    }

    fn insert_order(&mut self, order: &Order) -> Result<OrderId> {
        let order_id = order.id();
        if self.orders.contains_key(&order_id) {
            return Err(duplicate_order(order_id));
        }
        self.orders.insert(order_id, order.clone());
        Ok(order_id)
    }
}

fn duplicate_order(order_id: OrderId) -> StoreError {
    StoreError::WriteFailed(format!("order {order_id} already exists"))
}

#[derive(Debug, Default)]
struct Faults {
    fail_order_inserts: AtomicBool,
    fail_releases: AtomicBool,
    fail_commits: AtomicBool,
    limit_reserves: AtomicBool,
    reserves_left: AtomicUsize,
}

impl Faults {
    fn check_order_insert(&self) -> Result<()> {
        if self.fail_order_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("order insert rejected".to_string()));
        }
        Ok(())
    }

    fn check_reserve(&self) -> Result<()> {
        if !self.limit_reserves.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.reserves_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::WriteFailed("stock reservation rejected".to_string()))
    }

    fn check_commit(&self) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("commit rejected".to_string()));
        }
        Ok(())
    }
}

/// In-memory product and order store.
///
/// Single-document operations take the write lock for the duration of the
/// check and the mutation, which makes them atomic. A transaction holds the
/// write lock from `begin` until it ends, so concurrent transactions are fully
/// serialized. It stages only the products it touches and the orders it
/// inserts, and applies them to the tables on commit.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
    capabilities: StoreCapabilities,
}

impl InMemoryStore {
    /// Creates an empty store that supports transactions.
    pub fn new() -> Self {
        Self {
            tables: Arc::default(),
            faults: Arc::default(),
            capabilities: StoreCapabilities::transactional(),
        }
    }

    /// Creates an empty store that only offers single-document atomicity,
    /// like a standalone database node without transaction support.
    pub fn without_transactions() -> Self {
        Self {
            capabilities: StoreCapabilities::single_document(),
            ..Self::new()
        }
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Makes every subsequent order insert fail.
    pub fn set_fail_on_order_insert(&self, fail: bool) {
        self.faults.fail_order_inserts.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent stock release fail.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.faults.fail_releases.store(fail, Ordering::SeqCst);
    }

    /// Lets `successes` more reservations through, then fails every one
    /// after them. Applies to single-document and transactional reserves.
    pub fn set_fail_on_reserve_after(&self, successes: usize) {
        self.faults.reserves_left.store(successes, Ordering::SeqCst);
        self.faults.limit_reserves.store(true, Ordering::SeqCst);
    }

    /// Makes every subsequent transaction commit fail, discarding its writes.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.faults.fail_commits.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn reserve_one(&self, product_id: &ProductId) -> Result<Option<Reservation>> {
        self.faults.check_reserve()?;
        let mut tables = self.tables.write().await;
        let Some(product) = tables.products.get_mut(product_id) else {
            return Ok(None);
        };
        Ok(product.take_one().map(|remaining_stock| Reservation {
            product_id: product_id.clone(),
            price: product.price,
            remaining_stock,
        }))
    }

    async fn mark_sold(&self, product_id: &ProductId) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.product_mut(product_id)?.mark_sold_if_empty();
        Ok(())
    }

    async fn release_one(&self, product_id: &ProductId) -> Result<()> {
        if self.faults.fail_releases.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("stock release rejected".to_string()));
        }
        let mut tables = self.tables.write().await;
        tables.product_mut(product_id)?.restore_one();
        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(product_id).cloned())
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        product.check_status()?;
        let mut tables = self.tables.write().await;
        tables.products.insert(product.id.clone(), product);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: &Order) -> Result<OrderId> {
        self.faults.check_order_insert()?;
        self.tables.write().await.insert_order(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&order_id).cloned())
    }

    async fn orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.customer_id() == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        if !self.capabilities.supports_transactions {
            return Err(StoreError::TransactionsUnsupported);
        }
        let guard = Arc::clone(&self.tables).write_owned().await;
        Ok(Box::new(InMemoryTransaction {
            guard,
            products: HashMap::new(),
            orders: Vec::new(),
            faults: Arc::clone(&self.faults),
        }))
    }
}

/// Transaction over [`InMemoryStore`].
///
/// `products` holds the staged version of every product touched so far;
/// reads fall through to the locked tables for anything not yet touched.
struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    products: HashMap<ProductId, Product>,
    orders: Vec<Order>,
    faults: Arc<Faults>,
}

impl InMemoryTransaction {
    fn staged_product(&mut self, product_id: &ProductId) -> Option<&mut Product> {
        if !self.products.contains_key(product_id) {
            let current = self.guard.products.get(product_id)?.clone();
            self.products.insert(product_id.clone(), current);
        }
        self.products.get_mut(product_id)
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn reserve_one(&mut self, product_id: &ProductId) -> Result<Option<Reservation>> {
        self.faults.check_reserve()?;
        let Some(product) = self.staged_product(product_id) else {
            return Ok(None);
        };
        if !product.is_listed_available() {
            return Ok(None);
        }
        Ok(product.reserve_one().map(|remaining_stock| Reservation {
            product_id: product_id.clone(),
            price: product.price,
            remaining_stock,
        }))
    }

    async fn create_order(&mut self, order: &Order) -> Result<OrderId> {
        self.faults.check_order_insert()?;
        let order_id = order.id();
        if self.guard.orders.contains_key(&order_id)
            || self.orders.iter().any(|pending| pending.id() == order_id)
        {
            return Err(duplicate_order(order_id));
        }
        self.orders.push(order.clone());
        Ok(order_id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.faults.check_commit()?;
        let InMemoryTransaction {
            mut guard,
            products,
            orders,
            ..
        } = *self;

        guard.products.extend(products);
        for order in orders {
            guard.orders.insert(order.id(), order);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
