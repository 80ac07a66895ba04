use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId};
use domain::{Money, Order, Product};

use crate::Result;

/// What a store backend can do, decided once when the handle is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// True if [`TransactionalStore::begin`] can be used.
    pub supports_transactions: bool,
}

impl StoreCapabilities {
    pub fn transactional() -> Self {
        Self {
            supports_transactions: true,
        }
    }

    pub fn single_document() -> Self {
        Self {
            supports_transactions: false,
        }
    }
}

/// One unit of stock taken from a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    /// Authoritative unit price read in the same atomic step.
    pub price: Money,
    /// Stock left after the decrement.
    pub remaining_stock: u32,
}

impl Reservation {
    /// Returns true if this reservation took the last unit.
    pub fn took_last_unit(&self) -> bool {
        self.remaining_stock == 0
    }
}

/// Single-document inventory operations.
///
/// Every method is atomic on its own; none of them needs a transaction.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Decrements stock by one if and only if stock is currently above zero.
    ///
    /// The condition and the decrement are a single atomic step. Listing
    /// status is not consulted and not written; see [`ProductStore::mark_sold`].
    /// Returns `None` when no unit could be taken (sold out or missing).
    async fn reserve_one(&self, product_id: &ProductId) -> Result<Option<Reservation>>;

    /// Sets status to sold if stock is zero. A no-op otherwise.
    async fn mark_sold(&self, product_id: &ProductId) -> Result<()>;

    /// Returns one unit to stock and relists the product.
    ///
    /// Used only to compensate a reservation made earlier by the caller.
    async fn release_one(&self, product_id: &ProductId) -> Result<()>;

    /// Reads a product.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Inserts or replaces a product. Entry point for seeding and restocking.
    async fn put_product(&self, product: Product) -> Result<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order as a single document.
    async fn create_order(&self, order: &Order) -> Result<OrderId>;

    /// Reads an order by ID.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a customer's orders, newest first.
    async fn orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>>;
}

/// Multi-document, all-or-nothing unit of work.
///
/// Writes become visible to other callers only after [`commit`]. Dropping
/// the transaction without committing discards every write.
///
/// [`commit`]: StoreTransaction::commit
#[async_trait]
pub trait StoreTransaction: Send {
    /// Reserves one unit of a product that has stock and is listed
    /// available, marking it sold when the last unit goes.
    async fn reserve_one(&mut self, product_id: &ProductId) -> Result<Option<Reservation>>;

    /// Inserts an order as part of this transaction.
    async fn create_order(&mut self, order: &Order) -> Result<OrderId>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Stores that may be able to open a [`StoreTransaction`].
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Returns the capabilities detected when the store was built.
    fn capabilities(&self) -> StoreCapabilities;

    /// Opens a transaction.
    ///
    /// Fails with [`StoreError::TransactionsUnsupported`] when
    /// `capabilities().supports_transactions` is false.
    ///
    /// [`StoreError::TransactionsUnsupported`]: crate::StoreError::TransactionsUnsupported
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Everything checkout needs from a store handle.
pub trait CheckoutStore: ProductStore + OrderStore + TransactionalStore {}

impl<T: ProductStore + OrderStore + TransactionalStore + ?Sized> CheckoutStore for T {}
