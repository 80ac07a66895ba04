//! Order placement with stock reservation.

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, ProductId};
use domain::{CartLine, Order, OrderItem, PlaceOrder};
use store::{CheckoutStore, Reservation, StoreTransaction};
use tracing::Instrument;

use crate::error::{CheckoutError, NotifyError};
use crate::services::{CustomerDirectory, Notifier};

/// How an engine commits an order, fixed by the store's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPath {
    /// All reservations and the order insert run in one store transaction.
    Transactional,
    /// Each reservation is its own atomic write, undone explicitly on failure.
    Compensating,
}

impl CheckoutPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutPath::Transactional => "transactional",
            CheckoutPath::Compensating => "compensating",
        }
    }
}

impl std::fmt::Display for CheckoutPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts carts into orders without ever selling a unit twice.
///
/// One unit is reserved per cart line, in cart order. The order is created
/// only when every line was reserved; otherwise no order exists and every
/// unit taken by the request is back in stock before the error is returned.
///
/// Nothing is retried. Callers decide what to do with a retriable error.
pub struct ReservationEngine<S, N, D> {
    store: S,
    notifier: Arc<N>,
    directory: Arc<D>,
    path: CheckoutPath,
}

impl<S, N, D> ReservationEngine<S, N, D>
where
    S: CheckoutStore,
    N: Notifier + 'static,
    D: CustomerDirectory + 'static,
{
    /// Creates an engine over an injected store.
    ///
    /// The execution path is chosen here from the store's capabilities.
    pub fn new(store: S, notifier: N, directory: D) -> Self {
        let path = if store.capabilities().supports_transactions {
            CheckoutPath::Transactional
        } else {
            CheckoutPath::Compensating
        };
        tracing::info!(%path, "reservation engine ready");
        Self {
            store,
            notifier: Arc::new(notifier),
            directory: Arc::new(directory),
            path,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn path(&self) -> CheckoutPath {
        self.path
    }

    /// Places an order for every line of the cart.
    ///
    /// Prices come from the store at reservation time. Client prices are
    /// only compared against them. On success a confirmation is sent in the
    /// background; its outcome never affects the result.
    #[tracing::instrument(
        skip(self, command),
        fields(
            customer_id = %command.customer_id,
            lines = command.lines.len(),
            path = %self.path,
        )
    )]
    pub async fn place_order(&self, command: PlaceOrder) -> Result<Order, CheckoutError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let start = std::time::Instant::now();

        let result = match command.validate() {
            Ok(()) => match self.path {
                CheckoutPath::Transactional => self.place_transactional(&command).await,
                CheckoutPath::Compensating => self.place_with_compensation(&command).await,
            },
            Err(err) => Err(err.into()),
        };
        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("checkout_orders_placed_total", "path" => self.path.as_str())
                    .increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.total(),
                    "order placed"
                );
                self.notify_in_background(order);
            }
            Err(err) => {
                metrics::counter!("checkout_failures_total", "kind" => err.kind().as_str())
                    .increment(1);
                match err {
                    CheckoutError::PersistenceFailure(source) => {
                        tracing::error!(error = %source, "order placement failed");
                    }
                    _ => tracing::info!(kind = %err.kind(), error = %err, "order rejected"),
                }
            }
        }

        result
    }

    async fn place_transactional(&self, command: &PlaceOrder) -> Result<Order, CheckoutError> {
        let mut tx = self.store.begin().await?;

        match self.reserve_and_insert(tx.as_mut(), command).await {
            Ok(order) => {
                tx.commit().await?;
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn reserve_and_insert(
        &self,
        tx: &mut dyn StoreTransaction,
        command: &PlaceOrder,
    ) -> Result<Order, CheckoutError> {
        let mut items = Vec::with_capacity(command.lines.len());
        for line in &command.lines {
            let reservation = tx
                .reserve_one(&line.product_id)
                .await?
                .ok_or_else(|| line_unavailable(line))?;
            items.push(price_line(line, &reservation));
        }

        let order = command.assemble(OrderId::new(), items, Utc::now());
        tx.create_order(&order).await?;
        Ok(order)
    }

    async fn place_with_compensation(&self, command: &PlaceOrder) -> Result<Order, CheckoutError> {
        let mut reserved = Vec::with_capacity(command.lines.len());

        let items = match self.reserve_each(command, &mut reserved).await {
            Ok(items) => items,
            Err(err) => {
                self.compensate(&reserved).await;
                return Err(err);
            }
        };

        let order = command.assemble(OrderId::new(), items, Utc::now());
        if let Err(err) = self.store.create_order(&order).await {
            self.compensate(&reserved).await;
            return Err(err.into());
        }
        Ok(order)
    }

    /// Reserves every line with a standalone conditional decrement.
    ///
    /// `reserved` receives each product as soon as its unit is taken, so it
    /// is complete even when this returns an error.
    async fn reserve_each(
        &self,
        command: &PlaceOrder,
        reserved: &mut Vec<ProductId>,
    ) -> Result<Vec<OrderItem>, CheckoutError> {
        let mut items = Vec::with_capacity(command.lines.len());
        for line in &command.lines {
            let reservation = self
                .store
                .reserve_one(&line.product_id)
                .await?
                .ok_or_else(|| line_unavailable(line))?;
            reserved.push(line.product_id.clone());

            if reservation.took_last_unit() {
                // Best effort: stock, not status, decides availability.
                if let Err(err) = self.store.mark_sold(&line.product_id).await {
                    tracing::warn!(
                        product_id = %line.product_id,
                        error = %err,
                        "could not mark product sold"
                    );
                }
            }
            items.push(price_line(line, &reservation));
        }
        Ok(items)
    }

    /// Returns one unit for each reserved product, in reservation order.
    #[tracing::instrument(skip(self, reserved), fields(units = reserved.len()))]
    async fn compensate(&self, reserved: &[ProductId]) {
        if reserved.is_empty() {
            return;
        }
        metrics::counter!("checkout_compensations_total").increment(1);

        for product_id in reserved {
            if let Err(err) = self.store.release_one(product_id).await {
                metrics::counter!("checkout_compensation_failures_total").increment(1);
                tracing::error!(
                    %product_id,
                    error = %err,
                    "stock under-restored: failed to release reserved unit"
                );
            }
        }
    }

    fn notify_in_background(&self, order: &Order) {
        let notifier = Arc::clone(&self.notifier);
        let directory = Arc::clone(&self.directory);
        let order = order.clone();
        let span = tracing::info_span!("order_confirmation", order_id = %order.id());

        tokio::spawn(
            async move {
                if let Err(err) = send_confirmation(&*notifier, &*directory, &order).await {
                    metrics::counter!("checkout_notifications_failed_total").increment(1);
                    tracing::warn!(error = %err, "order confirmation not sent");
                }
            }
            .instrument(span),
        );
    }
}

async fn send_confirmation<N, D>(
    notifier: &N,
    directory: &D,
    order: &Order,
) -> Result<(), NotifyError>
where
    N: Notifier + ?Sized,
    D: CustomerDirectory + ?Sized,
{
    let Some(email) = directory.notification_address(order.customer_id()).await? else {
        tracing::debug!(customer_id = %order.customer_id(), "no notification address on file");
        return Ok(());
    };
    notifier.send_order_confirmation(&email, order).await
}

fn line_unavailable(line: &CartLine) -> CheckoutError {
    tracing::warn!(product_id = %line.product_id, "cart line unavailable");
    CheckoutError::unavailable(line.product_id.clone())
}

fn price_line(line: &CartLine, reservation: &Reservation) -> OrderItem {
    if let Some(displayed) = line.price_drift(reservation.price) {
        tracing::warn!(
            product_id = %line.product_id,
            %displayed,
            actual = %reservation.price,
            "client price differs from store price"
        );
    }
    OrderItem::new(line.product_id.clone(), reservation.price)
}
