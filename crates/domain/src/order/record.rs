//! The persisted order record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, Money, OrderItem, OrderStatus, PaymentDetails, Timeline};
use crate::{CustomerId, OrderId};

/// An order created by checkout.
///
/// Items, prices and total are fixed at creation. Only `status` and the
/// timeline move afterwards, and those transitions belong to the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    address: Address,
    payment: PaymentDetails,
    status: OrderStatus,
    timeline: Timeline,
    total: Money,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new `PendingPayment` order from reserved items.
    ///
    /// The total is summed here once and stored with the record.
    pub fn place(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        address: Address,
        payment: PaymentDetails,
        at: DateTime<Utc>,
    ) -> Self {
        let total = items.iter().map(|item| item.price).sum();
        Self {
            id,
            customer_id,
            items,
            address,
            payment,
            status: OrderStatus::PendingPayment,
            timeline: Timeline::started(at),
            total,
            created_at: at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Returns items in the order the cart listed them.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn payment(&self) -> &PaymentDetails {
        &self.payment
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Returns the total captured at creation.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
