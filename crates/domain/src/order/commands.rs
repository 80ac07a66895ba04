//! The checkout command and its validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, Money, Order, OrderError, OrderItem, PaymentDetails};
use crate::{CustomerId, OrderId, ProductId};

/// One line of a submitted cart.
///
/// `client_price` is what the storefront displayed. It is advisory only and
/// never used to price the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub client_price: Option<Money>,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, client_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            client_price: Some(client_price),
        }
    }

    /// Returns the client price when it disagrees with the authoritative one.
    pub fn price_drift(&self, actual: Money) -> Option<Money> {
        self.client_price.filter(|displayed| *displayed != actual)
    }
}

/// Command to convert a cart into an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    /// Cart lines, processed in exactly this order.
    pub lines: Vec<CartLine>,
    pub address: Address,
    pub payment: PaymentDetails,
}

impl PlaceOrder {
    pub fn new(
        customer_id: impl Into<CustomerId>,
        lines: Vec<CartLine>,
        address: Address,
        payment: PaymentDetails,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            lines,
            address,
            payment,
        }
    }

    /// Validates the request without touching any store.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.customer_id.is_blank() {
            return Err(OrderError::CustomerIdRequired);
        }
        if self.lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if let Some(index) = self.lines.iter().position(|l| l.product_id.is_blank()) {
            return Err(OrderError::InvalidProductId { line: index });
        }
        self.address.validate()?;
        self.payment.validate()
    }

    /// Assembles the order once every line has been reserved.
    ///
    /// `items` must hold one priced item per cart line, in cart order.
    pub fn assemble(&self, order_id: OrderId, items: Vec<OrderItem>, at: DateTime<Utc>) -> Order {
        debug_assert_eq!(items.len(), self.lines.len());
        Order::place(
            order_id,
            self.customer_id.clone(),
            items,
            self.address.clone(),
            self.payment.clone(),
            at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderStatus, PaymentMethod};

    fn address() -> Address {
        Address::new("12 Gallery Road", "Pune", "IN", "411001")
    }

    fn command(lines: Vec<CartLine>) -> PlaceOrder {
        PlaceOrder::new("cust-1", lines, address(), PaymentDetails::card())
    }

    #[test]
    fn test_valid_command_passes() {
        let cmd = command(vec![CartLine::new("ART-001", Money::from_cents(100))]);
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(
            command(vec![]).validate(),
            Err(OrderError::EmptyCart)
        ));
    }

    #[test]
    fn test_blank_customer_rejected() {
        let mut cmd = command(vec![CartLine::new("ART-001", Money::from_cents(100))]);
        cmd.customer_id = CustomerId::new(" ");
        assert!(matches!(cmd.validate(), Err(OrderError::CustomerIdRequired)));
    }

    #[test]
    fn test_blank_product_reports_line_index() {
        let cmd = command(vec![
            CartLine::new("ART-001", Money::from_cents(100)),
            CartLine::new("", Money::from_cents(100)),
        ]);
        assert!(matches!(
            cmd.validate(),
            Err(OrderError::InvalidProductId { line: 1 })
        ));
    }

    #[test]
    fn test_missing_address_field_rejected() {
        let mut cmd = command(vec![CartLine::new("ART-001", Money::from_cents(100))]);
        cmd.address.country = String::new();
        assert!(matches!(
            cmd.validate(),
            Err(OrderError::MissingAddressField { field: "country" })
        ));
    }

    #[test]
    fn test_upi_without_handle_rejected() {
        let mut cmd = command(vec![CartLine::new("ART-001", Money::from_cents(100))]);
        cmd.payment = PaymentDetails::new(PaymentMethod::Upi, None);
        assert!(matches!(cmd.validate(), Err(OrderError::UpiIdRequired)));
    }

    #[test]
    fn test_price_drift_detection() {
        let line = CartLine::new("ART-001", Money::from_cents(100));
        assert_eq!(line.price_drift(Money::from_cents(100)), None);
        assert_eq!(
            line.price_drift(Money::from_cents(150)),
            Some(Money::from_cents(100))
        );

        let unpriced = CartLine {
            product_id: ProductId::new("ART-001"),
            client_price: None,
        };
        assert_eq!(unpriced.price_drift(Money::from_cents(150)), None);
    }

    #[test]
    fn test_assemble_uses_server_prices() {
        let cmd = command(vec![
            CartLine::new("ART-001", Money::from_cents(1)),
            CartLine::new("ART-002", Money::from_cents(1)),
        ]);
        let order_id = OrderId::new();
        let order = cmd.assemble(
            order_id,
            vec![
                OrderItem::new("ART-001", Money::from_cents(40_000)),
                OrderItem::new("ART-002", Money::from_cents(2_500)),
            ],
            Utc::now(),
        );

        assert_eq!(order.id(), order_id);
        assert_eq!(order.customer_id().as_str(), "cust-1");
        assert_eq!(order.total(), Money::from_cents(42_500));
        assert_eq!(order.status(), OrderStatus::PendingPayment);
    }
}
