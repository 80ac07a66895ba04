//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

use super::OrderError;
use crate::ProductId;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Shipping address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl Address {
    /// Creates an address with the required fields.
    pub fn new(
        line1: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            line1: line1.into(),
            line2: None,
            city: city.into(),
            country: country.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Checks that every required field is populated.
    ///
    /// Reports the first blank field in declaration order.
    pub fn validate(&self) -> Result<(), OrderError> {
        let required = [
            ("line1", &self.line1),
            ("city", &self.city),
            ("country", &self.country),
            ("postal_code", &self.postal_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OrderError::MissingAddressField { field });
            }
        }
        Ok(())
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Upi,
    Card,
    Offline,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment method plus the UPI handle when paying by UPI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
}

impl PaymentDetails {
    /// Creates payment details, discarding a UPI handle for non-UPI methods.
    pub fn new(method: PaymentMethod, upi_id: Option<String>) -> Self {
        let upi_id = match method {
            PaymentMethod::Upi => upi_id.map(|id| id.trim().to_string()),
            PaymentMethod::Card | PaymentMethod::Offline => None,
        };
        Self { method, upi_id }
    }

    pub fn card() -> Self {
        Self::new(PaymentMethod::Card, None)
    }

    pub fn upi(upi_id: impl Into<String>) -> Self {
        Self::new(PaymentMethod::Upi, Some(upi_id.into()))
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        if self.method == PaymentMethod::Upi
            && self.upi_id.as_deref().is_none_or(|id| id.trim().is_empty())
        {
            return Err(OrderError::UpiIdRequired);
        }
        Ok(())
    }
}

/// A purchased line with its price snapshot.
///
/// The price is captured from the product store at reservation time and
/// never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub price: Money,
}

impl OrderItem {
    pub fn new(product_id: impl Into<ProductId>, price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 1]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 351);

        let empty: Money = std::iter::empty().sum();
        assert_eq!(empty, Money::zero());
    }

    #[test]
    fn test_address_requires_all_fields() {
        let address = Address::new("12 Gallery Road", "Pune", "IN", "411001");
        assert!(address.validate().is_ok());

        let mut missing_city = address.clone();
        missing_city.city = "  ".to_string();
        assert!(matches!(
            missing_city.validate(),
            Err(OrderError::MissingAddressField { field: "city" })
        ));

        let mut missing_postal = address;
        missing_postal.postal_code = String::new();
        assert!(matches!(
            missing_postal.validate(),
            Err(OrderError::MissingAddressField {
                field: "postal_code"
            })
        ));
    }

    #[test]
    fn test_address_line2_is_optional() {
        let json = r#"{"line1":"1 Main St","city":"Goa","country":"IN","postal_code":"403001"}"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.line2, None);
        assert!(address.validate().is_ok());
    }

    #[test]
    fn test_upi_requires_handle() {
        assert!(PaymentDetails::upi("buyer@bank").validate().is_ok());
        assert!(matches!(
            PaymentDetails::new(PaymentMethod::Upi, None).validate(),
            Err(OrderError::UpiIdRequired)
        ));
        assert!(matches!(
            PaymentDetails::upi("   ").validate(),
            Err(OrderError::UpiIdRequired)
        ));
    }

    #[test]
    fn test_upi_handle_dropped_for_card() {
        let details = PaymentDetails::new(PaymentMethod::Card, Some("buyer@bank".into()));
        assert_eq!(details.upi_id, None);
        assert!(details.validate().is_ok());
    }

    #[test]
    fn test_payment_method_serialization() {
        let json = serde_json::to_string(&PaymentMethod::Offline).unwrap();
        assert_eq!(json, "\"offline\"");
        let method: PaymentMethod = serde_json::from_str("\"upi\"").unwrap();
        assert_eq!(method, PaymentMethod::Upi);
    }
}
