//! Type-safe unit price using decimal arithmetic.
//!
//! Prices are captured when an item is added to the cart and never re-priced
//! afterwards, so the cart only needs an amount: currency is a storefront-wide
//! setting, not a per-line property.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative unit price.
///
/// Serialized as a plain JSON number so persisted carts keep the
/// `{ "price": 19.99 }` shape. Deserializing a negative amount fails.
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use shopfront_core::Price;
///
/// let price = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(price.line_total(3), Some(Decimal::new(5997, 2)));
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The amount in the currency's standard unit (e.g., dollars, not cents).
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity, or `None` if the product does not fit
    /// in a `Decimal`.
    #[must_use]
    pub fn line_total(&self, quantity: i64) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_zero() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 0)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_line_total() {
        let price = Price::from_cents(1050).unwrap();
        assert_eq!(price.line_total(4), Some(Decimal::new(42, 0)));
        assert_eq!(price.line_total(0), Some(Decimal::ZERO));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let price = Price::new(Decimal::MAX).unwrap();
        assert_eq!(price.line_total(2), None);
        assert_eq!(price.line_total(1), Some(Decimal::MAX));
    }

    #[test]
    fn test_display() {
        let price = Price::from_cents(1999).unwrap();
        assert_eq!(price.to_string(), "$19.99");
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::new(Decimal::new(255, 1)).unwrap();
        let json = serde_json::to_value(price).unwrap();
        assert!(json.is_number());
        assert!((json.as_f64().unwrap() - 25.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserializes_integer_and_float() {
        let whole: Price = serde_json::from_str("10").unwrap();
        assert_eq!(whole.amount(), Decimal::new(10, 0));

        let fractional: Price = serde_json::from_str("4.25").unwrap();
        assert_eq!(fractional.amount(), Decimal::new(425, 2));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-1.5").is_err());
    }
}
