//! Line items held by the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LineItemId, Price, ProductId};

/// Why shopper input for a line item was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineItemError {
    /// Quantity outside `1..=LineItem::MAX_QUANTITY`.
    #[error("quantity must be between 1 and {max} (got {0})", max = LineItem::MAX_QUANTITY)]
    Quantity(i64),
    /// Unit price above `LineItem::MAX_UNIT_PRICE`.
    #[error("price must be at most {max} (got {0})", max = LineItem::MAX_UNIT_PRICE)]
    Price(Decimal),
}

/// One row in the cart: a product variant already resolved to a unit price.
///
/// Display fields and the price are copied when the item is added. The cart
/// never looks them up again, so a later catalog change does not re-price it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Identifies the (product, size, color) combination. Unique within a cart.
    pub id: LineItemId,
    /// The underlying product. Several lines may share it.
    pub product_id: ProductId,
    /// Display name captured at add time.
    pub name: String,
    /// Unit price captured at add time.
    pub price: Price,
    /// Display image URL captured at add time.
    pub image: String,
    /// Size selector.
    pub size: String,
    /// Color selector.
    pub color: String,
    /// Number of units. Expected to be at least 1.
    pub quantity: i64,
}

impl LineItem {
    /// Largest quantity accepted from shopper input in one request.
    pub const MAX_QUANTITY: i64 = 10_000;

    /// Largest unit price accepted from shopper input.
    pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

    /// Unit price multiplied by quantity, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.line_total(self.quantity)
    }

    /// Check a quantity supplied by a shopper.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError::Quantity`] outside `1..=MAX_QUANTITY`.
    pub fn check_quantity(quantity: i64) -> Result<(), LineItemError> {
        if !(1..=Self::MAX_QUANTITY).contains(&quantity) {
            return Err(LineItemError::Quantity(quantity));
        }
        Ok(())
    }

    /// Check an item supplied by a shopper before it reaches the cart.
    ///
    /// The cart accepts any item; hosts call this at their input boundary
    /// so that totals stay far from `Decimal` and `i64` limits.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError`] if the quantity or unit price is out of range.
    pub fn check_bounds(&self) -> Result<(), LineItemError> {
        Self::check_quantity(self.quantity)?;
        if self.price.amount() > Self::MAX_UNIT_PRICE {
            return Err(LineItemError::Price(self.price.amount()));
        }
        Ok(())
    }
}
