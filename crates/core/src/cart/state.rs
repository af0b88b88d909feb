//! In-memory cart state and its transitions.

use rust_decimal::Decimal;

use super::{CartAction, LineItem};
use crate::LineItemId;

/// Line items plus their derived totals.
///
/// Fields are private so the derived values can only change together with the
/// items: every mutating method recomputes `item_count` and `total` before it
/// returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<LineItem>,
    item_count: i64,
    total: Decimal,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub const fn item_count(&self) -> i64 {
        self.item_count
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn get(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Add a line item.
    ///
    /// If a line with the same ID exists, its quantity grows by
    /// `item.quantity` and every other field keeps its original value.
    /// Otherwise the item is appended. Quantities are taken as given.
    ///
    /// An add whose merged quantity or totals would overflow leaves the cart
    /// unchanged.
    pub fn add_item(&mut self, item: LineItem) {
        if !self.try_add_item(item) {
            tracing::warn!("Cart totals would overflow; add ignored");
        }
    }

    /// [`CartState::add_item`], returning whether the cart accepted the item.
    pub(super) fn try_add_item(&mut self, item: LineItem) -> bool {
        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|line| line.id == item.id) {
            let Some(quantity) = existing.quantity.checked_add(item.quantity) else {
                return false;
            };
            existing.quantity = quantity;
        } else {
            items.push(item);
        }
        self.commit(items)
    }

    /// Remove the line with this ID. Unknown IDs are ignored.
    pub fn remove_item(&mut self, id: &LineItemId) {
        let mut items = self.items.clone();
        items.retain(|item| &item.id != id);
        if !self.commit(items) {
            tracing::warn!(item_id = %id, "Cart totals would overflow; remove ignored");
        }
    }

    /// Set a line's quantity.
    ///
    /// A quantity below 1 removes the line rather than clamping it. Unknown
    /// IDs are ignored, as is a quantity whose totals would overflow.
    pub fn update_item_quantity(&mut self, id: &LineItemId, quantity: i64) {
        if quantity < 1 {
            self.remove_item(id);
            return;
        }
        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|item| &item.id == id) {
            existing.quantity = quantity;
        }
        if !self.commit(items) {
            tracing::warn!(item_id = %id, quantity, "Cart totals would overflow; update ignored");
        }
    }

    /// Remove every line and zero the totals.
    pub fn clear(&mut self) {
        self.items.clear();
        self.item_count = 0;
        self.total = Decimal::ZERO;
    }

    /// Apply a mutation in place.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::Add { item } => self.add_item(item),
            CartAction::Remove { id } => self.remove_item(&id),
            CartAction::UpdateQuantity { id, quantity } => {
                self.update_item_quantity(&id, quantity);
            }
            CartAction::Clear => self.clear(),
        }
    }

    /// Apply a mutation and return the resulting state.
    #[must_use]
    pub fn transition(mut self, action: CartAction) -> Self {
        self.apply(action);
        self
    }

    /// Replace the items if their totals fit, recomputing the derived fields.
    #[must_use]
    fn commit(&mut self, items: Vec<LineItem>) -> bool {
        let Some((item_count, total)) = totals(&items) else {
            return false;
        };
        self.items = items;
        self.item_count = item_count;
        self.total = total;
        true
    }
}

/// `(Σ quantity, Σ price × quantity)`, or `None` if either overflows.
fn totals(items: &[LineItem]) -> Option<(i64, Decimal)> {
    items
        .iter()
        .try_fold((0_i64, Decimal::ZERO), |(count, total), item| {
            Some((
                count.checked_add(item.quantity)?,
                total.checked_add(item.line_total()?)?,
            ))
        })
}
