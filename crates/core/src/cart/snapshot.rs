//! Persisted cart shape and the hydration gate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CartState, LineItem};

/// The serialized cart written to storage.
///
/// ```json
/// { "items": [ { "id": "...", "productId": "...", ... } ], "itemCount": 3, "total": 30 }
/// ```
///
/// `item_count` and `total` are written for readers of the raw value but are
/// never trusted when reading it back: see [`CartState::hydrate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    pub item_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl CartSnapshot {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from JSON. Every field is required.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the value is not a well-formed snapshot.
    pub fn from_json(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}

/// What [`CartState::hydrate`] had to correct in a loaded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Lines folded into an earlier line with the same ID.
    pub merged_duplicates: usize,
    /// Lines kept with a quantity below 1.
    ///
    /// `add_item` can produce these, so they are carried over unchanged and
    /// only counted here.
    pub non_positive_items: usize,
    /// Lines discarded because keeping them would overflow the totals.
    pub dropped_items: usize,
    /// Stored `itemCount` differed from the recomputed value.
    pub item_count_drift: bool,
    /// Stored `total` differed from the recomputed value.
    pub total_drift: bool,
}

impl HydrationReport {
    /// Whether the snapshot was accepted exactly as stored.
    ///
    /// Non-positive quantities do not count against this: they are kept.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.merged_duplicates == 0
            && self.dropped_items == 0
            && !self.item_count_drift
            && !self.total_drift
    }
}

impl CartState {
    /// Capture the persisted shape of this state.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items().to_vec(),
            item_count: self.item_count(),
            total: self.total(),
        }
    }

    /// Rebuild a state from a loaded snapshot.
    ///
    /// Derived fields are always recomputed from `items`. Every line is
    /// replayed through [`CartState::add_item`], so lines sharing an ID are
    /// merged and the result satisfies every invariant regardless of what was
    /// stored. Lines with a quantity below 1 are kept as stored.
    #[must_use]
    pub fn hydrate(snapshot: CartSnapshot) -> (Self, HydrationReport) {
        let mut report = HydrationReport::default();
        let mut state = Self::new();

        for item in snapshot.items {
            let non_positive = item.quantity < 1;
            let duplicate = state.get(&item.id).is_some();
            if !state.try_add_item(item) {
                report.dropped_items += 1;
                continue;
            }
            if non_positive {
                report.non_positive_items += 1;
            }
            if duplicate {
                report.merged_duplicates += 1;
            }
        }

        report.item_count_drift = state.item_count() != snapshot.item_count;
        report.total_drift = state.total() != snapshot.total;
        (state, report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cart::test_support::item;

    fn sample_cart() -> CartState {
        let mut cart = CartState::new();
        cart.add_item(item("A", 10, 2));
        cart.add_item(item("B", 5, 1));
        cart
    }

    #[test]
    fn test_snapshot_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_cart().snapshot().to_json().unwrap()).unwrap();

        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["itemCount"], 3);
        assert!(json["total"].is_number());
        assert!((json["total"].as_f64().unwrap() - 25.0).abs() < f64::EPSILON);
        assert_eq!(json["items"][0]["productId"], "product-A");
    }

    #[test]
    fn test_round_trip_recomputes_corrupted_totals() {
        let original = sample_cart();
        let mut snapshot = original.snapshot();
        snapshot.item_count = 999;
        snapshot.total = Decimal::from(-42);

        let reloaded = CartSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let (state, report) = CartState::hydrate(reloaded);

        assert_eq!(state.items(), original.items());
        assert_eq!(state.item_count(), 3);
        assert_eq!(state.total(), Decimal::from(25));
        assert!(report.item_count_drift);
        assert!(report.total_drift);
    }

    #[test]
    fn test_clean_round_trip_reports_nothing() {
        let original = sample_cart();
        let json = original.snapshot().to_json().unwrap();
        let (state, report) = CartState::hydrate(CartSnapshot::from_json(&json).unwrap());

        assert_eq!(state, original);
        assert!(report.is_clean());
    }

    #[test]
    fn test_hydrate_merges_duplicate_ids() {
        let snapshot = CartSnapshot {
            items: vec![item("A", 10, 1), item("B", 1, 1), item("A", 10, 2)],
            item_count: 4,
            total: Decimal::from(31),
        };
        let (state, report) = CartState::hydrate(snapshot);

        assert_eq!(state.items().len(), 2);
        assert_eq!(state.items()[0].quantity, 3);
        assert_eq!(report.merged_duplicates, 1);
        assert!(!report.item_count_drift);
    }

    #[test]
    fn test_hydrate_keeps_non_positive_quantities() {
        let snapshot = CartSnapshot {
            items: vec![item("A", 10, 0), item("B", 2, 3), item("C", 4, -1)],
            item_count: 2,
            total: Decimal::from(2),
        };
        let (state, report) = CartState::hydrate(snapshot);

        let quantities: Vec<i64> = state.items().iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, [0, 3, -1]);
        assert_eq!(report.non_positive_items, 2);
        assert_eq!(report.dropped_items, 0);
        assert_eq!(state.item_count(), 2);
        assert_eq!(state.total(), Decimal::from(2));
        assert!(report.is_clean());
    }

    #[test]
    fn test_add_produced_cart_round_trips_exactly() {
        let mut original = CartState::new();
        original.add_item(item("A", 10, 2));
        original.add_item(item("A", 10, -2));
        original.add_item(item("B", 5, 1));

        let json = original.snapshot().to_json().unwrap();
        let (state, _) = CartState::hydrate(CartSnapshot::from_json(&json).unwrap());

        assert_eq!(state.items(), original.items());
        assert_eq!(state, original);
    }

    #[test]
    fn test_hydrate_drops_lines_that_overflow_totals() {
        let huge = LineItem {
            price: crate::Price::new(Decimal::MAX).unwrap(),
            ..item("B", 0, 2)
        };
        let snapshot = CartSnapshot {
            items: vec![item("A", 10, 1), huge],
            item_count: 3,
            total: Decimal::from(10),
        };
        let (state, report) = CartState::hydrate(snapshot);

        assert_eq!(state.items().len(), 1);
        assert_eq!(report.dropped_items, 1);
        assert!(report.item_count_drift);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_items_allowed() {
        let snapshot = CartSnapshot::from_json(r#"{"items":[],"itemCount":0,"total":0}"#).unwrap();
        let (state, report) = CartState::hydrate(snapshot);
        assert!(state.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        assert!(CartSnapshot::from_json(r#"{"items":[],"itemCount":0}"#).is_err());
        assert!(CartSnapshot::from_json("not json").is_err());
    }
}
