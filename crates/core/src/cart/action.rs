//! Cart mutations as data.

use serde::{Deserialize, Serialize};

use super::LineItem;
use crate::LineItemId;

/// A single cart mutation.
///
/// Each variant maps to one [`CartState`](super::CartState) operation. Having
/// them as values lets callers log, queue or replay mutations and keeps the
/// transition function `(state, action) -> state` explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    /// Merge into the line with the same ID, or append a new line.
    Add { item: LineItem },
    /// Remove the line with this ID, if present.
    Remove { id: LineItemId },
    /// Set a line's quantity. Below 1 removes the line.
    UpdateQuantity { id: LineItemId, quantity: i64 },
    /// Remove every line.
    Clear,
}

impl CartAction {
    /// Short name for logs and tracing fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::UpdateQuantity { .. } => "update_quantity",
            Self::Clear => "clear",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tagged_serialization() {
        let action = CartAction::UpdateQuantity {
            id: LineItemId::new("a"),
            quantity: 2,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "update_quantity");
        assert_eq!(json["id"], "a");
        assert_eq!(json["quantity"], 2);

        let clear: CartAction = serde_json::from_str(r#"{"type":"clear"}"#).unwrap();
        assert_eq!(clear, CartAction::Clear);
    }

    #[test]
    fn test_action_names() {
        assert_eq!(CartAction::Clear.name(), "clear");
        assert_eq!(
            CartAction::Remove {
                id: LineItemId::new("x")
            }
            .name(),
            "remove"
        );
    }
}
