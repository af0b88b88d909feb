//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create string-backed ID wrappers that
//! prevent accidentally mixing IDs from different entity types.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use shopfront_core::define_id;
/// define_id!(SkuId);
/// define_id!(WarehouseId);
///
/// let sku = SkuId::new("tee-m-black");
/// let warehouse = WarehouseId::new("tee-m-black");
///
/// assert_eq!(sku.as_str(), warehouse.as_str());
/// // These are different types, so this won't compile:
/// // let _: SkuId = warehouse;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(LineItemId);
define_id!(ProductId);

impl LineItemId {
    /// Derive the line item ID for a product variant.
    ///
    /// Two selections of the same product, size and color always produce the
    /// same ID, which is what lets the cart merge them into one line.
    ///
    /// The parts are joined with `-`. A `-` or `\` inside a part is escaped
    /// with a backslash, so distinct selections never share an ID. Parts
    /// without either character are joined unchanged: `tee-M-black`.
    #[must_use]
    pub fn for_variant(product_id: &ProductId, size: &str, color: &str) -> Self {
        let parts = [product_id.as_str(), size, color];
        let mut id = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                id.push('-');
            }
            push_escaped(&mut id, part);
        }
        Self(id)
    }
}

fn push_escaped(id: &mut String, part: &str) {
    for c in part.chars() {
        if matches!(c, '-' | '\\') {
            id.push('\\');
        }
        id.push(c);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_for_variant_is_stable() {
        let product = ProductId::new("tee");
        let a = LineItemId::for_variant(&product, "M", "black");
        let b = LineItemId::for_variant(&product, "M", "black");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "tee-M-black");
    }

    #[test]
    fn test_for_variant_differs_by_color() {
        let product = ProductId::new("tee");
        assert_ne!(
            LineItemId::for_variant(&product, "M", "black"),
            LineItemId::for_variant(&product, "M", "white")
        );
    }

    #[test]
    fn test_for_variant_escapes_separators() {
        let split_early = LineItemId::for_variant(&ProductId::new("a-b"), "c", "x");
        let split_late = LineItemId::for_variant(&ProductId::new("a"), "b-c", "x");
        assert_ne!(split_early, split_late);
        assert_eq!(split_early.as_str(), r"a\-b-c-x");
        assert_eq!(split_late.as_str(), r"a-b\-c-x");

        let slash = LineItemId::for_variant(&ProductId::new(r"a\"), "-b", "x");
        let dash = LineItemId::for_variant(&ProductId::new("a"), r"\-b", "x");
        assert_ne!(slash, dash);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = LineItemId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: LineItemId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }
}
