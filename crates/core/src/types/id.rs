//! Identifier types.
//!
//! The gateway is not consistent about how it encodes identifiers: the same
//! product may arrive as `5`, `5.0` or `"5"` depending on the endpoint. Every
//! id is normalized once into a [`CanonicalId`] when it is decoded or
//! constructed, and all equality and membership checks compare that form.
//!
//! Use the `define_id!` macro to create type-safe wrappers that prevent
//! accidentally mixing ids from different entity types.

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical string form of an entity identifier.
///
/// ```
/// use sstashed_core::CanonicalId;
///
/// assert_eq!(CanonicalId::from(5_i64), CanonicalId::from("5"));
/// assert_eq!(CanonicalId::from(" 42 ").as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Normalize a string id. Surrounding whitespace is not significant.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_owned())
    }

    /// Normalize an untyped JSON value.
    ///
    /// Returns `None` for `null` and for values that cannot be an id
    /// (objects, arrays, booleans).
    #[must_use]
    pub fn normalize(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::new(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::from(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::from(u))
                } else {
                    n.as_f64().map(Self::from_float)
                }
            }
            _ => None,
        }
    }

    /// Integral floats collapse to their integer form so `5.0` equals `5`.
    #[allow(clippy::cast_possible_truncation)] // guarded by the range check
    fn from_float(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            Self((value as i64).to_string())
        } else {
            Self(value.to_string())
        }
    }

    /// The canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as an integer, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Whether the id is empty after normalization.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the id and returns the canonical string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CanonicalId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&String> for CanonicalId {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl From<i32> for CanonicalId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for CanonicalId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u32> for CanonicalId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for CanonicalId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for CanonicalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Numeric ids go back out as numbers; the gateway expects `{"productId": 9}`.
        match self.as_i64() {
            Some(i) => serializer.serialize_i64(i),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for CanonicalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CanonicalIdVisitor)
    }
}

struct CanonicalIdVisitor;

impl Visitor<'_> for CanonicalIdVisitor {
    type Value = CanonicalId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string identifier")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(CanonicalId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(CanonicalId::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(CanonicalId::from_float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(CanonicalId::new(v))
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`CanonicalId`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `From` conversions for integers, strings and `CanonicalId`
///
/// # Example
///
/// ```rust
/// # use sstashed_core::define_id;
/// define_id!(ReviewId);
/// define_id!(SellerId);
///
/// let review = ReviewId::from(7);
/// let seller = SellerId::from("7");
///
/// // Same canonical form, but these are different types:
/// assert_eq!(review.canonical(), seller.canonical());
/// // let _: ReviewId = seller;
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
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::CanonicalId);

        impl $name {
            /// Create an ID from anything that normalizes to a canonical id.
            #[must_use]
            pub fn new(id: impl Into<$crate::CanonicalId>) -> Self {
                Self(id.into())
            }

            /// The canonical form used for comparisons.
            #[must_use]
            pub const fn canonical(&self) -> &$crate::CanonicalId {
                &self.0
            }

            /// The canonical string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$crate::CanonicalId> for $name {
            fn from(id: $crate::CanonicalId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $crate::CanonicalId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<&$name> for $crate::CanonicalId {
            fn from(id: &$name) -> Self {
                id.0.clone()
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id.into())
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.into())
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.into())
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.into())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id.into())
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CategoryId);
define_id!(CartLineId);
define_id!(WishlistEntryId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(AddressId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids_match() {
        assert_eq!(CanonicalId::from(5_i64), CanonicalId::from("5"));
        assert_eq!(ProductId::from(5), ProductId::from("5"));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(CanonicalId::from("  12\n").as_str(), "12");
    }

    #[test]
    fn test_normalize_json_values() {
        use serde_json::json;

        assert_eq!(
            CanonicalId::normalize(&json!(5)),
            Some(CanonicalId::from("5"))
        );
        assert_eq!(
            CanonicalId::normalize(&json!(5.0)),
            Some(CanonicalId::from("5"))
        );
        assert_eq!(
            CanonicalId::normalize(&json!(5.5)),
            Some(CanonicalId::from("5.5"))
        );
        assert_eq!(
            CanonicalId::normalize(&json!("abc")),
            Some(CanonicalId::from("abc"))
        );
        assert_eq!(CanonicalId::normalize(&json!(null)), None);
        assert_eq!(CanonicalId::normalize(&json!({"id": 1})), None);
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let a: ProductId = serde_json::from_str("9").unwrap();
        let b: ProductId = serde_json::from_str("\"9\"").unwrap();
        let c: ProductId = serde_json::from_str("9.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_deserialize_rejects_non_scalar() {
        assert!(serde_json::from_str::<ProductId>("[1]").is_err());
        assert!(serde_json::from_str::<ProductId>("true").is_err());
    }

    #[test]
    fn test_serialize_numeric_as_number() {
        assert_eq!(serde_json::to_string(&ProductId::from("9")).unwrap(), "9");
        assert_eq!(
            serde_json::to_string(&ProductId::from("sku-9")).unwrap(),
            "\"sku-9\""
        );
    }

    #[test]
    fn test_display_uses_canonical_form() {
        assert_eq!(OrderId::from(" 17 ").to_string(), "17");
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(CanonicalId::from("42").as_i64(), Some(42));
        assert_eq!(CanonicalId::from("x42").as_i64(), None);
    }
}
