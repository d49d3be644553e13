//! Domain models for the storefront.
//!
//! Catalog and order payloads keep the field names used by the catalog API
//! (`nombre`, `precio`, ...) on the wire and expose English names in Rust.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{CartItem, CartSummary};
pub use catalog::{Banner, Category, Product, ProductImage, ProductPage, ServiceItem, Subcategory};
pub use order::{CheckoutForm, OrderRequest, OrderResponse};
pub use session::keys as session_keys;
pub use user::{LoginForm, RegisterForm, ResetConfirmForm, ResetRequestForm, UserProjection};

/// Deserialize helpers for loosely typed PHP responses.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept a string, a number, or null and produce an optional string.
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Parse a known status string; anything else reads as `None`.
    pub fn known_status<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: std::str::FromStr,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    }

    /// Accept a number or a numeric string (PHP often quotes numbers).
    pub fn i64_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| serde::de::Error::custom("expected an integer")),
            Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
            Value::Null => Ok(0),
            other => Err(serde::de::Error::custom(format!(
                "expected an integer, got {other}"
            ))),
        }
    }
}
