//! Cart line items and the derived cart summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tienda_core::{Price, ProductId};

/// A product line in the cart.
///
/// Stored as JSON under the cart storage key. Field names on the wire are
/// the ones browsers have been writing, so old carts stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "id_producto")]
    pub product_id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "imagen", default)]
    pub image: String,
    /// Stock reported by the catalog when the item was last added.
    pub stock: u32,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Totals derived from the cart contents. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(rename = "envio", with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(rename = "cantidad_total")]
    pub item_count: u32,
}

impl CartSummary {
    /// Amount to pay, in pesos.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::mxn(self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_reads_stored_field_names() {
        let json = r#"{"id_producto":7,"nombre":"Moto G84","precio":4599.5,"cantidad":2,"imagen":"moto.jpg","stock":4}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.product_id, ProductId::new(7));
        assert_eq!(item.unit_price, Decimal::new(45995, 1));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.line_total(), Decimal::from(9199));
    }

    #[test]
    fn test_cart_item_missing_image_defaults_to_empty() {
        let json = r#"{"id_producto":1,"nombre":"Chip","precio":50,"cantidad":1,"stock":10}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert!(item.image.is_empty());
    }

    #[test]
    fn test_summary_serializes_spanish_totals() {
        let summary = CartSummary {
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: Decimal::ZERO,
            item_count: 0,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("envio").is_some());
        assert!(value.get("cantidad_total").is_some());
    }

    #[test]
    fn test_total_price_is_in_pesos() {
        let summary = CartSummary {
            items: Vec::new(),
            subtotal: Decimal::from(448),
            shipping: Decimal::from(150),
            total: Decimal::from(598),
            item_count: 3,
        };
        assert_eq!(summary.total_price().to_string(), "$598.00 MXN");
    }
}
