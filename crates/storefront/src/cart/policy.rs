//! Shipping rules and cart totals.

use rust_decimal::Decimal;

use crate::models::{CartItem, CartSummary};

/// Shipping pricing applied to every cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Flat shipping fee below the threshold.
    pub shipping_fee: Decimal,
}

impl Default for CartPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::from(1000),
            shipping_fee: Decimal::from(150),
        }
    }
}

impl CartPolicy {
    /// Shipping for a subtotal. Empty carts ship for free.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal, has_items: bool) -> Decimal {
        if !has_items || subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }

    /// Derive totals for `items`.
    #[must_use]
    pub fn summarize(&self, items: &[CartItem]) -> CartSummary {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let shipping = self.shipping_for(subtotal, !items.is_empty());

        CartSummary {
            items: items.to_vec(),
            subtotal,
            shipping,
            total: subtotal + shipping,
            item_count: items.iter().map(|item| item.quantity).sum(),
        }
    }
}
