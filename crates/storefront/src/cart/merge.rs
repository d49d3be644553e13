//! Guest-to-user cart merge.

use crate::models::CartItem;

/// Merge a guest cart into a user cart.
///
/// Lines are matched by product. Matching lines sum their quantities and
/// are clamped to the larger known stock, which the merged line keeps.
/// User lines keep their order; guest-only lines are appended.
#[must_use]
pub fn merge_carts(user: Vec<CartItem>, guest: Vec<CartItem>) -> Vec<CartItem> {
    let mut merged = user;

    for guest_item in guest {
        match merged
            .iter_mut()
            .find(|item| item.product_id == guest_item.product_id)
        {
            Some(existing) => {
                let stock = existing.stock.max(guest_item.stock);
                existing.stock = stock;
                existing.quantity = existing
                    .quantity
                    .saturating_add(guest_item.quantity)
                    .clamp(1, stock.max(1));
            }
            None => merged.push(guest_item),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tienda_core::ProductId;

    fn item(id: i32, quantity: u32, stock: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Producto {id}"),
            unit_price: Decimal::from(100),
            quantity,
            image: String::new(),
            stock,
        }
    }

    #[test]
    fn test_overlapping_line_sums_and_keeps_larger_stock() {
        let merged = merge_carts(vec![item(1, 1, 3)], vec![item(1, 2, 5)]);
        assert_eq!(merged, vec![item(1, 3, 5)]);
    }

    #[test]
    fn test_sum_is_clamped_to_stock() {
        let merged = merge_carts(vec![item(1, 3, 4)], vec![item(1, 3, 2)]);
        assert_eq!(merged, vec![item(1, 4, 4)]);
    }

    #[test]
    fn test_guest_only_lines_are_appended() {
        let merged = merge_carts(
            vec![item(1, 1, 5), item(2, 1, 5)],
            vec![item(3, 2, 5), item(1, 1, 5)],
        );
        let ids: Vec<i32> = merged.iter().map(|i| i.product_id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(merged[0].quantity, 2);
    }

    #[test]
    fn test_empty_sides() {
        assert_eq!(merge_carts(Vec::new(), vec![item(1, 1, 1)]).len(), 1);
        assert_eq!(merge_carts(vec![item(1, 1, 1)], Vec::new()).len(), 1);
        assert!(merge_carts(Vec::new(), Vec::new()).is_empty());
    }
}
