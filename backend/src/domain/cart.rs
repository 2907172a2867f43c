//! Shopping cart lines and totals.

use serde::Serialize;
use utoipa::ToSchema;

use super::catalog::{Product, ProductId};
use super::validation::FieldError;

/// Largest quantity of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Quantity added to a cart line: `1..=99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartQuantity(i32);

impl CartQuantity {
    pub fn new(value: i32) -> Result<Self, FieldError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&value) {
            return Err(FieldError::out_of_range(
                "quantity",
                format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"),
            )
            .with_value(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// Quantity after adding `self` to a line already holding `existing`.
    pub fn added_to(self, existing: i32) -> i32 {
        existing.saturating_add(self.0).min(MAX_LINE_QUANTITY)
    }
}

/// Target of `PUT /api/cart/items/{product_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartLineUpdate {
    Set(CartQuantity),
    Remove,
}

impl CartLineUpdate {
    /// Zero removes the line; anything else must be a valid quantity.
    pub fn from_quantity(value: i32) -> Result<Self, FieldError> {
        if value == 0 {
            Ok(Self::Remove)
        } else {
            CartQuantity::new(value).map(Self::Set)
        }
    }
}

/// Stored cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
}

/// Cart line as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartItem {
    pub product_id: ProductId,
    pub sku: String,
    pub name_ru: String,
    pub name_uz: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    pub is_available: bool,
}

/// Customer cart with totals computed from effective prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub items_count: i32,
    pub total: i64,
}

impl CartView {
    /// Build the view; inactive products stay listed but do not count
    /// towards the total.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartItem> = lines
            .into_iter()
            .map(|CartLine { product, quantity }| {
                let unit_price = product.effective_price();
                CartItem {
                    product_id: product.id,
                    unit_price,
                    quantity,
                    line_total: unit_price.saturating_mul(i64::from(quantity)),
                    is_available: product.is_active,
                    sku: product.sku,
                    name_ru: product.name_ru,
                    name_uz: product.name_uz,
                    image_url: product.image_url,
                    price: product.price,
                    sale_price: product.sale_price,
                }
            })
            .collect();
        let available = items.iter().filter(|item| item.is_available);
        let total = available
            .clone()
            .fold(0_i64, |sum, item| sum.saturating_add(item.line_total));
        let items_count = available.fold(0_i32, |sum, item| sum.saturating_add(item.quantity));
        Self {
            items,
            items_count,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn product(id: ProductId, price: i64, sale_price: Option<i64>, is_active: bool) -> Product {
        Product {
            id,
            sku: format!("SKU-{id}"),
            name_ru: "Товар".to_owned(),
            name_uz: "Mahsulot".to_owned(),
            description_ru: None,
            description_uz: None,
            price,
            sale_price,
            category_id: None,
            image_url: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(0)]
    #[case(100)]
    #[case(-1)]
    fn rejects_out_of_range_quantities(#[case] value: i32) {
        assert!(CartQuantity::new(value).is_err());
    }

    #[rstest]
    #[case(1, 0, 1)]
    #[case(5, 90, 95)]
    #[case(20, 90, 99)]
    fn adding_caps_at_maximum(#[case] add: i32, #[case] existing: i32, #[case] expected: i32) {
        let quantity = CartQuantity::new(add).expect("valid quantity");
        assert_eq!(quantity.added_to(existing), expected);
    }

    #[rstest]
    fn zero_update_removes_line() {
        assert_eq!(CartLineUpdate::from_quantity(0), Ok(CartLineUpdate::Remove));
        assert!(matches!(
            CartLineUpdate::from_quantity(3),
            Ok(CartLineUpdate::Set(q)) if q.get() == 3
        ));
    }

    #[rstest]
    fn totals_use_effective_price_and_skip_inactive() {
        let view = CartView::from_lines(vec![
            CartLine {
                product: product(1, 10_000, Some(8_000), true),
                quantity: 2,
            },
            CartLine {
                product: product(2, 5_000, None, true),
                quantity: 1,
            },
            CartLine {
                product: product(3, 7_000, None, false),
                quantity: 4,
            },
        ]);
        assert_eq!(view.total, 21_000);
        assert_eq!(view.items_count, 3);
        assert_eq!(view.items.len(), 3);
        assert_eq!(view.items[0].line_total, 16_000);
        assert!(!view.items[2].is_available);
    }
}
