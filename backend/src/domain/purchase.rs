//! Supplier purchases that replenish stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::ProductId;
use super::validation::{FieldError, optional_text};

pub type PurchaseId = i64;

/// Maximum number of lines in one purchase.
pub const MAX_PURCHASE_LINES: usize = 200;
const SUPPLIER_MAX: usize = 200;
const NOTE_MAX: usize = 1000;

/// One received line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_cost: i64,
}

impl PurchaseItem {
    pub fn line_cost(&self) -> i64 {
        self.unit_cost.saturating_mul(i64::from(self.quantity))
    }
}

/// Recorded purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Purchase {
    pub id: PurchaseId,
    pub supplier: Option<String>,
    pub note: Option<String>,
    pub total_cost: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PurchaseItem>,
}

/// Body of `POST /api/seller/purchases`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct PurchaseInput {
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub items: Vec<PurchaseItem>,
}

/// Validated purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDraft {
    pub supplier: Option<String>,
    pub note: Option<String>,
    pub items: Vec<PurchaseItem>,
}

impl PurchaseDraft {
    pub fn total_cost(&self) -> i64 {
        self.items
            .iter()
            .fold(0_i64, |sum, item| sum.saturating_add(item.line_cost()))
    }
}

impl TryFrom<PurchaseInput> for PurchaseDraft {
    type Error = FieldError;

    fn try_from(input: PurchaseInput) -> Result<Self, Self::Error> {
        if input.items.is_empty() {
            return Err(FieldError::required("items"));
        }
        if input.items.len() > MAX_PURCHASE_LINES {
            return Err(FieldError::out_of_range(
                "items",
                format!("a purchase may contain at most {MAX_PURCHASE_LINES} lines"),
            )
            .with_value(input.items.len()));
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(
                    FieldError::out_of_range("quantity", "quantity must be at least 1")
                        .with_value(item.quantity),
                );
            }
            if item.unit_cost < 0 {
                return Err(
                    FieldError::out_of_range("unit_cost", "unit_cost must not be negative")
                        .with_value(item.unit_cost),
                );
            }
        }
        Ok(Self {
            supplier: optional_text("supplier", input.supplier.as_deref(), SUPPLIER_MAX)?,
            note: optional_text("note", input.note.as_deref(), NOTE_MAX)?,
            items: input.items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(quantity: i32, unit_cost: i64) -> PurchaseItem {
        PurchaseItem {
            product_id: 1,
            quantity,
            unit_cost,
        }
    }

    #[rstest]
    fn total_cost_sums_lines() {
        let draft = PurchaseDraft::try_from(PurchaseInput {
            supplier: Some("Chorsu wholesale".to_owned()),
            note: None,
            items: vec![item(3, 1_000), item(2, 0)],
        })
        .expect("valid purchase");
        assert_eq!(draft.total_cost(), 3_000);
    }

    #[rstest]
    #[case(vec![], "items")]
    #[case(vec![item(0, 10)], "quantity")]
    #[case(vec![item(1, -1)], "unit_cost")]
    fn rejects_invalid_lines(#[case] items: Vec<PurchaseItem>, #[case] field: &str) {
        let err = PurchaseDraft::try_from(PurchaseInput {
            supplier: None,
            note: None,
            items,
        })
        .expect_err("invalid purchase");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn rejects_too_many_lines() {
        let err = PurchaseDraft::try_from(PurchaseInput {
            supplier: None,
            note: None,
            items: vec![item(1, 1); MAX_PURCHASE_LINES + 1],
        })
        .expect_err("too many lines");
        assert_eq!(err.field(), "items");
    }
}
