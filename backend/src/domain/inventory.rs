//! Seller-side stock levels and the movement ledger.
//!
//! Every change to `inventory.quantity` is recorded as an
//! [`InventoryMovement`] in the same transaction, so the ledger always sums to
//! the current stock.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::ProductId;
use super::validation::{FieldError, optional_text};

const NOTE_MAX: usize = 500;

/// Stock level of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InventoryItem {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub reserved: i32,
    pub low_stock_threshold: i32,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Units that can still be sold.
    pub fn available(&self) -> i32 {
        self.quantity.saturating_sub(self.reserved).max(0)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

/// Why stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Purchase,
    Sale,
    Adjustment,
    Return,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Adjustment => "adjustment",
            Self::Return => "return",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "purchase" => Some(Self::Purchase),
            "sale" => Some(Self::Sale),
            "adjustment" => Some(Self::Adjustment),
            "return" => Some(Self::Return),
            _ => None,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity_delta: i32,
    /// Order or purchase id the movement belongs to.
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Manual stock correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub delta: i32,
    pub note: Option<String>,
}

impl StockAdjustment {
    /// `delta` must be non-zero.
    pub fn new(delta: i32, note: Option<&str>) -> Result<Self, FieldError> {
        if delta == 0 {
            return Err(FieldError::out_of_range("delta", "delta must not be zero"));
        }
        Ok(Self {
            delta,
            note: optional_text("note", note, NOTE_MAX)?,
        })
    }
}

/// Validate a low-stock threshold.
pub fn low_stock_threshold(value: i32) -> Result<i32, FieldError> {
    if value < 0 {
        return Err(
            FieldError::out_of_range("low_stock_threshold", "threshold must not be negative")
                .with_value(value),
        );
    }
    Ok(value)
}

/// Listing filter for `GET /api/seller/inventory`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    /// Only items at or below their threshold.
    pub low_stock: bool,
}
