//! Per-marketplace price lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::ProductId;
use super::marketplace::MarketplaceId;
use super::validation::{FieldError, optional_text};

const EXTERNAL_SKU_MAX: usize = 128;

/// Price a product is listed at on one marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MarketplacePrice {
    pub product_id: ProductId,
    pub marketplace_id: MarketplaceId,
    pub sku: String,
    pub name: String,
    pub price: i64,
    /// Offer id on the marketplace; the SKU is used when absent.
    pub external_sku: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /api/seller/prices/{product_id}/{marketplace_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct MarketplacePriceInput {
    pub price: i64,
    #[serde(default)]
    pub external_sku: Option<String>,
}

/// Validated marketplace price upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplacePriceUpdate {
    pub price: i64,
    pub external_sku: Option<String>,
}

impl TryFrom<MarketplacePriceInput> for MarketplacePriceUpdate {
    type Error = FieldError;

    fn try_from(input: MarketplacePriceInput) -> Result<Self, Self::Error> {
        if input.price <= 0 {
            return Err(
                FieldError::out_of_range("price", "price must be greater than zero")
                    .with_value(input.price),
            );
        }
        Ok(Self {
            price: input.price,
            external_sku: optional_text(
                "external_sku",
                input.external_sku.as_deref(),
                EXTERNAL_SKU_MAX,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-100)]
    fn rejects_non_positive_price(#[case] price: i64) {
        let err = MarketplacePriceUpdate::try_from(MarketplacePriceInput {
            price,
            external_sku: None,
        })
        .expect_err("invalid price");
        assert_eq!(err.field(), "price");
    }

    #[rstest]
    fn blank_external_sku_is_dropped() {
        let update = MarketplacePriceUpdate::try_from(MarketplacePriceInput {
            price: 1,
            external_sku: Some(" ".to_owned()),
        })
        .expect("valid");
        assert_eq!(update.external_sku, None);
    }
}
