//! External marketplaces and the price/stock sync report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::ProductId;
use super::validation::{FieldError, required_text};

pub type MarketplaceId = i64;

const NAME_MAX: usize = 100;
const ACCOUNT_MAX: usize = 64;

/// Supported marketplace integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MarketplaceCode {
    Yandex,
    Uzum,
}

impl MarketplaceCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yandex => "yandex",
            Self::Uzum => "uzum",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yandex" => Some(Self::Yandex),
            "uzum" => Some(Self::Uzum),
            _ => None,
        }
    }
}

impl fmt::Display for MarketplaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured marketplace account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Marketplace {
    pub id: MarketplaceId,
    pub code: MarketplaceCode,
    pub name: String,
    /// Campaign id (Yandex) or shop id (Uzum).
    pub account_id: String,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

fn account_id(value: &str) -> Result<String, FieldError> {
    let account = required_text("account_id", value, ACCOUNT_MAX)?;
    if !account
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FieldError::invalid_format(
            "account_id",
            "account_id may only contain letters, digits, '-' and '_'",
        )
        .with_value(account));
    }
    Ok(account)
}

/// Body of `POST /api/seller/marketplaces`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct MarketplaceInput {
    pub code: MarketplaceCode,
    pub name: String,
    pub account_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Validated new marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceDraft {
    pub code: MarketplaceCode,
    pub name: String,
    pub account_id: String,
    pub is_active: bool,
}

impl TryFrom<MarketplaceInput> for MarketplaceDraft {
    type Error = FieldError;

    fn try_from(input: MarketplaceInput) -> Result<Self, Self::Error> {
        Ok(Self {
            code: input.code,
            name: required_text("name", &input.name, NAME_MAX)?,
            account_id: account_id(&input.account_id)?,
            is_active: input.is_active,
        })
    }
}

/// Body of `PATCH /api/seller/marketplaces/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct MarketplacePatchInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketplacePatch {
    pub name: Option<String>,
    pub account_id: Option<String>,
    pub is_active: Option<bool>,
}

impl TryFrom<MarketplacePatchInput> for MarketplacePatch {
    type Error = FieldError;

    fn try_from(input: MarketplacePatchInput) -> Result<Self, Self::Error> {
        let name = match input.name.as_deref() {
            Some(name) => Some(required_text("name", name, NAME_MAX)?),
            None => None,
        };
        let account = input.account_id.as_deref().map(account_id).transpose()?;
        Ok(Self {
            name,
            account_id: account,
            is_active: input.is_active,
        })
    }
}

impl MarketplacePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.account_id.is_none() && self.is_active.is_none()
    }
}

/// Price and stock pushed for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncListing {
    pub product_id: ProductId,
    pub sku: String,
    /// Offer id on the marketplace.
    pub offer_id: String,
    pub price: i64,
    pub stock: i32,
}

impl SyncListing {
    /// Offer id: the marketplace-specific SKU when set, else the store SKU.
    pub fn offer_id_for(sku: &str, external_sku: Option<&str>) -> String {
        external_sku
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(|| sku.to_owned(), str::to_owned)
    }
}

/// A listing that failed to sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncFailure {
    pub sku: String,
    pub error: String,
}

/// Outcome of `POST /api/seller/marketplaces/{id}/sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    pub marketplace_id: MarketplaceId,
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: Vec<SyncFailure>,
    pub synced_at: DateTime<Utc>,
}
