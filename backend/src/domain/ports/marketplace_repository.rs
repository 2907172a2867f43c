//! Ports for marketplace accounts and their price lists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Marketplace, MarketplaceDraft, MarketplaceId, MarketplacePatch, MarketplacePrice,
    MarketplacePriceUpdate, ProductId, SyncListing,
};

use super::RepositoryError;

/// Marketplace account persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Marketplace>, RepositoryError>;

    async fn find(&self, id: MarketplaceId) -> Result<Option<Marketplace>, RepositoryError>;

    async fn create(&self, draft: &MarketplaceDraft) -> Result<Marketplace, RepositoryError>;

    async fn update(
        &self,
        id: MarketplaceId,
        patch: &MarketplacePatch,
    ) -> Result<Marketplace, RepositoryError>;

    async fn mark_synced(
        &self,
        id: MarketplaceId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Per-marketplace prices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricingRepository: Send + Sync {
    /// Prices ordered by SKU, optionally for one marketplace.
    async fn list(
        &self,
        marketplace_id: Option<MarketplaceId>,
    ) -> Result<Vec<MarketplacePrice>, RepositoryError>;

    /// Insert or replace the price of a product on a marketplace.
    async fn upsert(
        &self,
        product_id: ProductId,
        marketplace_id: MarketplaceId,
        update: &MarketplacePriceUpdate,
    ) -> Result<MarketplacePrice, RepositoryError>;

    /// Listings to push: every active product priced for the marketplace,
    /// with its current stock, ordered by SKU.
    async fn listings(
        &self,
        marketplace_id: MarketplaceId,
    ) -> Result<Vec<SyncListing>, RepositoryError>;
}
