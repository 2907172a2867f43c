//! In-memory TTL cache in front of the catalog repository.
//!
//! Category and banner lists are read on every storefront launch and change
//! only through admin writes, so they are memoised with `moka` and dropped
//! whenever this adapter performs a write that touches them. Product reads
//! pass straight through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use pagination::{PageRequest, Paginated};
use tracing::debug;

use crate::domain::ports::{CatalogRepository, RepositoryError};
use crate::domain::{
    Banner, BannerDraft, BannerId, Category, CategoryDraft, CategoryId, Pricing, Product,
    ProductDraft, ProductFilter, ProductId,
};

/// Default lifetime of a cached list.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

/// Catalog repository decorator caching category and banner lists.
pub struct CachedCatalogRepository {
    inner: Arc<dyn CatalogRepository>,
    categories: Cache<(), Arc<Vec<Category>>>,
    banners: Cache<(), Arc<Vec<Banner>>>,
}

impl CachedCatalogRepository {
    pub fn new(inner: Arc<dyn CatalogRepository>, ttl: Duration) -> Self {
        Self {
            inner,
            categories: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            banners: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    async fn invalidate_categories(&self) {
        self.categories.invalidate(&()).await;
        debug!("category cache invalidated");
    }

    async fn invalidate_banners(&self) {
        self.banners.invalidate(&()).await;
        debug!("banner cache invalidated");
    }
}

#[async_trait]
impl CatalogRepository for CachedCatalogRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        if let Some(cached) = self.categories.get(&()).await {
            return Ok(cached.as_ref().clone());
        }
        let categories = self.inner.list_categories().await?;
        self.categories
            .insert((), Arc::new(categories.clone()))
            .await;
        Ok(categories)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Paginated<Product>, RepositoryError> {
        self.inner.list_products(filter, page).await
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.inner.find_product(id).await
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        self.inner.create_product(draft).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        self.inner.update_product(id, draft).await
    }

    async fn deactivate_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.inner.deactivate_product(id).await
    }

    async fn update_pricing(
        &self,
        id: ProductId,
        pricing: Pricing,
    ) -> Result<Product, RepositoryError> {
        self.inner.update_pricing(id, pricing).await
    }

    async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let created = self.inner.create_category(draft).await?;
        self.invalidate_categories().await;
        Ok(created)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError> {
        let updated = self.inner.update_category(id, draft).await?;
        self.invalidate_categories().await;
        Ok(updated)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        self.inner.delete_category(id).await?;
        self.invalidate_categories().await;
        Ok(())
    }

    async fn list_banners(&self) -> Result<Vec<Banner>, RepositoryError> {
        if let Some(cached) = self.banners.get(&()).await {
            return Ok(cached.as_ref().clone());
        }
        let banners = self.inner.list_banners().await?;
        self.banners.insert((), Arc::new(banners.clone())).await;
        Ok(banners)
    }

    async fn create_banner(&self, draft: &BannerDraft) -> Result<Banner, RepositoryError> {
        let created = self.inner.create_banner(draft).await?;
        self.invalidate_banners().await;
        Ok(created)
    }

    async fn delete_banner(&self, id: BannerId) -> Result<(), RepositoryError> {
        self.inner.delete_banner(id).await?;
        self.invalidate_banners().await;
        Ok(())
    }
}
