//! Port for the storefront catalog.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{
    Banner, BannerDraft, BannerId, Category, CategoryDraft, CategoryId, Pricing, Product,
    ProductDraft, ProductFilter, ProductId,
};

use super::RepositoryError;

/// Catalog reads and admin writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active categories ordered by `sort_order`, then id.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Active products matching `filter`, newest first.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Paginated<Product>, RepositoryError>;

    /// Product by id regardless of `is_active`.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert the product and its inventory row holding `initial_stock`.
    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError>;

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError>;

    /// Hide the product from the storefront. Rows referenced by orders are
    /// kept.
    async fn deactivate_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    async fn update_pricing(
        &self,
        id: ProductId,
        pricing: Pricing,
    ) -> Result<Product, RepositoryError>;

    async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError>;

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError>;

    /// Remove the category; its products become uncategorised.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;

    /// Active banners ordered by `sort_order`, then id.
    async fn list_banners(&self) -> Result<Vec<Banner>, RepositoryError>;

    async fn create_banner(&self, draft: &BannerDraft) -> Result<Banner, RepositoryError>;

    async fn delete_banner(&self, id: BannerId) -> Result<(), RepositoryError>;
}
