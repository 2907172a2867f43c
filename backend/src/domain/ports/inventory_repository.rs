//! Ports for stock levels and supplier purchases.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{
    InventoryFilter, InventoryItem, InventoryMovement, ProductId, Purchase, PurchaseDraft,
    PurchaseId, StockAdjustment,
};

use super::RepositoryError;

/// Inventory reads and manual corrections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Items ordered by SKU.
    async fn list(
        &self,
        filter: InventoryFilter,
        page: PageRequest,
    ) -> Result<Paginated<InventoryItem>, RepositoryError>;

    /// Apply `adjustment` and record an `adjustment` movement. Fails with
    /// `InsufficientStock` when the result would be negative.
    async fn adjust(
        &self,
        product_id: ProductId,
        adjustment: &StockAdjustment,
    ) -> Result<InventoryItem, RepositoryError>;

    /// Ledger of one product, newest first.
    async fn movements(
        &self,
        product_id: ProductId,
        page: PageRequest,
    ) -> Result<Paginated<InventoryMovement>, RepositoryError>;

    async fn set_threshold(
        &self,
        product_id: ProductId,
        threshold: i32,
    ) -> Result<InventoryItem, RepositoryError>;
}

/// Supplier purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Insert the purchase and its lines, increment stock (creating missing
    /// inventory rows) and record `purchase` movements, all in one
    /// transaction.
    async fn create(&self, draft: &PurchaseDraft) -> Result<Purchase, RepositoryError>;

    /// Purchases newest first.
    async fn list(&self, page: PageRequest) -> Result<Paginated<Purchase>, RepositoryError>;

    async fn find(&self, id: PurchaseId) -> Result<Option<Purchase>, RepositoryError>;
}
