//! Ports for per-user cart lines and favourites.

use async_trait::async_trait;

use crate::domain::{CartLine, CartQuantity, Product, ProductId, UserId};

use super::RepositoryError;

/// Cart persistence. Callers check product availability first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Lines joined with their products, oldest first.
    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Add to an existing line or create one; the stored quantity is capped
    /// at [`crate::domain::MAX_LINE_QUANTITY`].
    async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: CartQuantity,
    ) -> Result<(), RepositoryError>;

    /// Replace the quantity of a line, creating it when absent.
    async fn set(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: CartQuantity,
    ) -> Result<(), RepositoryError>;

    /// Remove a line; `false` when there was none.
    async fn remove(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool, RepositoryError>;

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError>;
}

/// Favourite products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Favourite products, most recently added first.
    async fn list(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError>;

    /// Idempotent insert.
    async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError>;

    /// `false` when the product was not a favourite.
    async fn remove(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool, RepositoryError>;
}
