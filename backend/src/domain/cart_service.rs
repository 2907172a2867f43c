//! Cart and favourites use-cases.
//!
//! Both check that the product exists and is on sale before touching the
//! per-user tables.

use std::sync::Arc;

use super::ports::{CartRepository, CatalogRepository, FavoritesRepository};
use super::{
    CartLineUpdate, CartQuantity, CartView, Error, Product, ProductId, UserId,
};

async fn require_active_product(
    catalog: &dyn CatalogRepository,
    product_id: ProductId,
) -> Result<Product, Error> {
    match catalog.find_product(product_id).await? {
        Some(product) if product.is_active => Ok(product),
        _ => Err(Error::not_found(format!("product {product_id} not found"))),
    }
}

/// Cart operations for the authenticated customer.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogRepository>,
    cart: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, cart: Arc<dyn CartRepository>) -> Self {
        Self { catalog, cart }
    }

    pub async fn view(&self, user_id: UserId) -> Result<CartView, Error> {
        let lines = self.cart.lines(user_id).await?;
        Ok(CartView::from_lines(lines))
    }

    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: CartQuantity,
    ) -> Result<CartView, Error> {
        require_active_product(self.catalog.as_ref(), product_id).await?;
        self.cart.add(user_id, product_id, quantity).await?;
        self.view(user_id).await
    }

    pub async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        update: CartLineUpdate,
    ) -> Result<CartView, Error> {
        match update {
            CartLineUpdate::Remove => {
                self.cart.remove(user_id, product_id).await?;
            }
            CartLineUpdate::Set(quantity) => {
                require_active_product(self.catalog.as_ref(), product_id).await?;
                self.cart.set(user_id, product_id, quantity).await?;
            }
        }
        self.view(user_id).await
    }

    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<CartView, Error> {
        if !self.cart.remove(user_id, product_id).await? {
            return Err(Error::not_found(format!(
                "product {product_id} is not in the cart"
            )));
        }
        self.view(user_id).await
    }

    pub async fn clear(&self, user_id: UserId) -> Result<(), Error> {
        self.cart.clear(user_id).await?;
        Ok(())
    }
}

/// Favourite products of the authenticated customer.
#[derive(Clone)]
pub struct FavoritesService {
    catalog: Arc<dyn CatalogRepository>,
    favorites: Arc<dyn FavoritesRepository>,
}

impl FavoritesService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        favorites: Arc<dyn FavoritesRepository>,
    ) -> Self {
        Self { catalog, favorites }
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Product>, Error> {
        Ok(self.favorites.list(user_id).await?)
    }

    /// Idempotent: adding an existing favourite succeeds.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), Error> {
        require_active_product(self.catalog.as_ref(), product_id).await?;
        self.favorites.add(user_id, product_id).await?;
        Ok(())
    }

    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), Error> {
        if !self.favorites.remove(user_id, product_id).await? {
            return Err(Error::not_found(format!(
                "product {product_id} is not a favourite"
            )));
        }
        Ok(())
    }
}
