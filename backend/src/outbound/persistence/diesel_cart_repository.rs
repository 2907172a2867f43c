//! PostgreSQL-backed cart and favourites adapters using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CartRepository, FavoritesRepository, RepositoryError};
use crate::domain::{CartLine, CartQuantity, MAX_LINE_QUANTITY, Product, ProductId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::ProductRow;
use super::pool::DbPool;
use super::schema::{cart_items, favorites, products};

diesel::define_sql_function! {
    /// PostgreSQL `LEAST` over two integers.
    fn least(a: Integer, b: Integer) -> Integer;
}

/// Diesel-backed implementation of the `CartRepository` port.
#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(cart_items::table)
            .values((
                cart_items::user_id.eq(user_id),
                cart_items::product_id.eq(product_id),
                cart_items::quantity.eq(quantity),
            ))
            .on_conflict((cart_items::user_id, cart_items::product_id))
            .do_update()
            .set(cart_items::quantity.eq(quantity))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl CartRepository for DieselCartRepository {
    async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(ProductRow, i32)> = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::user_id.eq(user_id))
            .select((ProductRow::as_select(), cart_items::quantity))
            .order(cart_items::added_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(product, quantity)| CartLine {
                product: Product::from(product),
                quantity,
            })
            .collect())
    }

    async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: CartQuantity,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(cart_items::table)
            .values((
                cart_items::user_id.eq(user_id),
                cart_items::product_id.eq(product_id),
                cart_items::quantity.eq(quantity.get()),
            ))
            .on_conflict((cart_items::user_id, cart_items::product_id))
            .do_update()
            .set(cart_items::quantity.eq(least(
                cart_items::quantity + excluded(cart_items::quantity),
                MAX_LINE_QUANTITY,
            )))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: CartQuantity,
    ) -> Result<(), RepositoryError> {
        self.upsert(user_id, product_id, quantity.get()).await
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(cart_items::table.find((user_id, product_id)))
            .execute(&mut conn)
            .await
            .map(|deleted| deleted > 0)
            .map_err(map_diesel_error)
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

/// Diesel-backed implementation of the `FavoritesRepository` port.
#[derive(Clone)]
pub struct DieselFavoritesRepository {
    pool: DbPool,
}

impl DieselFavoritesRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoritesRepository for DieselFavoritesRepository {
    async fn list(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProductRow> = favorites::table
            .inner_join(products::table)
            .filter(favorites::user_id.eq(user_id))
            .filter(products::is_active.eq(true))
            .select(ProductRow::as_select())
            .order(favorites::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(favorites::table)
            .values((
                favorites::user_id.eq(user_id),
                favorites::product_id.eq(product_id),
            ))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(favorites::table.find((user_id, product_id)))
            .execute(&mut conn)
            .await
            .map(|deleted| deleted > 0)
            .map_err(map_diesel_error)
    }
}
