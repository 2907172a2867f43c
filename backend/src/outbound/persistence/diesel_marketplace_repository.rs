//! PostgreSQL-backed marketplace account and price adapters using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{MarketplaceRepository, PricingRepository, RepositoryError};
use crate::domain::{
    Marketplace, MarketplaceDraft, MarketplaceId, MarketplacePatch, MarketplacePrice,
    MarketplacePriceUpdate, ProductId, SyncListing,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    MarketplaceChangeset, MarketplaceRow, NewMarketplaceRow, NewProductPriceRow, PriceJoinRow,
};
use super::pool::DbPool;
use super::schema::{inventory, marketplaces, product_prices, products};

type PriceColumns = (
    product_prices::product_id,
    product_prices::marketplace_id,
    product_prices::price,
    product_prices::external_sku,
    product_prices::updated_at,
    products::sku,
    products::name_ru,
);

const PRICE_COLUMNS: PriceColumns = (
    product_prices::product_id,
    product_prices::marketplace_id,
    product_prices::price,
    product_prices::external_sku,
    product_prices::updated_at,
    products::sku,
    products::name_ru,
);

fn marketplace_not_found(id: MarketplaceId) -> RepositoryError {
    RepositoryError::not_found(format!("marketplace {id} not found"))
}

/// Diesel-backed implementation of the `MarketplaceRepository` port.
#[derive(Clone)]
pub struct DieselMarketplaceRepository {
    pool: DbPool,
}

impl DieselMarketplaceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn find_marketplace(
    conn: &mut AsyncPgConnection,
    id: MarketplaceId,
) -> Result<Option<Marketplace>, RepositoryError> {
    let row: Option<MarketplaceRow> = marketplaces::table
        .find(id)
        .select(MarketplaceRow::as_select())
        .first(conn)
        .await
        .optional()?;
    row.map(Marketplace::try_from).transpose()
}

#[async_trait]
impl MarketplaceRepository for DieselMarketplaceRepository {
    async fn list(&self) -> Result<Vec<Marketplace>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MarketplaceRow> = marketplaces::table
            .select(MarketplaceRow::as_select())
            .order(marketplaces::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(Marketplace::try_from).collect()
    }

    async fn find(&self, id: MarketplaceId) -> Result<Option<Marketplace>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        find_marketplace(&mut conn, id).await
    }

    async fn create(&self, draft: &MarketplaceDraft) -> Result<Marketplace, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: MarketplaceRow = diesel::insert_into(marketplaces::table)
            .values(&NewMarketplaceRow {
                code: draft.code.as_str(),
                name: draft.name.as_str(),
                account_id: draft.account_id.as_str(),
                is_active: draft.is_active,
            })
            .returning(MarketplaceRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Marketplace::try_from(row)
    }

    async fn update(
        &self,
        id: MarketplaceId,
        patch: &MarketplacePatch,
    ) -> Result<Marketplace, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        if patch.is_empty() {
            return find_marketplace(&mut conn, id)
                .await?
                .ok_or_else(|| marketplace_not_found(id));
        }

        let changes = MarketplaceChangeset {
            name: patch.name.as_deref(),
            account_id: patch.account_id.as_deref(),
            is_active: patch.is_active,
        };
        let row: MarketplaceRow = diesel::update(marketplaces::table.find(id))
            .set(&changes)
            .returning(MarketplaceRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| marketplace_not_found(id))?;

        Marketplace::try_from(row)
    }

    async fn mark_synced(
        &self,
        id: MarketplaceId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(marketplaces::table.find(id))
            .set(marketplaces::last_synced_at.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

/// Diesel-backed implementation of the `PricingRepository` port.
#[derive(Clone)]
pub struct DieselPricingRepository {
    pool: DbPool,
}

impl DieselPricingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn upsert_in_transaction(
    conn: &mut AsyncPgConnection,
    product_id: ProductId,
    marketplace_id: MarketplaceId,
    update: &MarketplacePriceUpdate,
) -> Result<MarketplacePrice, RepositoryError> {
    let product_exists: Option<ProductId> = products::table
        .find(product_id)
        .select(products::id)
        .first(conn)
        .await
        .optional()?;
    if product_exists.is_none() {
        return Err(RepositoryError::not_found(format!(
            "product {product_id} not found"
        )));
    }
    if find_marketplace(conn, marketplace_id).await?.is_none() {
        return Err(marketplace_not_found(marketplace_id));
    }

    diesel::insert_into(product_prices::table)
        .values(&NewProductPriceRow {
            product_id,
            marketplace_id,
            price: update.price,
            external_sku: update.external_sku.as_deref(),
            updated_at: Utc::now(),
        })
        .on_conflict((product_prices::product_id, product_prices::marketplace_id))
        .do_update()
        .set((
            product_prices::price.eq(excluded(product_prices::price)),
            product_prices::external_sku.eq(excluded(product_prices::external_sku)),
            product_prices::updated_at.eq(excluded(product_prices::updated_at)),
        ))
        .execute(conn)
        .await?;

    let row: PriceJoinRow = product_prices::table
        .inner_join(products::table)
        .filter(product_prices::product_id.eq(product_id))
        .filter(product_prices::marketplace_id.eq(marketplace_id))
        .select(PRICE_COLUMNS)
        .first(conn)
        .await?;
    Ok(MarketplacePrice::from(row))
}

#[async_trait]
impl PricingRepository for DieselPricingRepository {
    async fn list(
        &self,
        marketplace_id: Option<MarketplaceId>,
    ) -> Result<Vec<MarketplacePrice>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = product_prices::table
            .inner_join(products::table)
            .select(PRICE_COLUMNS)
            .order((products::sku.asc(), product_prices::marketplace_id.asc()))
            .into_boxed();
        if let Some(id) = marketplace_id {
            query = query.filter(product_prices::marketplace_id.eq(id));
        }
        let rows: Vec<PriceJoinRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(MarketplacePrice::from).collect())
    }

    async fn upsert(
        &self,
        product_id: ProductId,
        marketplace_id: MarketplaceId,
        update: &MarketplacePriceUpdate,
    ) -> Result<MarketplacePrice, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move { upsert_in_transaction(conn, product_id, marketplace_id, update).await }
                .scope_boxed()
        })
        .await
    }

    async fn listings(
        &self,
        marketplace_id: MarketplaceId,
    ) -> Result<Vec<SyncListing>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(ProductId, String, Option<String>, i64, Option<i32>)> =
            product_prices::table
                .inner_join(products::table.left_join(inventory::table))
                .filter(product_prices::marketplace_id.eq(marketplace_id))
                .filter(products::is_active.eq(true))
                .select((
                    products::id,
                    products::sku,
                    product_prices::external_sku,
                    product_prices::price,
                    inventory::quantity.nullable(),
                ))
                .order(products::sku.asc())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(product_id, sku, external_sku, price, stock)| SyncListing {
                product_id,
                offer_id: SyncListing::offer_id_for(&sku, external_sku.as_deref()),
                sku,
                price,
                stock: stock.unwrap_or(0),
            })
            .collect())
    }
}
