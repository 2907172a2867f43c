//! PostgreSQL-backed `CatalogRepository` implementation using Diesel ORM.
//!
//! Storefront reads only ever see active rows. Deleting a product only hides
//! it so existing order items keep their reference; deleting a category
//! detaches its products first.

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::{PageRequest, Paginated};

use crate::domain::ports::{CatalogRepository, RepositoryError};
use crate::domain::{
    Banner, BannerDraft, BannerId, Category, CategoryDraft, CategoryId, MovementKind, Pricing,
    Product, ProductDraft, ProductFilter, ProductId,
};

use super::diesel_error_mapping::{count_to_total, map_diesel_error, map_pool_error};
use super::models::{
    BannerRow, CategoryRow, CategoryValues, NewBannerRow, NewInventoryRow, NewMovementRow,
    ProductRow, ProductValues,
};
use super::pool::DbPool;
use super::schema::{banners, categories, inventory, inventory_movements, products};

/// Diesel-backed implementation of the `CatalogRepository` port.
#[derive(Clone)]
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn active_products(filter: &ProductFilter) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table
        .filter(products::is_active.eq(true))
        .into_boxed();
    if let Some(category_id) = filter.category_id {
        query = query.filter(products::category_id.eq(category_id));
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = contains_pattern(search);
        query = query.filter(
            products::name_ru
                .ilike(pattern.clone())
                .or(products::name_uz.ilike(pattern.clone()))
                .or(products::sku.ilike(pattern)),
        );
    }
    query
}

fn product_values(draft: &ProductDraft) -> ProductValues<'_> {
    ProductValues {
        sku: draft.sku.as_str(),
        name_ru: draft.name_ru.as_str(),
        name_uz: draft.name_uz.as_str(),
        description_ru: draft.description_ru.as_deref(),
        description_uz: draft.description_uz.as_deref(),
        price: draft.pricing.price(),
        sale_price: draft.pricing.sale_price(),
        category_id: draft.category_id,
        image_url: draft.image_url.as_deref(),
        is_active: draft.is_active,
        updated_at: Utc::now(),
    }
}

fn category_values(draft: &CategoryDraft) -> CategoryValues<'_> {
    CategoryValues {
        name_ru: draft.name_ru.as_str(),
        name_uz: draft.name_uz.as_str(),
        image_url: draft.image_url.as_deref(),
        sort_order: draft.sort_order,
        is_active: draft.is_active,
    }
}

fn product_not_found(id: ProductId) -> RepositoryError {
    RepositoryError::not_found(format!("product {id} not found"))
}

#[async_trait]
impl CatalogRepository for DieselCatalogRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CategoryRow> = categories::table
            .filter(categories::is_active.eq(true))
            .select(CategoryRow::as_select())
            .order((categories::sort_order.asc(), categories::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Paginated<Product>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = active_products(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ProductRow> = active_products(filter)
            .select(ProductRow::as_select())
            .order(products::id.desc())
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Paginated::new(
            rows.into_iter().map(Product::from).collect(),
            page,
            count_to_total(total),
        ))
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ProductRow> = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Product::from))
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let values = product_values(draft);
        let initial_stock = draft.initial_stock;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move {
                let row: ProductRow = diesel::insert_into(products::table)
                    .values(&values)
                    .returning(ProductRow::as_returning())
                    .get_result(conn)
                    .await?;

                diesel::insert_into(inventory::table)
                    .values(&NewInventoryRow {
                        product_id: row.id,
                        quantity: initial_stock,
                    })
                    .execute(conn)
                    .await?;

                if initial_stock > 0 {
                    diesel::insert_into(inventory_movements::table)
                        .values(&NewMovementRow {
                            product_id: row.id,
                            kind: MovementKind::Adjustment.as_str(),
                            quantity_delta: initial_stock,
                            reference: None,
                            note: Some("initial stock"),
                        })
                        .execute(conn)
                        .await?;
                }

                Ok(Product::from(row))
            }
            .scope_boxed()
        })
        .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(products::table.find(id))
            .set(&product_values(draft))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Product::from)
            .ok_or_else(|| product_not_found(id))
    }

    async fn deactivate_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(products::table.find(id))
            .set((
                products::is_active.eq(false),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(product_not_found(id));
        }
        Ok(())
    }

    async fn update_pricing(
        &self,
        id: ProductId,
        pricing: Pricing,
    ) -> Result<Product, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(products::table.find(id))
            .set((
                products::price.eq(pricing.price()),
                products::sale_price.eq(pricing.sale_price()),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Product::from)
            .ok_or_else(|| product_not_found(id))
    }

    async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(categories::table)
            .values(&category_values(draft))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(Category::from)
            .map_err(map_diesel_error)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(categories::table.find(id))
            .set(&category_values(draft))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(Category::from)
            .ok_or_else(|| RepositoryError::not_found(format!("category {id} not found")))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move {
                diesel::update(products::table.filter(products::category_id.eq(id)))
                    .set((
                        products::category_id.eq(None::<i64>),
                        products::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
                    .await?;
                let deleted = diesel::delete(categories::table.find(id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(RepositoryError::not_found(format!(
                        "category {id} not found"
                    )));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn list_banners(&self) -> Result<Vec<Banner>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BannerRow> = banners::table
            .filter(banners::is_active.eq(true))
            .select(BannerRow::as_select())
            .order((banners::sort_order.asc(), banners::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Banner::from).collect())
    }

    async fn create_banner(&self, draft: &BannerDraft) -> Result<Banner, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let values = NewBannerRow {
            title_ru: draft.title_ru.as_str(),
            title_uz: draft.title_uz.as_str(),
            image_url: draft.image_url.as_str(),
            link_url: draft.link_url.as_deref(),
            sort_order: draft.sort_order,
            is_active: draft.is_active,
        };

        diesel::insert_into(banners::table)
            .values(&values)
            .returning(BannerRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(Banner::from)
            .map_err(map_diesel_error)
    }

    async fn delete_banner(&self, id: BannerId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(banners::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if deleted == 0 {
            return Err(RepositoryError::not_found(format!("banner {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Search pattern escaping.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("мёд", "%мёд%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    fn search_terms_match_literally(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(term), expected);
    }
}
