//! PostgreSQL-backed inventory and purchase adapters using Diesel ORM.
//!
//! Manual adjustments and supplier purchases each run in one transaction
//! that changes `inventory` and appends to `inventory_movements`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{PageRequest, Paginated};

use crate::domain::ports::{InventoryRepository, PurchaseRepository, RepositoryError};
use crate::domain::{
    InventoryFilter, InventoryItem, InventoryMovement, MovementKind, ProductId, Purchase,
    PurchaseDraft, PurchaseId, StockAdjustment, StockShortage,
};

use super::diesel_error_mapping::{count_to_total, map_diesel_error, map_pool_error};
use super::diesel_stock::{Movement, apply_delta, in_lock_order, increase, lock_quantities};
use super::models::{
    InventoryJoinRow, MovementRow, NewPurchaseRow, PurchaseItemRow, PurchaseRow,
};
use super::pool::DbPool;
use super::schema::{inventory, inventory_movements, products, purchase_items, purchases};

type InventoryColumns = (
    inventory::product_id,
    inventory::quantity,
    inventory::reserved,
    inventory::low_stock_threshold,
    inventory::updated_at,
    products::sku,
    products::name_ru,
);

const INVENTORY_COLUMNS: InventoryColumns = (
    inventory::product_id,
    inventory::quantity,
    inventory::reserved,
    inventory::low_stock_threshold,
    inventory::updated_at,
    products::sku,
    products::name_ru,
);

async fn ensure_products_exist(
    conn: &mut AsyncPgConnection,
    ids: &[ProductId],
) -> Result<(), RepositoryError> {
    let found: HashSet<ProductId> = products::table
        .filter(products::id.eq_any(ids))
        .select(products::id)
        .load::<ProductId>(conn)
        .await?
        .into_iter()
        .collect();
    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(RepositoryError::not_found(format!(
            "product {missing} not found"
        ))),
        None => Ok(()),
    }
}

async fn load_item(
    conn: &mut AsyncPgConnection,
    product_id: ProductId,
) -> Result<InventoryItem, RepositoryError> {
    let row: InventoryJoinRow = inventory::table
        .inner_join(products::table)
        .filter(inventory::product_id.eq(product_id))
        .select(INVENTORY_COLUMNS)
        .first(conn)
        .await?;
    Ok(InventoryItem::from(row))
}

async fn adjust_in_transaction(
    conn: &mut AsyncPgConnection,
    product_id: ProductId,
    adjustment: &StockAdjustment,
) -> Result<InventoryItem, RepositoryError> {
    ensure_products_exist(conn, &[product_id]).await?;
    let movement = Movement {
        kind: MovementKind::Adjustment,
        reference: None,
        note: adjustment.note.as_deref(),
    };
    let locked = lock_quantities(conn, &[product_id]).await?;
    match <[_]>::first(&locked) {
        Some(&(_, available)) => {
            apply_delta(conn, product_id, available, adjustment.delta, movement).await?;
        }
        None if adjustment.delta > 0 => {
            increase(conn, product_id, adjustment.delta, movement).await?;
        }
        None => {
            return Err(StockShortage {
                product_id,
                available: 0,
                requested: adjustment.delta.saturating_neg(),
            }
            .into());
        }
    }
    load_item(conn, product_id).await
}

/// Diesel-backed implementation of the `InventoryRepository` port.
#[derive(Clone)]
pub struct DieselInventoryRepository {
    pool: DbPool,
}

impl DieselInventoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for DieselInventoryRepository {
    async fn list(
        &self,
        filter: InventoryFilter,
        page: PageRequest,
    ) -> Result<Paginated<InventoryItem>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let include_all = !filter.low_stock;

        let total: i64 = inventory::table
            .inner_join(products::table)
            .filter(
                inventory::quantity
                    .le(inventory::low_stock_threshold)
                    .or(include_all.into_sql::<Bool>()),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<InventoryJoinRow> = inventory::table
            .inner_join(products::table)
            .filter(
                inventory::quantity
                    .le(inventory::low_stock_threshold)
                    .or(include_all.into_sql::<Bool>()),
            )
            .select(INVENTORY_COLUMNS)
            .order(products::sku.asc())
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Paginated::new(
            rows.into_iter().map(InventoryItem::from).collect(),
            page,
            count_to_total(total),
        ))
    }

    async fn adjust(
        &self,
        product_id: ProductId,
        adjustment: &StockAdjustment,
    ) -> Result<InventoryItem, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move { adjust_in_transaction(conn, product_id, adjustment).await }.scope_boxed()
        })
        .await
    }

    async fn movements(
        &self,
        product_id: ProductId,
        page: PageRequest,
    ) -> Result<Paginated<InventoryMovement>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = inventory_movements::table
            .filter(inventory_movements::product_id.eq(product_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<MovementRow> = inventory_movements::table
            .filter(inventory_movements::product_id.eq(product_id))
            .select(MovementRow::as_select())
            .order((
                inventory_movements::created_at.desc(),
                inventory_movements::id.desc(),
            ))
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let movements = rows
            .into_iter()
            .map(InventoryMovement::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(movements, page, count_to_total(total)))
    }

    async fn set_threshold(
        &self,
        product_id: ProductId,
        threshold: i32,
    ) -> Result<InventoryItem, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move {
                ensure_products_exist(conn, &[product_id]).await?;
                diesel::insert_into(inventory::table)
                    .values((
                        inventory::product_id.eq(product_id),
                        inventory::quantity.eq(0),
                        inventory::low_stock_threshold.eq(threshold),
                    ))
                    .on_conflict(inventory::product_id)
                    .do_update()
                    .set(inventory::low_stock_threshold.eq(excluded(inventory::low_stock_threshold)))
                    .execute(conn)
                    .await?;
                load_item(conn, product_id).await
            }
            .scope_boxed()
        })
        .await
    }
}

/// Diesel-backed implementation of the `PurchaseRepository` port.
#[derive(Clone)]
pub struct DieselPurchaseRepository {
    pool: DbPool,
}

impl DieselPurchaseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn load_purchase_items(
    conn: &mut AsyncPgConnection,
    purchase_ids: &[PurchaseId],
) -> Result<HashMap<PurchaseId, Vec<PurchaseItemRow>>, RepositoryError> {
    let rows: Vec<PurchaseItemRow> = purchase_items::table
        .filter(purchase_items::purchase_id.eq_any(purchase_ids))
        .select(PurchaseItemRow::as_select())
        .order((purchase_items::purchase_id.asc(), purchase_items::id.asc()))
        .load(conn)
        .await?;
    let mut grouped: HashMap<PurchaseId, Vec<PurchaseItemRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.purchase_id).or_default().push(row);
    }
    Ok(grouped)
}

async fn create_in_transaction(
    conn: &mut AsyncPgConnection,
    draft: &PurchaseDraft,
) -> Result<Purchase, RepositoryError> {
    let product_ids: Vec<ProductId> = draft.items.iter().map(|item| item.product_id).collect();
    ensure_products_exist(conn, &product_ids).await?;

    let purchase: PurchaseRow = diesel::insert_into(purchases::table)
        .values(&NewPurchaseRow {
            supplier: draft.supplier.as_deref(),
            note: draft.note.as_deref(),
            total_cost: draft.total_cost(),
        })
        .returning(PurchaseRow::as_returning())
        .get_result(conn)
        .await?;

    let rows: Vec<PurchaseItemRow> = draft
        .items
        .iter()
        .map(|item| PurchaseItemRow {
            purchase_id: purchase.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_cost: item.unit_cost,
        })
        .collect();
    diesel::insert_into(purchase_items::table)
        .values(&rows)
        .execute(conn)
        .await?;

    for item in in_lock_order(&draft.items, |item| item.product_id) {
        increase(
            conn,
            item.product_id,
            item.quantity,
            Movement {
                kind: MovementKind::Purchase,
                reference: Some(purchase.id.to_string()),
                note: draft.supplier.as_deref(),
            },
        )
        .await?;
    }

    Ok(purchase.into_purchase(rows))
}

#[async_trait]
impl PurchaseRepository for DieselPurchaseRepository {
    async fn create(&self, draft: &PurchaseDraft) -> Result<Purchase, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move { create_in_transaction(conn, draft).await }.scope_boxed()
        })
        .await
    }

    async fn list(&self, page: PageRequest) -> Result<Paginated<Purchase>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = purchases::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<PurchaseRow> = purchases::table
            .select(PurchaseRow::as_select())
            .order((purchases::created_at.desc(), purchases::id.desc()))
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<PurchaseId> = rows.iter().map(|row| row.id).collect();
        let mut items = load_purchase_items(&mut conn, &ids).await?;
        let purchases = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_purchase(lines)
            })
            .collect();
        Ok(Paginated::new(purchases, page, count_to_total(total)))
    }

    async fn find(&self, id: PurchaseId) -> Result<Option<Purchase>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PurchaseRow> = purchases::table
            .find(id)
            .select(PurchaseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        match row {
            Some(row) => {
                let lines = load_purchase_items(&mut conn, &[id])
                    .await?
                    .remove(&id)
                    .unwrap_or_default();
                Ok(Some(row.into_purchase(lines)))
            }
            None => Ok(None),
        }
    }
}
