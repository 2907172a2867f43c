//! Stock mutations shared by the order, purchase and inventory adapters.
//!
//! Every helper runs on a connection that is already inside a transaction
//! and records the matching `inventory_movements` row.

use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::RepositoryError;
use crate::domain::{MovementKind, ProductId, StockShortage};

use super::models::{NewInventoryRow, NewMovementRow};
use super::schema::{inventory, inventory_movements};

/// Movement metadata written alongside a stock change.
pub(crate) struct Movement<'a> {
    pub kind: MovementKind,
    pub reference: Option<String>,
    pub note: Option<&'a str>,
}

async fn record(
    conn: &mut AsyncPgConnection,
    product_id: ProductId,
    delta: i32,
    movement: Movement<'_>,
) -> Result<(), RepositoryError> {
    diesel::insert_into(inventory_movements::table)
        .values(&NewMovementRow {
            product_id,
            kind: movement.kind.as_str(),
            quantity_delta: delta,
            reference: movement.reference,
            note: movement.note,
        })
        .execute(conn)
        .await?;
    Ok(())
}

/// Lock the inventory rows of `product_ids` in ascending order and return
/// their quantities. Products without a row are absent from the result.
pub(crate) async fn lock_quantities(
    conn: &mut AsyncPgConnection,
    product_ids: &[ProductId],
) -> Result<Vec<(ProductId, i32)>, RepositoryError> {
    let rows = inventory::table
        .filter(inventory::product_id.eq_any(product_ids))
        .select((inventory::product_id, inventory::quantity))
        .order(inventory::product_id.asc())
        .for_update()
        .load(conn)
        .await?;
    Ok(rows)
}

/// Borrow `lines` sorted by product id, the order `lock_quantities` takes
/// row locks in. Lines for the same product keep their relative order.
pub(crate) fn in_lock_order<T>(
    lines: &[T],
    product_id: impl Fn(&T) -> ProductId,
) -> Vec<&T> {
    let mut ordered: Vec<&T> = lines.iter().collect();
    ordered.sort_by_key(|line| product_id(line));
    ordered
}

/// Add `quantity` units, creating the inventory row when missing.
pub(crate) async fn increase(
    conn: &mut AsyncPgConnection,
    product_id: ProductId,
    quantity: i32,
    movement: Movement<'_>,
) -> Result<i32, RepositoryError> {
    let now = Utc::now();
    let updated: i32 = diesel::insert_into(inventory::table)
        .values(&NewInventoryRow {
            product_id,
            quantity,
        })
        .on_conflict(inventory::product_id)
        .do_update()
        .set((
            inventory::quantity.eq(inventory::quantity + excluded(inventory::quantity)),
            inventory::updated_at.eq(now),
        ))
        .returning(inventory::quantity)
        .get_result(conn)
        .await?;
    record(conn, product_id, quantity, movement).await?;
    Ok(updated)
}

/// Apply a signed change to a row locked by the caller. The result must
/// stay non-negative.
pub(crate) async fn apply_delta(
    conn: &mut AsyncPgConnection,
    product_id: ProductId,
    available: i32,
    delta: i32,
    movement: Movement<'_>,
) -> Result<i32, RepositoryError> {
    let remaining = available
        .checked_add(delta)
        .filter(|remaining| *remaining >= 0)
        .ok_or(StockShortage {
            product_id,
            available,
            requested: delta.saturating_neg(),
        })?;
    diesel::update(inventory::table.find(product_id))
        .set((
            inventory::quantity.eq(remaining),
            inventory::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await?;
    record(conn, product_id, delta, movement).await?;
    Ok(remaining)
}
