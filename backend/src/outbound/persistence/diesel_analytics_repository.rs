//! PostgreSQL-backed `AnalyticsRepository` implementation using Diesel ORM.
//!
//! A day is rebuilt from its orders in one transaction: the previous
//! `daily_analytics` and `product_analytics` rows are deleted and replaced.
//! Cancelled orders count towards `cancelled_count` only.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{AnalyticsRepository, RepositoryError};
use crate::domain::{DailyAnalytics, DateRange, OrderStatus, ProductId, TopProduct, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{DailyAnalyticsRow, ProductAnalyticsRow};
use super::pool::DbPool;
use super::schema::{daily_analytics, order_items, orders, product_analytics, products};

/// Diesel-backed implementation of the `AnalyticsRepository` port.
#[derive(Clone)]
pub struct DieselAnalyticsRepository {
    pool: DbPool,
}

impl DieselAnalyticsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + TimeDelta::days(1))
}

fn saturating_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Per-product totals for one day from `(product_id, quantity, line_total)`
/// rows of orders that were not cancelled.
fn product_totals(day: NaiveDate, sold: &[(ProductId, i32, i64)]) -> Vec<ProductAnalyticsRow> {
    let mut totals: BTreeMap<ProductId, (i64, i64)> = BTreeMap::new();
    for &(product_id, quantity, line_total) in sold {
        let entry = totals.entry(product_id).or_default();
        entry.0 += i64::from(quantity);
        entry.1 += line_total;
    }
    totals
        .into_iter()
        .map(|(product_id, (quantity, revenue))| ProductAnalyticsRow {
            day,
            product_id,
            quantity_sold: saturating_i32(quantity),
            revenue,
        })
        .collect()
}

/// Rank products by revenue, then units, then id, keeping `limit` entries.
fn rank_products(rows: Vec<(ProductId, i32, i64, String, String)>, limit: u32) -> Vec<TopProduct> {
    let mut totals: HashMap<ProductId, TopProduct> = HashMap::new();
    for (product_id, quantity, revenue, sku, name) in rows {
        let entry = totals.entry(product_id).or_insert_with(|| TopProduct {
            product_id,
            sku,
            name,
            quantity_sold: 0,
            revenue: 0,
        });
        entry.quantity_sold += i64::from(quantity);
        entry.revenue += revenue;
    }
    let mut ranked: Vec<TopProduct> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then(b.quantity_sold.cmp(&a.quantity_sold))
            .then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    ranked
}

async fn rebuild_in_transaction(
    conn: &mut AsyncPgConnection,
    day: NaiveDate,
) -> Result<DailyAnalytics, RepositoryError> {
    let (start, end) = day_bounds(day);
    let cancelled = OrderStatus::Cancelled.as_str();

    let day_orders: Vec<(UserId, String)> = orders::table
        .filter(orders::created_at.ge(start))
        .filter(orders::created_at.lt(end))
        .select((orders::user_id, orders::status))
        .load(conn)
        .await?;
    let cancelled_count = day_orders
        .iter()
        .filter(|(_, status)| status == cancelled)
        .count();

    let sold: Vec<(ProductId, i32, i64)> = order_items::table
        .inner_join(orders::table)
        .filter(orders::created_at.ge(start))
        .filter(orders::created_at.lt(end))
        .filter(orders::status.ne(cancelled))
        .select((
            order_items::product_id,
            order_items::quantity,
            order_items::line_total,
        ))
        .load(conn)
        .await?;

    let customers: HashSet<UserId> = day_orders.iter().map(|(user_id, _)| *user_id).collect();
    let customer_ids: Vec<UserId> = customers.iter().copied().collect();
    let returning: HashSet<UserId> = orders::table
        .filter(orders::user_id.eq_any(&customer_ids))
        .filter(orders::created_at.lt(start))
        .select(orders::user_id)
        .distinct()
        .load::<UserId>(conn)
        .await?
        .into_iter()
        .collect();

    let product_rows = product_totals(day, &sold);
    let rollup = DailyAnalyticsRow {
        day,
        orders_count: saturating_i32(i64::try_from(day_orders.len()).unwrap_or(i64::MAX)),
        cancelled_count: saturating_i32(i64::try_from(cancelled_count).unwrap_or(i64::MAX)),
        items_sold: saturating_i32(product_rows.iter().map(|row| i64::from(row.quantity_sold)).sum()),
        revenue: product_rows.iter().map(|row| row.revenue).sum(),
        new_customers: saturating_i32(
            i64::try_from(customers.difference(&returning).count()).unwrap_or(i64::MAX),
        ),
    };

    diesel::delete(daily_analytics::table.filter(daily_analytics::day.eq(day)))
        .execute(conn)
        .await?;
    diesel::insert_into(daily_analytics::table)
        .values(&rollup)
        .execute(conn)
        .await?;
    diesel::delete(product_analytics::table.filter(product_analytics::day.eq(day)))
        .execute(conn)
        .await?;
    if !product_rows.is_empty() {
        diesel::insert_into(product_analytics::table)
            .values(&product_rows)
            .execute(conn)
            .await?;
    }

    Ok(DailyAnalytics::from(rollup))
}

#[async_trait]
impl AnalyticsRepository for DieselAnalyticsRepository {
    async fn rebuild_day(&self, day: NaiveDate) -> Result<DailyAnalytics, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move { rebuild_in_transaction(conn, day).await }.scope_boxed()
        })
        .await
    }

    async fn daily(&self, range: DateRange) -> Result<Vec<DailyAnalytics>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DailyAnalyticsRow> = daily_analytics::table
            .filter(daily_analytics::day.between(range.from(), range.to()))
            .select(DailyAnalyticsRow::as_select())
            .order(daily_analytics::day.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(DailyAnalytics::from).collect())
    }

    async fn top_products(
        &self,
        range: DateRange,
        limit: u32,
    ) -> Result<Vec<TopProduct>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(ProductId, i32, i64, String, String)> = product_analytics::table
            .inner_join(products::table)
            .filter(product_analytics::day.between(range.from(), range.to()))
            .select((
                product_analytics::product_id,
                product_analytics::quantity_sold,
                product_analytics::revenue,
                products::sku,
                products::name_ru,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rank_products(rows, limit))
    }
}
