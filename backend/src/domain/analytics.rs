//! Daily sales rollups.

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use utoipa::ToSchema;

use super::catalog::ProductId;
use super::validation::FieldError;

/// Longest range accepted by summary queries, in days.
pub const MAX_RANGE_DAYS: i64 = 366;
/// Default number of rows returned by top-product queries.
pub const DEFAULT_TOP_PRODUCTS: u32 = 10;
/// Upper bound for top-product queries.
pub const MAX_TOP_PRODUCTS: u32 = 50;

/// Totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyAnalytics {
    pub day: NaiveDate,
    /// Orders created that day, cancelled ones included.
    pub orders_count: i32,
    pub cancelled_count: i32,
    /// Units sold in orders that were not cancelled.
    pub items_sold: i32,
    /// Revenue from orders that were not cancelled.
    pub revenue: i64,
    /// Users whose first order was placed that day.
    pub new_customers: i32,
}

impl DailyAnalytics {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            orders_count: 0,
            cancelled_count: 0,
            items_sold: 0,
            revenue: 0,
            new_customers: 0,
        }
    }
}

/// Per-product totals across a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: i64,
}

/// Inclusive day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Require `from <= to` and at most [`MAX_RANGE_DAYS`] days.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, FieldError> {
        if from > to {
            return Err(FieldError::out_of_range(
                "from",
                "from must not be after to",
            )
            .with_value(from));
        }
        if to.signed_duration_since(from) >= TimeDelta::days(MAX_RANGE_DAYS) {
            return Err(FieldError::out_of_range(
                "to",
                format!("range must not exceed {MAX_RANGE_DAYS} days"),
            )
            .with_value(to));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }
}

/// Validate a top-products limit, defaulting when absent.
pub fn top_products_limit(limit: Option<u32>) -> Result<u32, FieldError> {
    let limit = limit.unwrap_or(DEFAULT_TOP_PRODUCTS);
    if !(1..=MAX_TOP_PRODUCTS).contains(&limit) {
        return Err(FieldError::out_of_range(
            "limit",
            format!("limit must be between 1 and {MAX_TOP_PRODUCTS}"),
        )
        .with_value(limit));
    }
    Ok(limit)
}

/// Totals and per-day series for a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnalyticsSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub orders_count: i64,
    pub cancelled_count: i64,
    pub items_sold: i64,
    pub revenue: i64,
    pub new_customers: i64,
    /// Revenue per completed (not cancelled) order, rounded down.
    pub average_order_value: i64,
    /// One entry per day; days without a rollup are zero-filled.
    pub days: Vec<DailyAnalytics>,
}

impl AnalyticsSummary {
    pub fn from_days(range: DateRange, rows: Vec<DailyAnalytics>) -> Self {
        let days: Vec<DailyAnalytics> = range
            .days()
            .map(|day| {
                rows.iter()
                    .find(|row| row.day == day)
                    .cloned()
                    .unwrap_or_else(|| DailyAnalytics::empty(day))
            })
            .collect();
        let sum = |f: fn(&DailyAnalytics) -> i64| days.iter().map(f).sum::<i64>();
        let orders_count = sum(|d| i64::from(d.orders_count));
        let cancelled_count = sum(|d| i64::from(d.cancelled_count));
        let items_sold = sum(|d| i64::from(d.items_sold));
        let new_customers = sum(|d| i64::from(d.new_customers));
        let revenue = sum(|d| d.revenue);
        let completed = orders_count - cancelled_count;
        Self {
            from: range.from(),
            to: range.to(),
            orders_count,
            cancelled_count,
            items_sold,
            revenue,
            new_customers,
            average_order_value: revenue.checked_div(completed).unwrap_or(0),
            days,
        }
    }
}
