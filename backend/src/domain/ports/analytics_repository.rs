//! Port for analytics rollups.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{DailyAnalytics, DateRange, TopProduct};

use super::RepositoryError;

/// Rollup storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Recompute `daily_analytics` and `product_analytics` for `day` from
    /// orders in one transaction, replacing earlier rows.
    async fn rebuild_day(&self, day: NaiveDate) -> Result<DailyAnalytics, RepositoryError>;

    /// Stored rollups inside `range`, ordered by day.
    async fn daily(&self, range: DateRange) -> Result<Vec<DailyAnalytics>, RepositoryError>;

    /// Best sellers by revenue inside `range`.
    async fn top_products(
        &self,
        range: DateRange,
        limit: u32,
    ) -> Result<Vec<TopProduct>, RepositoryError>;
}
