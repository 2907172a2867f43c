//! Seller analytics: rollup rebuilds, summaries and the hourly refresher.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeDelta};
use mockable::Clock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::ports::AnalyticsRepository;
use super::{AnalyticsSummary, DailyAnalytics, DateRange, Error, TopProduct};

/// How often the background rollup refreshes today and yesterday.
pub const ROLLUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Arc<dyn AnalyticsRepository>,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn AnalyticsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Recompute the stored rollup of `day`.
    pub async fn rebuild(&self, day: NaiveDate) -> Result<DailyAnalytics, Error> {
        let rollup = self.repository.rebuild_day(day).await?;
        info!(
            %day,
            orders = rollup.orders_count,
            revenue = rollup.revenue,
            "analytics day rebuilt"
        );
        Ok(rollup)
    }

    /// Totals and a zero-filled per-day series for `range`.
    pub async fn summary(&self, range: DateRange) -> Result<AnalyticsSummary, Error> {
        let rows = self.repository.daily(range).await?;
        Ok(AnalyticsSummary::from_days(range, rows))
    }

    pub async fn top_products(
        &self,
        range: DateRange,
        limit: u32,
    ) -> Result<Vec<TopProduct>, Error> {
        Ok(self.repository.top_products(range, limit).await?)
    }

    /// Rebuild yesterday and today. Failures are logged per day.
    pub async fn refresh_recent(&self) {
        let today = self.clock.utc().date_naive();
        let days = [today - TimeDelta::days(1), today];
        for day in days {
            if let Err(error) = self.repository.rebuild_day(day).await {
                warn!(%error, %day, "analytics rollup failed");
            }
        }
        debug!(%today, "analytics rollup refreshed");
    }

    /// Refresh every `period` until `shutdown` flips to `true` or its sender
    /// is dropped.
    pub async fn run_rollup(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh_recent().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("analytics rollup stopped");
                        return;
                    }
                }
            }
        }
    }
}
