//! Push storefront prices and stock to external marketplaces.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{MarketplaceClients, MarketplaceRepository, PricingRepository};
use super::{Error, MarketplaceId, SyncFailure, SyncReport};

/// Sequential per-listing sync; one failed listing never aborts the run.
#[derive(Clone)]
pub struct MarketplaceSyncService {
    marketplaces: Arc<dyn MarketplaceRepository>,
    pricing: Arc<dyn PricingRepository>,
    clients: MarketplaceClients,
    clock: Arc<dyn Clock>,
}

impl MarketplaceSyncService {
    pub fn new(
        marketplaces: Arc<dyn MarketplaceRepository>,
        pricing: Arc<dyn PricingRepository>,
        clients: MarketplaceClients,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            marketplaces,
            pricing,
            clients,
            clock,
        }
    }

    /// Sync every priced listing of marketplace `id`.
    ///
    /// # Errors
    ///
    /// `not_found` for an unknown marketplace, `conflict` when it is
    /// disabled and `service_unavailable` when no credentials are configured
    /// for its code.
    pub async fn sync(&self, id: MarketplaceId) -> Result<SyncReport, Error> {
        let marketplace = self
            .marketplaces
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("marketplace {id} not found")))?;
        if !marketplace.is_active {
            return Err(Error::conflict(format!("marketplace {id} is disabled")));
        }
        let client = self.clients.get(marketplace.code).ok_or_else(|| {
            Error::service_unavailable(format!(
                "{} credentials are not configured",
                marketplace.code
            ))
        })?;

        let listings = self.pricing.listings(id).await?;
        let mut succeeded = 0_u32;
        let mut failed = Vec::new();
        for listing in &listings {
            match client.push_listing(&marketplace.account_id, listing).await {
                Ok(()) => succeeded += 1,
                Err(error) => {
                    warn!(
                        %error,
                        marketplace_id = id,
                        sku = %listing.sku,
                        "marketplace listing sync failed"
                    );
                    failed.push(SyncFailure {
                        sku: listing.sku.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let synced_at = self.clock.utc();
        if succeeded > 0 {
            self.marketplaces.mark_synced(id, synced_at).await?;
        }
        let report = SyncReport {
            marketplace_id: id,
            attempted: u32::try_from(listings.len()).unwrap_or(u32::MAX),
            succeeded,
            failed,
            synced_at,
        };
        info!(
            marketplace_id = id,
            code = %marketplace.code,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "marketplace sync finished"
        );
        Ok(report)
    }
}
