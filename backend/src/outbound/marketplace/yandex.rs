//! Yandex Market partner API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use zeroize::Zeroizing;

use super::dto::{YandexPriceUpdates, YandexStockUpdates};
use super::{endpoint, send_json};
use crate::domain::SyncListing;
use crate::domain::ports::{MarketplaceClient, MarketplaceClientError};

/// Pushes offer prices and stocks to a Yandex Market campaign.
pub struct YandexClient {
    client: Client,
    base_url: String,
    api_key: Zeroizing<String>,
}

impl fmt::Debug for YandexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YandexClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl YandexClient {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: Zeroizing::new(api_key.into()),
        })
    }

    fn prices_url(&self, campaign_id: &str) -> String {
        endpoint(
            &self.base_url,
            &format!("campaigns/{campaign_id}/offer-prices/updates"),
        )
    }

    fn stocks_url(&self, campaign_id: &str) -> String {
        endpoint(&self.base_url, &format!("campaigns/{campaign_id}/offers/stocks"))
    }
}

#[async_trait]
impl MarketplaceClient for YandexClient {
    async fn push_listing(
        &self,
        account_id: &str,
        listing: &SyncListing,
    ) -> Result<(), MarketplaceClientError> {
        send_json(
            self.client
                .post(self.prices_url(account_id))
                .header("Api-Key", self.api_key.as_str()),
            &YandexPriceUpdates::single(listing),
        )
        .await?;
        send_json(
            self.client
                .put(self.stocks_url(account_id))
                .header("Api-Key", self.api_key.as_str()),
            &YandexStockUpdates::single(listing),
        )
        .await
    }
}
