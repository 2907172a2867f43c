//! Uzum Market seller API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use zeroize::Zeroizing;

use super::dto::{UzumPriceData, UzumStockUpdates};
use super::{endpoint, send_json};
use crate::domain::SyncListing;
use crate::domain::ports::{MarketplaceClient, MarketplaceClientError};

/// Pushes SKU prices and FBS stocks to an Uzum shop.
pub struct UzumClient {
    client: Client,
    base_url: String,
    token: Zeroizing<String>,
}

impl fmt::Debug for UzumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UzumClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl UzumClient {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: Zeroizing::new(token.into()),
        })
    }

    fn prices_url(&self, shop_id: &str) -> String {
        endpoint(&self.base_url, &format!("v1/product/{shop_id}/sendPriceData"))
    }

    fn stocks_url(&self) -> String {
        endpoint(&self.base_url, "v2/fbs/sku/stocks")
    }
}

#[async_trait]
impl MarketplaceClient for UzumClient {
    async fn push_listing(
        &self,
        account_id: &str,
        listing: &SyncListing,
    ) -> Result<(), MarketplaceClientError> {
        send_json(
            self.client
                .post(self.prices_url(account_id))
                .header(reqwest::header::AUTHORIZATION, self.token.as_str()),
            &UzumPriceData::single(listing),
        )
        .await?;
        send_json(
            self.client
                .post(self.stocks_url())
                .header(reqwest::header::AUTHORIZATION, self.token.as_str()),
            &UzumStockUpdates::single(listing),
        )
        .await
    }
}
