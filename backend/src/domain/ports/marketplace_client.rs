//! Port for pushing prices and stock to an external marketplace.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{MarketplaceCode, SyncListing};

use super::define_port_error;

define_port_error! {
    /// Errors raised by marketplace API adapters.
    pub enum MarketplaceClientError {
        /// The partner API could not be reached.
        Transport { message: String } => "marketplace request failed: {message}",
        /// The partner API answered with a non-success status.
        Status { status: u16, body: String } =>
            "marketplace responded with status {status}: {body}",
    }
}

/// Client for one marketplace's partner API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Push price and stock of one listing to `account_id`.
    async fn push_listing(
        &self,
        account_id: &str,
        listing: &SyncListing,
    ) -> Result<(), MarketplaceClientError>;
}

/// Clients for the marketplaces that have credentials configured.
#[derive(Clone, Default)]
pub struct MarketplaceClients {
    clients: HashMap<MarketplaceCode, Arc<dyn MarketplaceClient>>,
}

impl MarketplaceClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: MarketplaceCode, client: Arc<dyn MarketplaceClient>) -> Self {
        self.clients.insert(code, client);
        self
    }

    /// `None` when the marketplace has no credentials configured.
    pub fn get(&self, code: MarketplaceCode) -> Option<Arc<dyn MarketplaceClient>> {
        self.clients.get(&code).cloned()
    }
}

impl std::fmt::Debug for MarketplaceClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceClients")
            .field("configured", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}
