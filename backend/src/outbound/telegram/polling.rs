//! Long-polling loop feeding `getUpdates` results to the update handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use super::TelegramBotClient;
use crate::domain::ports::BotNotifierError;
use crate::domain::{BotUpdate, BotUpdateHandler, TraceId};

/// Server-side wait of one `getUpdates` call.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(25);
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Source of bot updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<BotUpdate>, BotNotifierError>;
}

#[async_trait]
impl UpdateSource for TelegramBotClient {
    async fn fetch(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<BotUpdate>, BotNotifierError> {
        self.get_updates(offset, timeout).await
    }
}

/// Polls for updates until shutdown is signalled.
pub struct BotPoller {
    source: Arc<dyn UpdateSource>,
    handler: BotUpdateHandler,
    timeout: Duration,
}

impl BotPoller {
    pub fn new(source: Arc<dyn UpdateSource>, handler: BotUpdateHandler) -> Self {
        Self {
            source,
            handler,
            timeout: POLL_TIMEOUT,
        }
    }

    /// Override the `getUpdates` wait.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch one batch, handle it, and return the offset for the next call.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the offset is unchanged in that case.
    pub async fn poll_once(&self, offset: Option<i64>) -> Result<Option<i64>, BotNotifierError> {
        let updates = self.source.fetch(offset, self.timeout).await?;
        let mut next = offset;
        for update in &updates {
            TraceId::scope(TraceId::generate(), self.handler.handle(update)).await;
            next = Some(next.map_or(update.update_id + 1, |current| {
                current.max(update.update_id + 1)
            }));
        }
        Ok(next)
    }

    /// Run until `shutdown` turns `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("bot polling started");
        let mut offset = None;
        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => {}
                result = self.poll_once(offset) => match result {
                    Ok(next) => offset = next,
                    Err(error) => {
                        warn!(%error, "bot polling failed; retrying");
                        tokio::select! {
                            _ = shutdown.changed() => {}
                            () = tokio::time::sleep(RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }
        info!("bot polling stopped");
    }
}
