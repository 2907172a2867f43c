//! Reqwest-backed Telegram Bot API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::dto::{ApiResponseDto, GetUpdatesDto, SendMessageDto, UpdateDto};
use crate::domain::ports::{BotNotifier, BotNotifierError};
use crate::domain::{BotUpdate, OutgoingMessage};

/// Default Bot API base URL.
pub const DEFAULT_BOT_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bot API client for one bot token.
pub struct TelegramBotClient {
    client: Client,
    api_url: String,
    token: String,
}

impl TelegramBotClient {
    /// Build a client against [`DEFAULT_BOT_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(token: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_api_url(DEFAULT_BOT_API_URL, token)
    }

    /// Build a client against a custom Bot API server.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_api_url(
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Option<T>, BotNotifierError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        // The Bot API reports failures in the body for 4xx responses too.
        let envelope: ApiResponseDto<T> = response.json().await.map_err(map_transport_error)?;
        if !envelope.ok {
            return Err(BotNotifierError::api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{method} failed")),
            ));
        }
        Ok(envelope.result)
    }

    /// Long-poll `getUpdates`, waiting up to `timeout` for new updates.
    ///
    /// # Errors
    ///
    /// Returns [`BotNotifierError`] on transport failures or `ok = false`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<BotUpdate>, BotNotifierError> {
        let body = GetUpdatesDto {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ["message"],
        };
        let updates: Option<Vec<UpdateDto>> = self
            .call("getUpdates", &body, timeout + REQUEST_TIMEOUT)
            .await?;
        Ok(updates
            .unwrap_or_default()
            .into_iter()
            .map(BotUpdate::from)
            .collect())
    }
}

fn map_transport_error(error: reqwest::Error) -> BotNotifierError {
    BotNotifierError::transport(error.without_url().to_string())
}

#[async_trait]
impl BotNotifier for TelegramBotClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), BotNotifierError> {
        let _: Option<serde_json::Value> = self
            .call("sendMessage", &SendMessageDto::from(message), REQUEST_TIMEOUT)
            .await?;
        tracing::debug!(chat_id = message.chat_id, "bot message sent");
        Ok(())
    }
}
