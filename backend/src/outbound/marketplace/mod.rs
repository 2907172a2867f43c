//! Reqwest-backed marketplace partner API clients.
//!
//! Each client owns transport details only: endpoint paths, auth headers,
//! payload shapes and status mapping. Sync bookkeeping lives in
//! [`crate::domain::MarketplaceSyncService`].

mod dto;
mod uzum;
mod yandex;

use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;

use crate::domain::ports::MarketplaceClientError;

pub use uzum::UzumClient;
pub use yandex::YandexClient;

/// Default base URL of the Yandex Market partner API.
pub const DEFAULT_YANDEX_API_URL: &str = "https://api.partner.market.yandex.ru";
/// Default base URL of the Uzum seller open API.
pub const DEFAULT_UZUM_API_URL: &str = "https://api-seller.uzum.uz/api/seller-openapi";

const PREVIEW_CHAR_LIMIT: usize = 300;

/// Send `payload` as JSON and fail on any non-success status.
async fn send_json<T: Serialize + ?Sized>(
    request: RequestBuilder,
    payload: &T,
) -> Result<(), MarketplaceClientError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .json(payload)
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.bytes().await.map_err(map_transport_error)?;
    Err(map_status_error(status, body.as_ref()))
}

fn map_transport_error(error: reqwest::Error) -> MarketplaceClientError {
    MarketplaceClientError::transport(error.without_url().to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MarketplaceClientError {
    MarketplaceClientError::status(status.as_u16(), body_preview(body))
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Join `base` and `path` without doubling the separator.
fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
