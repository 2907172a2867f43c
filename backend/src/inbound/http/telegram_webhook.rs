//! Telegram Bot API webhook.
//!
//! ```text
//! POST /api/telegram/webhook
//! X-Telegram-Bot-Api-Secret-Token: <secret>
//! ```
//!
//! The webhook is only served when a secret is configured. Updates other
//! than `/start` are acknowledged and ignored.

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::{BotUpdate, Error, IncomingMessage};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::StoreState;

pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Subset of a Bot API `Update` the store reacts to.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<TelegramSender>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramSender {
    #[serde(default)]
    pub language_code: Option<String>,
}

impl From<TelegramUpdate> for BotUpdate {
    fn from(update: TelegramUpdate) -> Self {
        Self {
            update_id: update.update_id,
            message: update.message.map(|message| IncomingMessage {
                chat_id: message.chat.id,
                text: message.text,
                language_code: message.from.and_then(|from| from.language_code),
            }),
        }
    }
}

fn secret_matches(expected: &str, provided: &[u8]) -> bool {
    expected.as_bytes().ct_eq(provided).into()
}

#[utoipa::path(
    post,
    path = "/api/telegram/webhook",
    request_body = TelegramUpdate,
    params(("X-Telegram-Bot-Api-Secret-Token" = String, Header, description = "Webhook secret")),
    responses(
        (status = 200, description = "Update accepted"),
        (status = 400, description = "Body is not a Telegram update", body = Error),
        (status = 401, description = "Secret token mismatch", body = Error),
        (status = 404, description = "Webhook disabled", body = Error)
    ),
    tags = ["telegram"],
    operation_id = "telegramWebhook",
    security([])
)]
#[post("/telegram/webhook")]
pub async fn telegram_webhook(
    state: web::Data<StoreState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let Some(expected) = state.webhook_secret.as_deref() else {
        return Err(Error::not_found("webhook is not enabled"));
    };
    let provided = req
        .headers()
        .get(SECRET_TOKEN_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();
    if !secret_matches(expected, provided) {
        warn!("webhook call with a wrong secret token");
        return Err(Error::unauthorized("invalid webhook secret token"));
    }
    let payload: TelegramUpdate = serde_json::from_slice(&body).map_err(|err| {
        debug!(error = %err, "undecodable webhook update");
        Error::invalid_request("update body is not a valid Telegram update")
    })?;
    let update = BotUpdate::from(payload);
    state.bot.handle(&update).await;
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::BotNotifier;
    use crate::inbound::http::store_api;
    use crate::inbound::http::test_utils::{StorePorts, auth_data, customer, users_returning};
    use crate::test_support::RecordingNotifier;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    async fn call(
        secret: Option<&str>,
        header: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, Arc<RecordingNotifier>) {
        call_raw(secret, header, body.to_string()).await
    }

    async fn call_raw(
        secret: Option<&str>,
        header: Option<&str>,
        body: String,
    ) -> (StatusCode, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = StorePorts::default().into_state_with(
            notifier.clone() as Arc<dyn BotNotifier>,
            secret.map(str::to_owned),
        );
        let app = actix_test::init_service(
            App::new()
                .app_data(auth_data(users_returning(customer(1))))
                .app_data(state)
                .configure(store_api),
        )
        .await;
        let mut request = actix_test::TestRequest::post()
            .uri("/api/telegram/webhook")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(body);
        if let Some(value) = header {
            request = request.insert_header((SECRET_TOKEN_HEADER, value));
        }
        let status = actix_test::call_service(&app, request.to_request()).await.status();
        (status, notifier)
    }

    fn start_update() -> serde_json::Value {
        json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "chat": { "id": 555, "type": "private" },
                "from": { "id": 555, "is_bot": false, "first_name": "Aziz", "language_code": "uz" },
                "text": "/start"
            }
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn start_command_gets_a_reply() {
        let (status, notifier) = call(Some("s3cret"), Some("s3cret"), start_update()).await;

        assert_eq!(status, StatusCode::OK);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, 555);
    }

    #[rstest]
    #[case(Some("wrong"))]
    #[case(None)]
    #[actix_web::test]
    async fn wrong_secret_is_rejected(#[case] header: Option<&str>) {
        let (status, notifier) = call(Some("s3cret"), header, start_update()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(notifier.sent().is_empty());
    }

    #[rstest]
    #[actix_web::test]
    async fn disabled_webhook_is_not_found() {
        let (status, _) = call(None, Some("anything"), start_update()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn other_updates_are_acknowledged() {
        let (status, notifier) = call(
            Some("s3cret"),
            Some("s3cret"),
            json!({ "update_id": 11, "edited_message": {} }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(notifier.sent().is_empty());
    }

    #[rstest]
    #[case(None, Some("s3cret"), StatusCode::NOT_FOUND)]
    #[case(Some("s3cret"), Some("wrong"), StatusCode::UNAUTHORIZED)]
    #[case(Some("s3cret"), None, StatusCode::UNAUTHORIZED)]
    #[case(Some("s3cret"), Some("s3cret"), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn secret_is_checked_before_the_body_is_decoded(
        #[case] secret: Option<&str>,
        #[case] header: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        let (status, notifier) = call_raw(secret, header, "{not json".to_owned()).await;

        assert_eq!(status, expected);
        assert!(notifier.sent().is_empty());
    }

    #[rstest]
    #[case("abc", b"abc", true)]
    #[case("abc", b"abd", false)]
    #[case("abc", b"ab", false)]
    #[case("abc", b"", false)]
    fn secret_comparison(#[case] expected: &str, #[case] provided: &[u8], #[case] matches: bool) {
        assert_eq!(secret_matches(expected, provided), matches);
    }
}
