//! Bot API wire types.

use serde::{Deserialize, Serialize};

use crate::domain::{BotUpdate, ButtonAction, IncomingMessage, InlineKeyboard, OutgoingMessage};

/// Body of `sendMessage`.
#[derive(Debug, Serialize)]
pub(super) struct SendMessageDto<'a> {
    pub(super) chat_id: i64,
    pub(super) text: &'a str,
    pub(super) parse_mode: &'static str,
    pub(super) disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) reply_markup: Option<ReplyMarkupDto<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReplyMarkupDto<'a> {
    pub(super) inline_keyboard: Vec<Vec<InlineButtonDto<'a>>>,
}

#[derive(Debug, Serialize)]
pub(super) struct InlineButtonDto<'a> {
    pub(super) text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) web_app: Option<WebAppInfoDto<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct WebAppInfoDto<'a> {
    pub(super) url: &'a str,
}

impl<'a> From<&'a InlineKeyboard> for ReplyMarkupDto<'a> {
    fn from(keyboard: &'a InlineKeyboard) -> Self {
        let inline_keyboard = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match &button.action {
                        ButtonAction::WebApp(url) => InlineButtonDto {
                            text: button.text.as_str(),
                            web_app: Some(WebAppInfoDto { url: url.as_str() }),
                            url: None,
                        },
                        ButtonAction::Url(url) => InlineButtonDto {
                            text: button.text.as_str(),
                            web_app: None,
                            url: Some(url.as_str()),
                        },
                    })
                    .collect()
            })
            .collect();
        Self { inline_keyboard }
    }
}

impl<'a> From<&'a OutgoingMessage> for SendMessageDto<'a> {
    fn from(message: &'a OutgoingMessage) -> Self {
        Self {
            chat_id: message.chat_id,
            text: message.text.as_str(),
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: message.keyboard.as_ref().map(ReplyMarkupDto::from),
        }
    }
}

/// Body of `getUpdates`.
#[derive(Debug, Serialize)]
pub(super) struct GetUpdatesDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) offset: Option<i64>,
    pub(super) timeout: u64,
    pub(super) allowed_updates: [&'static str; 1],
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub(super) struct ApiResponseDto<T> {
    pub(super) ok: bool,
    #[serde(default)]
    pub(super) description: Option<String>,
    pub(super) result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateDto {
    update_id: i64,
    #[serde(default)]
    message: Option<MessageDto>,
}

#[derive(Debug, Deserialize)]
struct MessageDto {
    chat: ChatDto,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    from: Option<SenderDto>,
}

#[derive(Debug, Deserialize)]
struct ChatDto {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct SenderDto {
    #[serde(default)]
    language_code: Option<String>,
}

impl From<UpdateDto> for BotUpdate {
    fn from(dto: UpdateDto) -> Self {
        Self {
            update_id: dto.update_id,
            message: dto.message.map(|message| IncomingMessage {
                chat_id: message.chat.id,
                text: message.text,
                language_code: message.from.and_then(|sender| sender.language_code),
            }),
        }
    }
}
