//! Handling of updates delivered to the store bot by webhook or polling.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::BotNotifier;
use super::{InlineKeyboard, Language, OutgoingMessage, welcome_message};

/// Message text received from a private chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: Option<String>,
    /// Sender's Telegram interface language.
    pub language_code: Option<String>,
}

/// One Bot API update reduced to what the store reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUpdate {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

/// Replies to bot commands.
#[derive(Clone)]
pub struct BotUpdateHandler {
    bot: Arc<dyn BotNotifier>,
    mini_app_url: Option<String>,
}

impl BotUpdateHandler {
    pub fn new(bot: Arc<dyn BotNotifier>, mini_app_url: Option<String>) -> Self {
        Self { bot, mini_app_url }
    }

    /// Reply for `update`, or `None` when the update is ignored.
    pub fn reply(&self, update: &BotUpdate) -> Option<OutgoingMessage> {
        let message = update.message.as_ref()?;
        let command = message.text.as_deref()?.split_whitespace().next()?;
        // Group chats address commands as `/start@BotName`.
        let command = command.split('@').next().unwrap_or(command);
        if command != "/start" {
            return None;
        }
        let language = Language::from_telegram_code(message.language_code.as_deref());
        let (text, button) = welcome_message(language);
        let reply = OutgoingMessage::text(message.chat_id, text);
        Some(match &self.mini_app_url {
            Some(url) => reply.with_keyboard(InlineKeyboard::web_app(button, url.as_str())),
            None => reply,
        })
    }

    /// Handle `update`; delivery failures are logged and swallowed.
    pub async fn handle(&self, update: &BotUpdate) {
        let Some(reply) = self.reply(update) else {
            debug!(update_id = update.update_id, "bot update ignored");
            return;
        };
        if let Err(error) = self.bot.send_message(&reply).await {
            warn!(%error, update_id = update.update_id, chat_id = reply.chat_id, "bot reply failed");
        }
    }
}
