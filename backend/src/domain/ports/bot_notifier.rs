//! Port for delivering Telegram bot messages.

use async_trait::async_trait;

use crate::domain::OutgoingMessage;

use super::define_port_error;

define_port_error! {
    /// Errors raised by bot delivery adapters.
    pub enum BotNotifierError {
        /// The Bot API could not be reached.
        Transport { message: String } => "bot transport failed: {message}",
        /// The Bot API answered with `ok = false`.
        Api { description: String } => "bot api rejected request: {description}",
    }
}

/// Sends messages through the store bot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotNotifier: Send + Sync {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), BotNotifierError>;
}

/// Notifier that drops every message. Used when no bot is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBotNotifier;

#[async_trait]
impl BotNotifier for DisabledBotNotifier {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), BotNotifierError> {
        tracing::debug!(chat_id = message.chat_id, "bot disabled; message dropped");
        Ok(())
    }
}
