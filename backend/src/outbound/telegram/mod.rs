//! Telegram Bot API adapters: message delivery and update polling.

mod bot_client;
mod dto;
mod polling;

pub use bot_client::{DEFAULT_BOT_API_URL, TelegramBotClient};
pub use polling::{BotPoller, POLL_TIMEOUT, UpdateSource};
