//! Interface languages supported by the storefront.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Language used for product names and bot messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    Uz,
}

impl Language {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::Uz => "uz",
        }
    }

    /// Parse a stored or client-provided code.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Self::Ru),
            "uz" => Some(Self::Uz),
            _ => None,
        }
    }

    /// Pick the closest supported language for a Telegram `language_code`
    /// such as `uz` or `ru-RU`. Anything unknown falls back to Russian.
    pub fn from_telegram_code(code: Option<&str>) -> Self {
        code.and_then(|code| code.split(['-', '_']).next())
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    /// Choose between the Russian and Uzbek variants of a text.
    pub fn pick<'a>(self, ru: &'a str, uz: &'a str) -> &'a str {
        match self {
            Self::Ru => ru,
            Self::Uz => uz,
        }
    }
}
