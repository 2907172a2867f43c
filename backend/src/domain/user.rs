//! Store customers and administrators.
//!
//! Users are created on first contact from verified Telegram `initData` and
//! keyed by their Telegram id. Profile edits are limited to the phone number
//! and interface language.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::FieldError;
use super::{Language, TelegramUser};

/// Primary key of a row in `users`.
pub type UserId = i64;

const PHONE_MIN: usize = 7;
const PHONE_MAX: usize = 20;

/// Customer phone number: 7 to 20 characters of digits, `+` and spaces,
/// containing at least one digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "+998 90 123 45 67")]
pub struct Phone(String);

impl Phone {
    /// Validate and normalise surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, FieldError> {
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        if length < PHONE_MIN || length > PHONE_MAX {
            return Err(FieldError::out_of_range(
                "phone",
                format!("phone must be {PHONE_MIN} to {PHONE_MAX} characters"),
            ));
        }
        let allowed = trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == ' ');
        if !allowed || !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return Err(FieldError::invalid_format(
                "phone",
                "phone may only contain digits, '+' and spaces",
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Phone {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(value: Phone) -> Self {
        value.0
    }
}

/// Persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct User {
    pub id: UserId,
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub language: Language,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Telegram-sourced fields refreshed on every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfileSync {
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Only used for new users; existing users keep their chosen language.
    pub language: Language,
}

impl From<&TelegramUser> for UserProfileSync {
    fn from(user: &TelegramUser) -> Self {
        Self {
            telegram_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            language: Language::from_telegram_code(user.language_code.as_deref()),
        }
    }
}

/// Validated `PATCH /api/users/me` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfileUpdate {
    pub phone: Option<Phone>,
    pub language: Option<Language>,
}

impl UserProfileUpdate {
    /// Validate raw fields; unknown languages are rejected.
    pub fn parse(phone: Option<&str>, language: Option<&str>) -> Result<Self, FieldError> {
        let phone = phone.map(Phone::parse).transpose()?;
        let language = language
            .map(|code| {
                Language::parse(code).ok_or_else(|| {
                    FieldError::invalid_value("language", "language must be one of: ru, uz")
                        .with_value(code)
                })
            })
            .transpose()?;
        Ok(Self { phone, language })
    }

    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.language.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::FieldErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("+998 90 123 45 67")]
    #[case("9981234")]
    #[case("  +7 999 000 11 22  ")]
    fn accepts_valid_phones(#[case] input: &str) {
        let phone = Phone::parse(input).expect("valid phone");
        assert_eq!(phone.as_str(), input.trim());
    }

    #[rstest]
    #[case("12345", FieldErrorCode::OutOfRange)]
    #[case("+998-90-123-45", FieldErrorCode::InvalidFormat)]
    #[case("+++ +++ +", FieldErrorCode::InvalidFormat)]
    #[case("123456789012345678901", FieldErrorCode::OutOfRange)]
    fn rejects_invalid_phones(#[case] input: &str, #[case] code: FieldErrorCode) {
        let err = Phone::parse(input).expect_err("invalid phone");
        assert_eq!(err.code(), code);
        assert_eq!(err.field(), "phone");
    }

    #[rstest]
    fn profile_update_rejects_unknown_language() {
        let err = UserProfileUpdate::parse(None, Some("en")).expect_err("unknown language");
        assert_eq!(err.field(), "language");
    }

    #[rstest]
    fn profile_update_parses_both_fields() {
        let update = UserProfileUpdate::parse(Some("+998901234567"), Some("UZ"))
            .expect("valid update");
        assert_eq!(update.language, Some(Language::Uz));
        assert!(update.phone.is_some());
        assert!(!update.is_empty());
    }

    #[rstest]
    fn profile_sync_maps_language_code() {
        let telegram = TelegramUser {
            id: 42,
            first_name: "Aziz".to_owned(),
            last_name: None,
            username: Some("aziz".to_owned()),
            language_code: Some("uz".to_owned()),
            photo_url: None,
        };
        let sync = UserProfileSync::from(&telegram);
        assert_eq!(sync.telegram_id, 42);
        assert_eq!(sync.language, Language::Uz);
    }
}
