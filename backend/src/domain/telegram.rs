//! Telegram Mini-App `initData` verification.
//!
//! Telegram signs the launch parameters it hands to a Mini-App. The server
//! recomputes the signature:
//!
//! 1. `data_check_string` is every `key=value` pair except `hash`, sorted by
//!    key and joined with `\n`;
//! 2. `secret_key = HMAC_SHA256(key = "WebAppData", msg = bot_token)`;
//! 3. the payload is authentic when
//!    `HMAC_SHA256(key = secret_key, msg = data_check_string)` equals the
//!    hex-encoded `hash` parameter.
//!
//! Payloads older than the configured maximum age are rejected so a leaked
//! `initData` string cannot be replayed indefinitely.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::Error;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";
const HASH_FIELD: &str = "hash";
const AUTH_DATE_FIELD: &str = "auth_date";
const USER_FIELD: &str = "user";

/// Default maximum age of an `initData` payload.
pub const DEFAULT_INIT_DATA_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
/// Tolerated clock difference for `auth_date` values in the future.
const CLOCK_SKEW: TimeDelta = TimeDelta::seconds(60);

/// Reasons an `initData` payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    #[error("init data is missing `{field}`")]
    Missing { field: &'static str },
    #[error("init data is malformed: {reason}")]
    Malformed { reason: String },
    #[error("init data signature does not match")]
    SignatureMismatch,
    #[error("init data has expired")]
    Expired,
    #[error("init data user is invalid: {reason}")]
    InvalidUser { reason: String },
}

impl InitDataError {
    /// Stable code reported in `details.code` of the 401 response.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "init_data_missing",
            Self::Malformed { .. } => "init_data_malformed",
            Self::SignatureMismatch => "init_data_signature_mismatch",
            Self::Expired => "init_data_expired",
            Self::InvalidUser { .. } => "init_data_invalid_user",
        }
    }

    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

impl From<InitDataError> for Error {
    fn from(err: InitDataError) -> Self {
        Error::unauthorized(err.to_string()).with_details(json!({ "code": err.code() }))
    }
}

/// The Telegram account embedded in `initData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// URL-decoded `initData` key/value pairs in their original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    pairs: Vec<(String, String)>,
}

impl InitData {
    /// Decode a raw `initData` query string.
    pub fn parse(raw: &str) -> Result<Self, InitDataError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InitDataError::Missing { field: "initData" });
        }
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        if pairs.is_empty() {
            return Err(InitDataError::malformed("no key/value pairs"));
        }
        Ok(Self { pairs })
    }

    /// Value of the first pair named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Pairs other than `hash`, sorted by key and joined with newlines.
    pub fn data_check_string(&self) -> String {
        let mut fields: Vec<&(String, String)> = self
            .pairs
            .iter()
            .filter(|(name, _)| name != HASH_FIELD)
            .collect();
        fields.sort_by(|left, right| left.0.cmp(&right.0));
        fields
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedInitData {
    pub user: TelegramUser,
    pub auth_date: DateTime<Utc>,
    pub query_id: Option<String>,
    pub start_param: Option<String>,
}

/// Verifies `initData` signed for one bot.
#[derive(Clone)]
pub struct InitDataVerifier {
    bot_token: Zeroizing<String>,
    max_age: Duration,
}

impl std::fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("bot_token", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl InitDataVerifier {
    pub fn new(bot_token: impl Into<String>, max_age: Duration) -> Self {
        Self {
            bot_token: Zeroizing::new(bot_token.into()),
            max_age,
        }
    }

    /// Verify `raw` as of `now`.
    ///
    /// The signature is checked before any field is trusted; the comparison
    /// runs in constant time.
    pub fn verify(&self, raw: &str, now: DateTime<Utc>) -> Result<VerifiedInitData, InitDataError> {
        let data = InitData::parse(raw)?;
        let hash = data
            .get(HASH_FIELD)
            .ok_or(InitDataError::Missing { field: HASH_FIELD })?;
        let auth_date_raw = data.get(AUTH_DATE_FIELD).ok_or(InitDataError::Missing {
            field: AUTH_DATE_FIELD,
        })?;

        let expected = hex::decode(hash).map_err(|_| InitDataError::malformed("hash is not hex"))?;
        let mut mac = data_mac(self.bot_token.as_bytes())?;
        mac.update(data.data_check_string().as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| InitDataError::SignatureMismatch)?;

        let auth_date = auth_date_raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| InitDataError::malformed("auth_date is not a unix timestamp"))?;
        if auth_date > now + CLOCK_SKEW {
            return Err(InitDataError::malformed("auth_date is in the future"));
        }
        let max_age = TimeDelta::from_std(self.max_age).unwrap_or(TimeDelta::MAX);
        if now.signed_duration_since(auth_date) > max_age {
            return Err(InitDataError::Expired);
        }

        let user_json = data
            .get(USER_FIELD)
            .ok_or(InitDataError::Missing { field: USER_FIELD })?;
        let user: TelegramUser =
            serde_json::from_str(user_json).map_err(|err| InitDataError::InvalidUser {
                reason: err.to_string(),
            })?;
        if user.id <= 0 || user.first_name.trim().is_empty() {
            return Err(InitDataError::InvalidUser {
                reason: "user must have a positive id and a first name".to_owned(),
            });
        }

        Ok(VerifiedInitData {
            user,
            auth_date,
            query_id: data.get("query_id").map(str::to_owned),
            start_param: data.get("start_param").map(str::to_owned),
        })
    }
}

/// HMAC keyed with the per-bot secret derived from `bot_token`.
fn data_mac(bot_token: &[u8]) -> Result<HmacSha256, InitDataError> {
    let mut derive = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)
        .map_err(|_| InitDataError::malformed("invalid signing key"))?;
    derive.update(bot_token);
    let secret_key: Zeroizing<[u8; 32]> = Zeroizing::new(derive.finalize().into_bytes().into());
    HmacSha256::new_from_slice(secret_key.as_slice())
        .map_err(|_| InitDataError::malformed("invalid signing key"))
}

/// Build a signed `initData` string from `pairs` for `bot_token`.
///
/// Used by tests and local tooling to mint payloads the verifier accepts.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use std::time::Duration;
/// use store_backend::domain::{InitDataVerifier, sign_init_data};
///
/// let now = Utc::now();
/// let auth_date = now.timestamp().to_string();
/// let raw = sign_init_data(
///     &[
///         ("auth_date", auth_date.as_str()),
///         ("user", r#"{"id":7,"first_name":"Dilnoza"}"#),
///     ],
///     "123:token",
/// )
/// .expect("sign");
/// let verified = InitDataVerifier::new("123:token", Duration::from_secs(60))
///     .verify(&raw, now)
///     .expect("valid signature");
/// assert_eq!(verified.user.id, 7);
/// ```
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> Result<String, InitDataError> {
    let data = InitData {
        pairs: pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
    };
    let mut mac = data_mac(bot_token.as_bytes())?;
    mac.update(data.data_check_string().as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(HASH_FIELD, &hash);
    Ok(serializer.finish())
}
