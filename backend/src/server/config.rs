//! Environment-driven server settings.
//!
//! Every variable is read through [`mockable::Env`] so parsing can be tested
//! without touching the process environment.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use mockable::Env;
use url::Url;
use zeroize::Zeroizing;

use store_backend::domain::DEFAULT_INIT_DATA_MAX_AGE;
use store_backend::outbound::marketplace::{DEFAULT_UZUM_API_URL, DEFAULT_YANDEX_API_URL};

const DATABASE_URL_ENV: &str = "DATABASE_URL";
const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
const SELLER_BOT_TOKEN_ENV: &str = "SELLER_BOT_TOKEN";
const BIND_ADDR_ENV: &str = "BIND_ADDR";
const CORS_ENV: &str = "CORS_ALLOWED_ORIGINS";
const RATE_MAX_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";
const RATE_WINDOW_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
const AUTH_MAX_AGE_ENV: &str = "TELEGRAM_AUTH_MAX_AGE_SECS";
const ADMIN_IDS_ENV: &str = "ADMIN_TELEGRAM_IDS";
const ADMIN_CHAT_ENV: &str = "ADMIN_CHAT_ID";
const WEBHOOK_SECRET_ENV: &str = "TELEGRAM_WEBHOOK_SECRET";
const MINI_APP_URL_ENV: &str = "MINI_APP_URL";
const POOL_SIZE_ENV: &str = "DB_POOL_MAX_SIZE";
const CACHE_TTL_ENV: &str = "CACHE_TTL_SECS";
const YANDEX_KEY_ENV: &str = "YANDEX_API_KEY";
const YANDEX_URL_ENV: &str = "YANDEX_API_URL";
const UZUM_TOKEN_ENV: &str = "UZUM_API_TOKEN";
const UZUM_URL_ENV: &str = "UZUM_API_URL";

const POSITIVE_INT: &str = "a positive integer";
const TELEGRAM_ID: &str = "an integer Telegram id";
const ID_LIST: &str = "comma-separated integer Telegram ids";
const SOCKET_ADDR: &str = "host:port, e.g. 0.0.0.0:3000";
const ORIGIN_LIST: &str = "comma-separated http(s) origins without paths";

/// Which HTTP surface this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Surface {
    /// Telegram Mini-App storefront.
    Store,
    /// Seller App.
    Seller,
}

impl Surface {
    fn default_bind_addr(self) -> SocketAddr {
        match self {
            Self::Store => SocketAddr::from(([0, 0, 0, 0], 3000)),
            Self::Seller => SocketAddr::from(([0, 0, 0, 0], 3001)),
        }
    }
}

/// Base URL and secret of one marketplace partner API.
#[derive(Clone, PartialEq, Eq)]
pub struct MarketplaceCredentials {
    pub api_url: String,
    pub secret: Zeroizing<String>,
}

impl fmt::Debug for MarketplaceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketplaceCredentials")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Validated process configuration.
#[derive(Clone)]
pub struct AppSettings {
    pub surface: Surface,
    pub database_url: String,
    /// Store bot token; signs Mini-App sessions and sends notifications.
    pub bot_token: Zeroizing<String>,
    /// Token whose `initData` signatures this surface accepts.
    pub auth_bot_token: Zeroizing<String>,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub auth_max_age: Duration,
    pub admin_telegram_ids: Vec<i64>,
    pub admin_chat_id: Option<i64>,
    pub webhook_secret: Option<String>,
    pub mini_app_url: Option<String>,
    pub pool_max_size: u32,
    pub cache_ttl: Duration,
    pub yandex: Option<MarketplaceCredentials>,
    pub uzum: Option<MarketplaceCredentials>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("surface", &self.surface)
            .field("bind_addr", &self.bind_addr)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("admin_chat_id", &self.admin_chat_id)
            .field("webhook_enabled", &self.webhook_secret.is_some())
            .field("yandex", &self.yandex)
            .field("uzum", &self.uzum)
            .finish_non_exhaustive()
    }
}

/// Errors raised while reading configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl AppSettings {
    /// Read settings for `surface` from `env`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingEnv`] when `DATABASE_URL` or
    /// `TELEGRAM_BOT_TOKEN` is absent, [`ConfigError::InvalidEnv`] when a
    /// numeric or address variable cannot be parsed.
    pub fn from_env<E: Env>(env: &E, surface: Surface) -> Result<Self, ConfigError> {
        let bot_token = Zeroizing::new(required(env, BOT_TOKEN_ENV)?);
        let auth_bot_token = match surface {
            Surface::Seller => optional(env, SELLER_BOT_TOKEN_ENV)
                .map_or_else(|| bot_token.clone(), Zeroizing::new),
            Surface::Store => bot_token.clone(),
        };
        Ok(Self {
            surface,
            database_url: required(env, DATABASE_URL_ENV)?,
            bot_token,
            auth_bot_token,
            bind_addr: parsed(env, BIND_ADDR_ENV, SOCKET_ADDR)?
                .unwrap_or_else(|| surface.default_bind_addr()),
            cors_origins: cors_origins(env)?,
            rate_limit_max_requests: positive(env, RATE_MAX_ENV)?.unwrap_or(100),
            rate_limit_window: Duration::from_secs(
                positive(env, RATE_WINDOW_ENV)?.map_or(60, u64::from),
            ),
            auth_max_age: positive(env, AUTH_MAX_AGE_ENV)?
                .map_or(DEFAULT_INIT_DATA_MAX_AGE, |secs| {
                    Duration::from_secs(u64::from(secs))
                }),
            admin_telegram_ids: admin_ids(env)?,
            admin_chat_id: parsed(env, ADMIN_CHAT_ENV, TELEGRAM_ID)?,
            webhook_secret: optional(env, WEBHOOK_SECRET_ENV),
            mini_app_url: optional(env, MINI_APP_URL_ENV),
            pool_max_size: positive(env, POOL_SIZE_ENV)?.unwrap_or(10),
            cache_ttl: Duration::from_secs(positive(env, CACHE_TTL_ENV)?.map_or(300, u64::from)),
            yandex: credentials(env, YANDEX_KEY_ENV, YANDEX_URL_ENV, DEFAULT_YANDEX_API_URL),
            uzum: credentials(env, UZUM_TOKEN_ENV, UZUM_URL_ENV, DEFAULT_UZUM_API_URL),
        })
    }
}

/// Non-blank value of `name`, trimmed.
fn optional<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn required<E: Env>(env: &E, name: &'static str) -> Result<String, ConfigError> {
    optional(env, name).ok_or(ConfigError::MissingEnv { name })
}

fn parsed<E: Env, T: FromStr>(
    env: &E,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    optional(env, name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidEnv {
                    name,
                    value,
                    expected,
                })
        })
        .transpose()
}

fn positive<E: Env>(env: &E, name: &'static str) -> Result<Option<u32>, ConfigError> {
    match parsed::<E, u32>(env, name, POSITIVE_INT)? {
        Some(0) => Err(ConfigError::InvalidEnv {
            name,
            value: "0".to_owned(),
            expected: POSITIVE_INT,
        }),
        other => Ok(other),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Origins normalised to `scheme://host[:port]`; wildcards are refused.
fn cors_origins<E: Env>(env: &E) -> Result<Vec<String>, ConfigError> {
    let Some(value) = optional(env, CORS_ENV) else {
        return Ok(Vec::new());
    };
    let invalid = || ConfigError::InvalidEnv {
        name: CORS_ENV,
        value: value.clone(),
        expected: ORIGIN_LIST,
    };
    split_list(&value)
        .map(|item| {
            let url = Url::parse(item).map_err(|_| invalid())?;
            let has_path = !matches!(url.path(), "" | "/");
            if !matches!(url.scheme(), "http" | "https") || has_path || url.query().is_some() {
                return Err(invalid());
            }
            Ok(url.origin().ascii_serialization())
        })
        .collect()
}

fn admin_ids<E: Env>(env: &E) -> Result<Vec<i64>, ConfigError> {
    let Some(value) = optional(env, ADMIN_IDS_ENV) else {
        return Ok(Vec::new());
    };
    split_list(&value)
        .map(|item| {
            item.parse::<i64>().map_err(|_| ConfigError::InvalidEnv {
                name: ADMIN_IDS_ENV,
                value: value.clone(),
                expected: ID_LIST,
            })
        })
        .collect()
}

fn credentials<E: Env>(
    env: &E,
    secret_name: &str,
    url_name: &str,
    default_url: &str,
) -> Option<MarketplaceCredentials> {
    let secret = optional(env, secret_name)?;
    Some(MarketplaceCredentials {
        api_url: optional(env, url_name).unwrap_or_else(|| default_url.to_owned()),
        secret: Zeroizing::new(secret),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;
    use std::collections::HashMap;

    fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    const BASE: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://store@localhost/store"),
        ("TELEGRAM_BOT_TOKEN", "42:store"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> MockEnv {
        let mut vars = BASE.to_vec();
        vars.extend_from_slice(extra);
        mock_env(&vars)
    }

    #[rstest]
    fn defaults_apply() {
        let settings = AppSettings::from_env(&with(&[]), Surface::Store).expect("valid");
        assert_eq!(settings.bind_addr, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(settings.rate_limit_max_requests, 100);
        assert_eq!(settings.rate_limit_window, Duration::from_secs(60));
        assert_eq!(settings.auth_max_age, DEFAULT_INIT_DATA_MAX_AGE);
        assert_eq!(settings.pool_max_size, 10);
        assert_eq!(settings.cache_ttl, Duration::from_secs(300));
        assert!(settings.cors_origins.is_empty());
        assert!(settings.webhook_secret.is_none());
        assert!(settings.yandex.is_none());
    }

    #[rstest]
    #[case("DATABASE_URL")]
    #[case("TELEGRAM_BOT_TOKEN")]
    fn required_variables_are_reported(#[case] missing: &'static str) {
        let vars: Vec<_> = BASE.iter().copied().filter(|(key, _)| *key != missing).collect();
        let err = AppSettings::from_env(&mock_env(&vars), Surface::Store).expect_err("missing");
        assert_eq!(err, ConfigError::MissingEnv { name: missing });
    }

    #[rstest]
    #[case("RATE_LIMIT_MAX_REQUESTS", "lots")]
    #[case("RATE_LIMIT_WINDOW_SECS", "0")]
    #[case("BIND_ADDR", "localhost")]
    #[case("ADMIN_TELEGRAM_IDS", "1,two")]
    #[case("ADMIN_CHAT_ID", "@shop")]
    #[case("CORS_ALLOWED_ORIGINS", "*")]
    #[case("CORS_ALLOWED_ORIGINS", "https://shop.example/app")]
    fn invalid_values_name_the_variable(#[case] name: &'static str, #[case] value: &'static str) {
        let err = AppSettings::from_env(&with(&[(name, value)]), Surface::Store)
            .expect_err("invalid");
        assert!(matches!(err, ConfigError::InvalidEnv { name: reported, .. } if reported == name));
    }

    #[rstest]
    fn seller_uses_its_own_bot_token_when_set() {
        let seller = AppSettings::from_env(
            &with(&[("SELLER_BOT_TOKEN", "77:seller")]),
            Surface::Seller,
        )
        .expect("valid");
        assert_eq!(seller.auth_bot_token.as_str(), "77:seller");
        assert_eq!(seller.bot_token.as_str(), "42:store");
        assert_eq!(seller.bind_addr.port(), 3001);

        let fallback = AppSettings::from_env(&with(&[]), Surface::Seller).expect("valid");
        assert_eq!(fallback.auth_bot_token.as_str(), "42:store");
    }

    #[rstest]
    fn lists_are_split_and_trimmed() {
        let settings = AppSettings::from_env(
            &with(&[
                ("CORS_ALLOWED_ORIGINS", "https://shop.example, https://seller.example:8443/,"),
                ("ADMIN_TELEGRAM_IDS", " 1001 ,1002"),
            ]),
            Surface::Store,
        )
        .expect("valid");
        assert_eq!(
            settings.cors_origins,
            vec!["https://shop.example", "https://seller.example:8443"]
        );
        assert_eq!(settings.admin_telegram_ids, vec![1001, 1002]);
    }

    #[rstest]
    fn marketplace_credentials_use_default_urls() {
        let settings = AppSettings::from_env(
            &with(&[("UZUM_API_TOKEN", "uz-token")]),
            Surface::Seller,
        )
        .expect("valid");
        let uzum = settings.uzum.expect("uzum configured");
        assert_eq!(uzum.api_url, DEFAULT_UZUM_API_URL);
        assert_eq!(uzum.secret.as_str(), "uz-token");
        assert!(settings.yandex.is_none());
    }
}
