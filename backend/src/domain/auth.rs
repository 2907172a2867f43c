//! Request authentication from Telegram `initData`.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};

use super::ports::UserRepository;
use super::{Error, InitDataVerifier, User, UserProfileSync};

/// Telegram ids granted admin rights by configuration, in addition to the
/// `users.is_admin` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    telegram_ids: HashSet<i64>,
}

impl AdminPolicy {
    pub fn new(telegram_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            telegram_ids: telegram_ids.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, user: &User) -> bool {
        user.is_admin || self.telegram_ids.contains(&user.telegram_id)
    }
}

/// Verifies `initData` and resolves the caller's user row.
#[derive(Clone)]
pub struct AuthService {
    verifier: InitDataVerifier,
    users: Arc<dyn UserRepository>,
    admins: AdminPolicy,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        verifier: InitDataVerifier,
        users: Arc<dyn UserRepository>,
        admins: AdminPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            users,
            admins,
            clock,
        }
    }

    /// Verify `raw` and upsert the user it names.
    ///
    /// The returned user's `is_admin` reflects both the stored flag and the
    /// configured admin ids.
    pub async fn authenticate(&self, raw: &str) -> Result<User, Error> {
        let verified = self
            .verifier
            .verify(raw, self.clock.utc())
            .inspect_err(|err| warn!(code = err.code(), "init data rejected"))?;
        let profile = UserProfileSync::from(&verified.user);
        let mut user = self.users.upsert_from_telegram(&profile).await?;
        user.is_admin = self.admins.is_admin(&user);
        debug!(user_id = user.id, is_admin = user.is_admin, "request authenticated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockUserRepository, RepositoryError};
    use crate::domain::{ErrorCode, Language, sign_init_data};
    use chrono::{DateTime, Utc};
    use crate::test_support::FixedClock;
    use rstest::rstest;
    use std::time::Duration;

    const TOKEN: &str = "42:secret";

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("timestamp")
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(now()))
    }

    fn init_data(telegram_id: i64) -> String {
        let auth_date = now().timestamp().to_string();
        let user = format!(r#"{{"id":{telegram_id},"first_name":"Malika","language_code":"uz"}}"#);
        sign_init_data(
            &[("auth_date", auth_date.as_str()), ("user", user.as_str())],
            TOKEN,
        )
        .expect("sign")
    }

    fn stored(telegram_id: i64, is_admin: bool) -> User {
        User {
            id: 7,
            telegram_id,
            first_name: "Malika".to_owned(),
            last_name: None,
            username: None,
            phone: None,
            language: Language::Uz,
            is_admin,
            created_at: now(),
        }
    }

    fn service(users: MockUserRepository, admins: AdminPolicy) -> AuthService {
        AuthService::new(
            InitDataVerifier::new(TOKEN, Duration::from_secs(3600)),
            Arc::new(users),
            admins,
            clock(),
        )
    }

    #[rstest]
    #[case(false, AdminPolicy::default(), false)]
    #[case(true, AdminPolicy::default(), true)]
    #[case(false, AdminPolicy::new([555]), true)]
    #[tokio::test]
    async fn resolves_admin_flag(
        #[case] stored_admin: bool,
        #[case] policy: AdminPolicy,
        #[case] expected: bool,
    ) {
        let mut users = MockUserRepository::new();
        users
            .expect_upsert_from_telegram()
            .withf(|profile| profile.telegram_id == 555 && profile.language == Language::Uz)
            .times(1)
            .return_once(move |_| Ok(stored(555, stored_admin)));

        let user = service(users, policy)
            .authenticate(&init_data(555))
            .await
            .expect("authenticated");
        assert_eq!(user.is_admin, expected);
    }

    #[tokio::test]
    async fn rejects_bad_signature_without_touching_storage() {
        let mut users = MockUserRepository::new();
        users.expect_upsert_from_telegram().never();

        let raw = init_data(1).replace("Malika", "Mallory");
        let err = service(users, AdminPolicy::default())
            .authenticate(&raw)
            .await
            .expect_err("tampered");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn propagates_storage_failures() {
        let mut users = MockUserRepository::new();
        users
            .expect_upsert_from_telegram()
            .return_once(|_| Err(RepositoryError::connection("down")));

        let err = service(users, AdminPolicy::default())
            .authenticate(&init_data(1))
            .await
            .expect_err("storage down");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
