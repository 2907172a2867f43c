//! Port for user accounts.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Phone, User, UserId, UserProfileSync, UserProfileUpdate};

use super::RepositoryError;

/// User persistence keyed by Telegram id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user on first contact or refresh the Telegram-sourced
    /// fields of an existing one. Language is only set on insert.
    async fn upsert_from_telegram(
        &self,
        profile: &UserProfileSync,
    ) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Apply a profile edit; fails with `NotFound` for unknown users.
    async fn update_profile(
        &self,
        id: UserId,
        update: &UserProfileUpdate,
    ) -> Result<User, RepositoryError>;

    /// Store `phone` unless the user already has one.
    async fn set_phone_if_missing(&self, id: UserId, phone: &Phone)
    -> Result<(), RepositoryError>;

    /// All users, newest first.
    async fn list(&self, page: PageRequest) -> Result<Paginated<User>, RepositoryError>;
}
