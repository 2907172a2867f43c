//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Users are keyed by their Telegram id: every authenticated request upserts
//! the profile Telegram reports, keeping the phone, language and admin flag
//! the store owns.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};

use crate::domain::ports::{RepositoryError, UserRepository};
use crate::domain::{Phone, User, UserId, UserProfileSync, UserProfileUpdate};

use super::diesel_error_mapping::{count_to_total, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, TelegramProfileChangeset, UserProfileChangeset, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn upsert_from_telegram(&self, profile: &UserProfileSync) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            telegram_id: profile.telegram_id,
            first_name: profile.first_name.as_str(),
            last_name: profile.last_name.as_deref(),
            username: profile.username.as_deref(),
            language: profile.language.as_str(),
        };
        let refresh = TelegramProfileChangeset {
            first_name: profile.first_name.as_str(),
            last_name: profile.last_name.as_deref(),
            username: profile.username.as_deref(),
            updated_at: Utc::now(),
        };

        diesel::insert_into(users::table)
            .values(&new_row)
            .on_conflict(users::telegram_id)
            .do_update()
            .set(&refresh)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(User::from)
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(User::from))
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &UserProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = UserProfileChangeset {
            phone: update.phone.as_ref().map(Phone::as_str),
            language: update.language.map(|language| language.as_str()),
            updated_at: Utc::now(),
        };

        diesel::update(users::table.find(id))
            .set(&changes)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(User::from)
            .ok_or_else(|| RepositoryError::not_found(format!("user {id} not found")))
    }

    async fn set_phone_if_missing(&self, id: UserId, phone: &Phone) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(
            users::table
                .filter(users::id.eq(id))
                .filter(users::phone.is_null()),
        )
        .set((
            users::phone.eq(phone.as_str()),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }

    async fn list(&self, page: PageRequest) -> Result<Paginated<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order(users::id.desc())
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Paginated::new(
            rows.into_iter().map(User::from).collect(),
            page,
            count_to_total(total),
        ))
    }
}
