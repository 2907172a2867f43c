//! Profile of the authenticated user and the admin user list.
//!
//! ```text
//! GET /api/users/me
//! PATCH /api/users/me {"phone":"+998901234567","language":"uz"}
//! GET /api/admin/users?page=1&limit=20
//! ```

use actix_web::{get, patch, web};
use pagination::{PageQuery, Paginated};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, User, UserProfileUpdate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminUser, AuthenticatedUser};
use crate::inbound::http::orders::PageParams;
use crate::inbound::http::schemas::UserPage;
use crate::inbound::http::state::StoreState;
use crate::inbound::http::validation::page_request;

/// Body of `PATCH /api/users/me`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    #[schema(example = "+998 90 123 45 67")]
    pub phone: Option<String>,
    /// `ru` or `uz`.
    #[schema(example = "uz")]
    pub language: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Missing or invalid init data", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(user: AuthenticatedUser) -> web::Json<User> {
    web::Json(user.into_inner())
}

/// Update phone and interface language. An empty body changes nothing.
#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid phone or language", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<User>> {
    let caller = user.into_inner();
    let update =
        UserProfileUpdate::parse(payload.phone.as_deref(), payload.language.as_deref())?;
    if update.is_empty() {
        return Ok(web::Json(caller));
    }
    let mut updated = state.users.update_profile(caller.id, &update).await?;
    updated.is_admin = caller.is_admin;
    info!(user_id = updated.id, "profile updated");
    Ok(web::Json(updated))
}

/// All users, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 403, description = "Admin rights required", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<User>>> {
    let page = page_request(PageQuery::from(&*query))?;
    Ok(web::Json(state.users.list(page).await?))
}
