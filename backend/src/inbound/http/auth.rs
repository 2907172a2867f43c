//! Telegram Mini-App authentication extractors.
//!
//! Clients send the raw `initData` string either as
//! `Authorization: tma <initData>` or in `X-Telegram-Init-Data`. The
//! extractors verify it through the [`AuthService`] registered as app data
//! and resolve the caller's user row.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use serde_json::json;

use crate::domain::{AuthService, Error, User};

/// Alternative header carrying the raw `initData`.
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";
const TMA_SCHEME: &str = "tma";

fn unauthorized(message: &str, code: &str) -> Error {
    Error::unauthorized(message).with_details(json!({ "code": code }))
}

/// Raw `initData` from the request headers.
pub(crate) fn init_data_from(req: &HttpRequest) -> Result<String, Error> {
    if let Some(value) = req.headers().get(AUTHORIZATION) {
        let header = value
            .to_str()
            .map_err(|_| unauthorized("authorization header must be text", "invalid_header"))?;
        let (scheme, raw) = header.trim().split_once(' ').ok_or_else(|| {
            unauthorized("authorization header must be `tma <initData>`", "invalid_header")
        })?;
        if !scheme.eq_ignore_ascii_case(TMA_SCHEME) {
            return Err(unauthorized(
                "unsupported authorization scheme",
                "invalid_header",
            ));
        }
        return Ok(raw.trim().to_owned());
    }
    req.headers()
        .get(INIT_DATA_HEADER)
        .map(|value| {
            value
                .to_str()
                .map(|raw| raw.trim().to_owned())
                .map_err(|_| unauthorized("init data header must be text", "invalid_header"))
        })
        .transpose()?
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| unauthorized("missing Telegram init data", "missing_init_data"))
}

fn authenticate(req: &HttpRequest) -> LocalBoxFuture<'static, Result<User, Error>> {
    let auth = req.app_data::<web::Data<AuthService>>().cloned();
    let raw = init_data_from(req);
    Box::pin(async move {
        let auth = auth.ok_or_else(|| Error::internal("authentication service not configured"))?;
        auth.authenticate(&raw?).await
    })
}

/// Any caller with valid `initData`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let fut = authenticate(req);
        Box::pin(async move { fut.await.map(AuthenticatedUser) })
    }
}

/// Caller with admin rights; others receive `403 Forbidden`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let fut = authenticate(req);
        Box::pin(async move {
            let user = fut.await?;
            if !user.is_admin {
                tracing::warn!(user_id = user.id, "admin endpoint refused");
                return Err(Error::forbidden("admin rights required"));
            }
            Ok(AdminUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockUserRepository;
    use crate::inbound::http::test_utils::{auth_data, customer, signed_init_data};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[case(Some("tma query_id=1&hash=ab"), None, Ok("query_id=1&hash=ab"))]
    #[case(Some("TMA  query_id=1 "), None, Ok("query_id=1"))]
    #[case(None, Some("query_id=2"), Ok("query_id=2"))]
    #[case(Some("Bearer abc"), None, Err("invalid_header"))]
    #[case(None, None, Err("missing_init_data"))]
    #[case(None, Some("   "), Err("missing_init_data"))]
    fn reads_init_data_headers(
        #[case] authorization: Option<&str>,
        #[case] init_header: Option<&str>,
        #[case] expected: Result<&str, &str>,
    ) {
        let mut req = actix_test::TestRequest::default();
        if let Some(value) = authorization {
            req = req.insert_header((AUTHORIZATION, value));
        }
        if let Some(value) = init_header {
            req = req.insert_header((INIT_DATA_HEADER, value));
        }
        let result = init_data_from(&req.to_http_request());
        match expected {
            Ok(raw) => assert_eq!(result.expect("header accepted"), raw),
            Err(code) => {
                let err = result.expect_err("header rejected");
                assert_eq!(err.code(), ErrorCode::Unauthorized);
                assert_eq!(err.details(), Some(&json!({ "code": code })));
            }
        }
    }

    async fn call(users: MockUserRepository, uri: &str, init_data: Option<String>) -> StatusCode {
        let app = actix_test::init_service(
            App::new()
                .app_data(auth_data(users))
                .route(
                    "/me",
                    web::get().to(|user: AuthenticatedUser| async move {
                        HttpResponse::Ok().body(user.0.id.to_string())
                    }),
                )
                .route(
                    "/admin",
                    web::get().to(|_admin: AdminUser| async { HttpResponse::NoContent().finish() }),
                ),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri(uri);
        if let Some(raw) = init_data {
            req = req.insert_header((AUTHORIZATION, format!("tma {raw}")));
        }
        actix_test::call_service(&app, req.to_request()).await.status()
    }

    #[rstest]
    #[case("/me", false, StatusCode::OK)]
    #[case("/admin", false, StatusCode::FORBIDDEN)]
    #[case("/admin", true, StatusCode::NO_CONTENT)]
    #[actix_web::test]
    async fn extractors_enforce_roles(
        #[case] uri: &str,
        #[case] is_admin: bool,
        #[case] expected: StatusCode,
    ) {
        let mut users = MockUserRepository::new();
        users.expect_upsert_from_telegram().return_once(move |_| {
            let mut user = customer(3);
            user.is_admin = is_admin;
            Ok(user)
        });

        assert_eq!(call(users, uri, Some(signed_init_data(3))).await, expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_init_data_is_unauthorised() {
        let mut users = MockUserRepository::new();
        users.expect_upsert_from_telegram().never();

        assert_eq!(call(users, "/me", None).await, StatusCode::UNAUTHORIZED);
    }
}
