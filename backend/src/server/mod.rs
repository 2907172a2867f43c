//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppSettings, ConfigError, Surface};
pub use state_builders::{Adapters, build_analytics, build_bot_handler};

use state_builders::{build_auth, build_seller_state, build_store_state};

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;

use store_backend::Trace;
#[cfg(debug_assertions)]
use store_backend::doc::ApiDoc;
use store_backend::domain::{AuthService, TRACE_ID_HEADER};
use store_backend::inbound::http::auth::INIT_DATA_HEADER;
use store_backend::inbound::http::health::{HealthState, live, ready};
use store_backend::inbound::http::state::{SellerState, StoreState};
use store_backend::inbound::http::{seller_api, store_api};
use store_backend::middleware::{RateLimit, RateLimiter};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const CORS_MAX_AGE_SECS: usize = 3600;
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// State of the surface a process serves.
#[derive(Clone)]
enum SurfaceState {
    Store(web::Data<StoreState>),
    Seller(web::Data<SellerState>),
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    auth: web::Data<AuthService>,
    surface: SurfaceState,
    limiter: Arc<RateLimiter>,
    cors_origins: Arc<[String]>,
}

fn cors(origins: &[String]) -> Cors {
    origins.iter().fold(
        Cors::default()
            .allowed_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allowed_headers([
                AUTHORIZATION.as_str(),
                CONTENT_TYPE.as_str(),
                ACCEPT.as_str(),
                INIT_DATA_HEADER,
            ])
            .expose_headers([TRACE_ID_HEADER])
            .max_age(CORS_MAX_AGE_SECS),
        |cors, origin| cors.allowed_origin(origin),
    )
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        auth,
        surface,
        limiter,
        cors_origins,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(auth)
        .service(ready)
        .service(live);

    let app = match surface {
        SurfaceState::Store(state) => app.app_data(state).configure(store_api),
        SurfaceState::Seller(state) => app.app_data(state).configure(seller_api),
    };

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.wrap(RateLimit::new(limiter))
        .wrap(cors(&cors_origins))
        .wrap(Trace)
}

/// Construct the HTTP server for `settings.surface`.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    adapters: &Adapters,
    settings: &AppSettings,
) -> std::io::Result<Server> {
    let surface = match settings.surface {
        Surface::Store => SurfaceState::Store(build_store_state(adapters, settings)),
        Surface::Seller => SurfaceState::Seller(build_seller_state(adapters, settings)),
    };
    let deps = AppDependencies {
        health_state: health_state.clone(),
        auth: build_auth(adapters, settings),
        surface,
        limiter: Arc::new(RateLimiter::new(
            settings.rate_limit_max_requests,
            settings.rate_limit_window,
            Arc::new(DefaultClock),
        )),
        cors_origins: settings.cors_origins.clone().into(),
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(settings.bind_addr)?
        .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
        .disable_signals()
        .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
    use actix_web::test;
    use rstest::rstest;

    #[rstest]
    #[case("https://shop.example", true)]
    #[case("https://evil.example", false)]
    #[actix_web::test]
    async fn cors_allows_configured_origins(#[case] origin: &str, #[case] allowed: bool) {
        let app = test::init_service(
            App::new()
                .wrap(cors(&["https://shop.example".to_owned()]))
                .service(live)
                .app_data(web::Data::new(HealthState::new())),
        )
        .await;
        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/health/live")
                .insert_header((ORIGIN, origin))
                .to_request(),
        )
        .await;
        if allowed {
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response
                    .headers()
                    .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                    .and_then(|value| value.to_str().ok()),
                Some(origin)
            );
        } else {
            assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        }
    }
}
