//! Marketplace accounts and price/stock sync.
//!
//! ```text
//! GET /api/seller/marketplaces
//! POST /api/seller/marketplaces {"code":"yandex","name":"Yandex Market","account_id":"21000"}
//! PATCH /api/seller/marketplaces/{id} {"is_active":false}
//! POST /api/seller/marketplaces/{id}/sync
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use tracing::info;

use crate::domain::{
    Error, Marketplace, MarketplaceDraft, MarketplaceId, MarketplaceInput, MarketplacePatch,
    MarketplacePatchInput, SyncReport,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::state::SellerState;

#[utoipa::path(
    get,
    path = "/api/seller/marketplaces",
    responses(
        (status = 200, description = "Marketplace accounts", body = [Marketplace]),
        (status = 403, description = "Admin rights required", body = Error)
    ),
    tags = ["marketplaces"],
    operation_id = "listMarketplaces"
)]
#[get("/marketplaces")]
pub async fn list_marketplaces(
    state: web::Data<SellerState>,
    _admin: AdminUser,
) -> ApiResult<web::Json<Vec<Marketplace>>> {
    Ok(web::Json(state.marketplaces.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/seller/marketplaces",
    request_body = MarketplaceInput,
    responses(
        (status = 201, description = "Marketplace created", body = Marketplace),
        (status = 400, description = "Invalid marketplace", body = Error),
        (status = 409, description = "Account already registered", body = Error)
    ),
    tags = ["marketplaces"],
    operation_id = "createMarketplace"
)]
#[post("/marketplaces")]
pub async fn create_marketplace(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    payload: web::Json<MarketplaceInput>,
) -> ApiResult<HttpResponse> {
    let draft = MarketplaceDraft::try_from(payload.into_inner())?;
    let marketplace = state.marketplaces.create(&draft).await?;
    info!(marketplace_id = marketplace.id, code = %marketplace.code, "marketplace created");
    Ok(HttpResponse::Created().json(marketplace))
}

/// Partial update; an empty body is rejected.
#[utoipa::path(
    patch,
    path = "/api/seller/marketplaces/{id}",
    params(("id" = i64, Path, description = "Marketplace id")),
    request_body = MarketplacePatchInput,
    responses(
        (status = 200, description = "Marketplace updated", body = Marketplace),
        (status = 400, description = "Invalid or empty patch", body = Error),
        (status = 404, description = "Unknown marketplace", body = Error)
    ),
    tags = ["marketplaces"],
    operation_id = "updateMarketplace"
)]
#[patch("/marketplaces/{id}")]
pub async fn update_marketplace(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<MarketplaceId>,
    payload: web::Json<MarketplacePatchInput>,
) -> ApiResult<web::Json<Marketplace>> {
    let patch = MarketplacePatch::try_from(payload.into_inner())?;
    if patch.is_empty() {
        return Err(Error::invalid_request("patch must change at least one field"));
    }
    Ok(web::Json(
        state.marketplaces.update(path.into_inner(), &patch).await?,
    ))
}

/// Push every priced listing to the marketplace, one at a time.
#[utoipa::path(
    post,
    path = "/api/seller/marketplaces/{id}/sync",
    params(("id" = i64, Path, description = "Marketplace id")),
    responses(
        (status = 200, description = "Sync report", body = SyncReport),
        (status = 404, description = "Unknown marketplace", body = Error),
        (status = 409, description = "Marketplace disabled", body = Error),
        (status = 503, description = "Credentials not configured", body = Error)
    ),
    tags = ["marketplaces"],
    operation_id = "syncMarketplace"
)]
#[post("/marketplaces/{id}/sync")]
pub async fn sync_marketplace(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<MarketplaceId>,
) -> ApiResult<web::Json<SyncReport>> {
    Ok(web::Json(state.sync.sync(path.into_inner()).await?))
}

#[cfg(test)]
mod tests {
    use crate::domain::ports::{MockMarketplaceRepository, RepositoryError};
    use crate::domain::{Marketplace, MarketplaceCode};
    use crate::inbound::http::seller_api;
    use crate::inbound::http::test_utils::{
        SellerPorts, admin, auth_data, auth_header, json_body, users_returning,
    };
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockall::predicate::eq;
    use rstest::rstest;
    use serde_json::json;

    async fn call(marketplaces: MockMarketplaceRepository, request: test::TestRequest) -> ServiceResponse {
        let state = SellerPorts {
            marketplaces,
            ..SellerPorts::default()
        }
        .into_state();
        let app = test::init_service(
            App::new()
                .app_data(auth_data(users_returning(admin(1))))
                .app_data(state)
                .configure(seller_api),
        )
        .await;
        test::call_service(
            &app,
            request.insert_header(auth_header(admin(1).telegram_id)).to_request(),
        )
        .await
    }

    fn marketplace(id: i64, is_active: bool) -> Marketplace {
        Marketplace {
            id,
            code: MarketplaceCode::Uzum,
            name: "Uzum".to_owned(),
            account_id: "777".to_owned(),
            is_active,
            last_synced_at: None,
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn creates_marketplace() {
        let mut marketplaces = MockMarketplaceRepository::new();
        marketplaces
            .expect_create()
            .withf(|draft| draft.code == MarketplaceCode::Uzum && draft.account_id == "777")
            .return_once(|_| Ok(marketplace(3, true)));

        let response = call(
            marketplaces,
            test::TestRequest::post()
                .uri("/api/seller/marketplaces")
                .set_json(json!({ "code": "uzum", "name": "Uzum", "account_id": "777" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["code"], "uzum");
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_code_is_rejected() {
        let mut marketplaces = MockMarketplaceRepository::new();
        marketplaces.expect_create().never();

        let response = call(
            marketplaces,
            test::TestRequest::post()
                .uri("/api/seller/marketplaces")
                .set_json(json!({ "code": "ozon", "name": "Ozon", "account_id": "1" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn empty_patch_is_rejected() {
        let mut marketplaces = MockMarketplaceRepository::new();
        marketplaces.expect_update().never();

        let response = call(
            marketplaces,
            test::TestRequest::patch()
                .uri("/api/seller/marketplaces/3")
                .set_json(json!({})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn patch_disables_marketplace() {
        let mut marketplaces = MockMarketplaceRepository::new();
        marketplaces
            .expect_update()
            .withf(|id, patch| *id == 3 && patch.is_active == Some(false))
            .return_once(|id, _| Ok(marketplace(id, false)));

        let response = call(
            marketplaces,
            test::TestRequest::patch()
                .uri("/api/seller/marketplaces/3")
                .set_json(json!({ "is_active": false })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["is_active"], false);
    }

    #[rstest]
    #[case(None, StatusCode::NOT_FOUND)]
    #[case(Some(false), StatusCode::CONFLICT)]
    #[case(Some(true), StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn sync_refusals_map_to_statuses(
        #[case] active: Option<bool>,
        #[case] expected: StatusCode,
    ) {
        let mut marketplaces = MockMarketplaceRepository::new();
        marketplaces
            .expect_find()
            .with(eq(3))
            .return_once(move |id| Ok(active.map(|is_active| marketplace(id, is_active))));

        let response = call(
            marketplaces,
            test::TestRequest::post().uri("/api/seller/marketplaces/3/sync"),
        )
        .await;

        assert_eq!(response.status(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn duplicate_account_is_a_conflict() {
        let mut marketplaces = MockMarketplaceRepository::new();
        marketplaces
            .expect_create()
            .return_once(|_| Err(RepositoryError::conflict("marketplace account exists")));

        let response = call(
            marketplaces,
            test::TestRequest::post()
                .uri("/api/seller/marketplaces")
                .set_json(json!({ "code": "uzum", "name": "Uzum", "account_id": "777" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
