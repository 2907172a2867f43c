//! Supplier purchases that restock inventory.
//!
//! ```text
//! POST /api/seller/purchases
//! GET /api/seller/purchases?page=1&limit=20
//! GET /api/seller/purchases/{id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use pagination::{PageQuery, Paginated};
use tracing::info;

use crate::domain::{Error, Purchase, PurchaseDraft, PurchaseId, PurchaseInput};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::orders::PageParams;
use crate::inbound::http::schemas::PurchasePage;
use crate::inbound::http::state::SellerState;
use crate::inbound::http::validation::page_request;

/// Record a purchase and add its units to stock.
#[utoipa::path(
    post,
    path = "/api/seller/purchases",
    request_body = PurchaseInput,
    responses(
        (status = 201, description = "Purchase recorded", body = Purchase),
        (status = 400, description = "Invalid purchase or unknown product", body = Error)
    ),
    tags = ["purchases"],
    operation_id = "createPurchase"
)]
#[post("/purchases")]
pub async fn create_purchase(
    state: web::Data<SellerState>,
    admin: AdminUser,
    payload: web::Json<PurchaseInput>,
) -> ApiResult<HttpResponse> {
    let draft = PurchaseDraft::try_from(payload.into_inner())?;
    let purchase = state.purchases.create(&draft).await?;
    info!(
        purchase_id = purchase.id,
        lines = purchase.items.len(),
        total_cost = purchase.total_cost,
        admin_id = admin.0.id,
        "purchase recorded"
    );
    Ok(HttpResponse::Created().json(purchase))
}

#[utoipa::path(
    get,
    path = "/api/seller/purchases",
    params(PageParams),
    responses((status = 200, description = "Page of purchases", body = PurchasePage)),
    tags = ["purchases"],
    operation_id = "listPurchases"
)]
#[get("/purchases")]
pub async fn list_purchases(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<Purchase>>> {
    let page = page_request(PageQuery::from(&*query))?;
    Ok(web::Json(state.purchases.list(page).await?))
}

#[utoipa::path(
    get,
    path = "/api/seller/purchases/{id}",
    params(("id" = i64, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase", body = Purchase),
        (status = 404, description = "Unknown purchase", body = Error)
    ),
    tags = ["purchases"],
    operation_id = "getPurchase"
)]
#[get("/purchases/{id}")]
pub async fn get_purchase(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<PurchaseId>,
) -> ApiResult<web::Json<Purchase>> {
    let id = path.into_inner();
    state
        .purchases
        .find(id)
        .await?
        .map(web::Json)
        .ok_or_else(|| Error::not_found(format!("purchase {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockPurchaseRepository;
    use crate::inbound::http::seller_api;
    use crate::inbound::http::test_utils::{
        SellerPorts, admin, auth_data, auth_header, json_body, now, users_returning,
    };
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockall::predicate::eq;
    use rstest::rstest;
    use serde_json::json;

    async fn call(purchases: MockPurchaseRepository, request: test::TestRequest) -> ServiceResponse {
        let state = SellerPorts {
            purchases,
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

    #[rstest]
    #[actix_web::test]
    async fn records_purchase_totals() {
        let mut purchases = MockPurchaseRepository::new();
        purchases
            .expect_create()
            .withf(|draft| draft.total_cost() == 7_500 && draft.supplier.as_deref() == Some("Chorsu"))
            .return_once(|draft| {
                Ok(Purchase {
                    id: 21,
                    supplier: draft.supplier.clone(),
                    note: None,
                    total_cost: draft.total_cost(),
                    created_at: now(),
                    items: draft.items.clone(),
                })
            });

        let response = call(
            purchases,
            test::TestRequest::post().uri("/api/seller/purchases").set_json(json!({
                "supplier": "Chorsu",
                "items": [
                    { "product_id": 1, "quantity": 3, "unit_cost": 1500 },
                    { "product_id": 2, "quantity": 1, "unit_cost": 3000 }
                ]
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["total_cost"], 7_500);
    }

    #[rstest]
    #[case(json!({ "items": [] }), "items")]
    #[case(json!({ "items": [{ "product_id": 1, "quantity": 0, "unit_cost": 1 }] }), "quantity")]
    #[case(json!({ "items": [{ "product_id": 1, "quantity": 1, "unit_cost": -1 }] }), "unit_cost")]
    #[actix_web::test]
    async fn rejects_invalid_purchases(#[case] body: serde_json::Value, #[case] field: &str) {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_create().never();

        let response = call(
            purchases,
            test::TestRequest::post().uri("/api/seller/purchases").set_json(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_purchase_is_not_found() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_find().with(eq(9)).return_once(|_| Ok(None));

        let response = call(purchases, test::TestRequest::get().uri("/api/seller/purchases/9")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
