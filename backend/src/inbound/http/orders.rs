//! Customer orders and store-admin order management.
//!
//! ```text
//! POST /api/orders
//! GET /api/orders?page=1&limit=20
//! GET /api/orders/{id}
//! POST /api/orders/{id}/cancel
//! GET /api/admin/orders?status=new&page=1&limit=20
//! PATCH /api/admin/orders/{id}/status {"status":"processing"}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use pagination::{PageQuery, Paginated};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, Order, OrderDraft, OrderId, OrderInput, OrderStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminUser, AuthenticatedUser};
use crate::inbound::http::schemas::OrderPage;
use crate::inbound::http::state::StoreState;
use crate::inbound::http::validation::{page_request, parse_order_status};

/// Paging parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<&PageParams> for PageQuery {
    fn from(params: &PageParams) -> Self {
        PageQuery {
            page: params.page,
            limit: params.limit,
        }
    }
}

/// Query of `GET /api/admin/orders`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminOrderQuery {
    /// Only orders in this status.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Body of `PATCH /api/admin/orders/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    #[schema(example = "processing")]
    pub status: String,
}

/// Place an order from explicit lines at current prices.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderInput,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Invalid order", body = Error),
        (status = 404, description = "Unknown or inactive product", body = Error),
        (status = 409, description = "Insufficient stock", body = Error)
    ),
    tags = ["orders"],
    operation_id = "placeOrder"
)]
#[post("/orders")]
pub async fn place_order(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    payload: web::Json<OrderInput>,
) -> ApiResult<HttpResponse> {
    let draft = OrderDraft::try_from(payload.into_inner())?;
    let order = state.orders.place(&user.0, draft).await?;
    Ok(HttpResponse::Created().json(order))
}

/// Orders of the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/orders",
    params(PageParams),
    responses((status = 200, description = "Page of orders", body = OrderPage)),
    tags = ["orders"],
    operation_id = "listMyOrders"
)]
#[get("/orders")]
pub async fn list_my_orders(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<Order>>> {
    let page = page_request(PageQuery::from(&*query))?;
    Ok(web::Json(state.orders.list_mine(&user.0, page).await?))
}

/// One order of the caller; other users' orders are reported missing.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = Order),
        (status = 404, description = "Unknown order", body = Error)
    ),
    tags = ["orders"],
    operation_id = "getMyOrder"
)]
#[get("/orders/{id}")]
pub async fn get_my_order(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    path: web::Path<OrderId>,
) -> ApiResult<web::Json<Order>> {
    Ok(web::Json(
        state.orders.get_mine(&user.0, path.into_inner()).await?,
    ))
}

/// Cancel an order that is still `new`.
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = Order),
        (status = 404, description = "Unknown order", body = Error),
        (status = 409, description = "Order is past `new`", body = Error)
    ),
    tags = ["orders"],
    operation_id = "cancelMyOrder"
)]
#[post("/orders/{id}/cancel")]
pub async fn cancel_my_order(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    path: web::Path<OrderId>,
) -> ApiResult<web::Json<Order>> {
    Ok(web::Json(
        state.orders.cancel_mine(&user.0, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(AdminOrderQuery),
    responses(
        (status = 200, description = "Page of orders", body = OrderPage),
        (status = 400, description = "Invalid query", body = Error),
        (status = 403, description = "Admin rights required", body = Error)
    ),
    tags = ["orders-admin"],
    operation_id = "listOrders"
)]
#[get("/admin/orders")]
pub async fn list_orders(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    query: web::Query<AdminOrderQuery>,
) -> ApiResult<web::Json<Paginated<Order>>> {
    let status = query
        .status
        .as_deref()
        .map(parse_order_status)
        .transpose()?;
    let page = page_request(PageQuery {
        page: query.page,
        limit: query.limit,
    })?;
    Ok(web::Json(state.orders.list_all(status, page).await?))
}

/// Move an order along its lifecycle; the customer is notified.
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = i64, Path, description = "Order id")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 400, description = "Unknown status", body = Error),
        (status = 404, description = "Unknown order", body = Error),
        (status = 409, description = "Transition not allowed", body = Error)
    ),
    tags = ["orders-admin"],
    operation_id = "changeOrderStatus"
)]
#[patch("/admin/orders/{id}/status")]
pub async fn change_order_status(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    path: web::Path<OrderId>,
    payload: web::Json<StatusChangeRequest>,
) -> ApiResult<web::Json<Order>> {
    let target: OrderStatus = parse_order_status(&payload.status)?;
    Ok(web::Json(
        state
            .orders
            .change_status(path.into_inner(), target)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatusChange;
    use crate::domain::ports::{MockOrderRepository, RepositoryError};
    use crate::inbound::http::store_api;
    use crate::inbound::http::test_utils::{
        StorePorts, admin, auth_data, auth_header, customer, json_body, order, users_returning,
    };
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockall::predicate::eq;
    use rstest::rstest;
    use serde_json::json;

    async fn call(
        ports: StorePorts,
        caller: crate::domain::User,
        request: test::TestRequest,
    ) -> ServiceResponse {
        let telegram_id = caller.telegram_id;
        let app = test::init_service(
            App::new()
                .app_data(auth_data(users_returning(caller)))
                .app_data(ports.into_state())
                .configure(store_api),
        )
        .await;
        test::call_service(
            &app,
            request.insert_header(auth_header(telegram_id)).to_request(),
        )
        .await
    }

    fn order_body() -> serde_json::Value {
        json!({
            "items": [
                { "product_id": 2, "quantity": 1 },
                { "product_id": 1, "quantity": 2 },
                { "product_id": 2, "quantity": 3 }
            ],
            "phone": "+998 90 123 45 67",
            "delivery_type": "pickup",
            "payment_method": "cash"
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn places_order_with_merged_lines() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_place()
            .withf(|user_id, draft| {
                let lines: Vec<(i64, i32)> = draft
                    .lines()
                    .iter()
                    .map(|line| (line.product_id, line.quantity))
                    .collect();
                *user_id == 3 && lines == vec![(1, 2), (2, 4)]
            })
            .return_once(|_, _| Ok(order(11, 3, OrderStatus::New)));
        let mut users = crate::domain::ports::MockUserRepository::new();
        users
            .expect_set_phone_if_missing()
            .times(1)
            .returning(|_, _| Ok(()));
        let ports = StorePorts {
            orders,
            users,
            ..StorePorts::default()
        };

        let response = call(
            ports,
            customer(3),
            test::TestRequest::post().uri("/api/orders").set_json(order_body()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["id"], 11);
    }

    #[rstest]
    #[actix_web::test]
    async fn delivery_without_address_is_rejected() {
        let mut orders = MockOrderRepository::new();
        orders.expect_place().never();
        let mut body = order_body();
        body["delivery_type"] = json!("delivery");

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            customer(3),
            test::TestRequest::post().uri("/api/orders").set_json(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "address");
    }

    #[rstest]
    #[actix_web::test]
    async fn stock_shortage_is_reported_with_details() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_place()
            .return_once(|_, _| Err(RepositoryError::insufficient_stock(2_i64, 1_i32, 4_i32)));

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            customer(3),
            test::TestRequest::post().uri("/api/orders").set_json(order_body()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["details"]["product_id"], 2);
        assert_eq!(body["details"]["available"], 1);
        assert_eq!(body["details"]["requested"], 4);
    }

    #[rstest]
    #[actix_web::test]
    async fn other_customers_orders_are_hidden() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_find()
            .with(eq(11))
            .return_once(|_| Ok(Some(order(11, 99, OrderStatus::New))));

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            customer(3),
            test::TestRequest::get().uri("/api/orders/11"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn processing_orders_cannot_be_cancelled_by_customers() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_find()
            .return_once(|_| Ok(Some(order(11, 3, OrderStatus::Processing))));
        orders.expect_transition().never();

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            customer(3),
            test::TestRequest::post().uri("/api/orders/11/cancel"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            json_body(response).await["details"]["code"],
            "invalid_status_transition"
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn admin_filters_orders_by_status() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_list()
            .withf(|status, _| *status == Some(OrderStatus::Ready))
            .return_once(|_, page| Ok(Paginated::new(Vec::new(), page, 0)));

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            admin(1),
            test::TestRequest::get().uri("/api/admin/orders?status=ready"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total"], 0);
    }

    #[rstest]
    #[case(json!({ "status": "shipped" }), StatusCode::BAD_REQUEST)]
    #[case(json!({ "state": "ready" }), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn admin_status_body_is_validated(
        #[case] body: serde_json::Value,
        #[case] expected: StatusCode,
    ) {
        let mut orders = MockOrderRepository::new();
        orders.expect_transition().never();

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            admin(1),
            test::TestRequest::patch()
                .uri("/api/admin/orders/11/status")
                .set_json(body),
        )
        .await;

        assert_eq!(response.status(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn admin_moves_order_forward() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_transition()
            .with(eq(11), eq(OrderStatus::Processing), eq(None))
            .return_once(|_, _, _| {
                Ok(StatusChange {
                    order: order(11, 3, OrderStatus::Processing),
                    previous: OrderStatus::New,
                })
            });
        let mut users = crate::domain::ports::MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(customer(id))));

        let response = call(
            StorePorts {
                orders,
                users,
                ..StorePorts::default()
            },
            admin(1),
            test::TestRequest::patch()
                .uri("/api/admin/orders/11/status")
                .set_json(json!({ "status": "processing" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "processing");
    }

    #[rstest]
    #[actix_web::test]
    async fn customers_cannot_list_all_orders() {
        let mut orders = MockOrderRepository::new();
        orders.expect_list().never();

        let response = call(
            StorePorts {
                orders,
                ..StorePorts::default()
            },
            customer(3),
            test::TestRequest::get().uri("/api/admin/orders"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
