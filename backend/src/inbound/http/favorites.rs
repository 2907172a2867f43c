//! Favourite products of the authenticated customer.
//!
//! ```text
//! GET /api/favorites
//! POST /api/favorites/{product_id}
//! DELETE /api/favorites/{product_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::{Error, Product, ProductId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::StoreState;

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "Favourite products", body = [Product]),
        (status = 401, description = "Missing or invalid init data", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "listFavorites"
)]
#[get("/favorites")]
pub async fn list_favorites(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<Product>>> {
    Ok(web::Json(state.favorites.list(user.0.id).await?))
}

/// Mark a product as favourite; repeating the call is a no-op.
#[utoipa::path(
    post,
    path = "/api/favorites/{product_id}",
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product is a favourite"),
        (status = 404, description = "Unknown or inactive product", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "addFavorite"
)]
#[post("/favorites/{product_id}")]
pub async fn add_favorite(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
) -> ApiResult<HttpResponse> {
    state.favorites.add(user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{product_id}",
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Favourite removed"),
        (status = 404, description = "Product is not a favourite", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "removeFavorite"
)]
#[delete("/favorites/{product_id}")]
pub async fn remove_favorite(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
) -> ApiResult<HttpResponse> {
    state.favorites.remove(user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::domain::ports::{MockCatalogRepository, MockFavoritesRepository};
    use crate::inbound::http::store_api;
    use crate::inbound::http::test_utils::{
        StorePorts, auth_data, auth_header, customer, product, users_returning,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockall::predicate::eq;
    use rstest::rstest;

    async fn status_of(ports: StorePorts, request: test::TestRequest) -> StatusCode {
        let app = test::init_service(
            App::new()
                .app_data(auth_data(users_returning(customer(8))))
                .app_data(ports.into_state())
                .configure(store_api),
        )
        .await;
        test::call_service(&app, request.insert_header(auth_header(8)).to_request())
            .await
            .status()
    }

    #[rstest]
    #[actix_web::test]
    async fn adding_twice_succeeds() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_find_product()
            .times(2)
            .returning(|id| Ok(Some(product(id))));
        let mut favorites = MockFavoritesRepository::new();
        favorites
            .expect_add()
            .with(eq(8), eq(3))
            .times(2)
            .returning(|_, _| Ok(()));
        let ports = StorePorts {
            catalog,
            favorites,
            ..StorePorts::default()
        };
        let app = test::init_service(
            actix_web::App::new()
                .app_data(auth_data(users_returning(customer(8))))
                .app_data(ports.into_state())
                .configure(store_api),
        )
        .await;

        for _ in 0..2 {
            let request = test::TestRequest::post()
                .uri("/api/favorites/3")
                .insert_header(auth_header(8))
                .to_request();
            assert_eq!(
                test::call_service(&app, request).await.status(),
                StatusCode::NO_CONTENT
            );
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn removing_unknown_favourite_is_not_found() {
        let mut favorites = MockFavoritesRepository::new();
        favorites.expect_remove().return_once(|_, _| Ok(false));
        let ports = StorePorts {
            favorites,
            ..StorePorts::default()
        };

        let status = status_of(ports, test::TestRequest::delete().uri("/api/favorites/3")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn anonymous_callers_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(auth_data(users_returning(customer(8))))
                .app_data(StorePorts::default().into_state())
                .configure(store_api),
        )
        .await;
        let request = test::TestRequest::get().uri("/api/favorites").to_request();

        assert_eq!(
            test::call_service(&app, request).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
