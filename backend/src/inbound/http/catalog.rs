//! Storefront catalog endpoints and their admin counterparts.
//!
//! ```text
//! GET /api/categories
//! GET /api/products?category_id=1&search=чай&page=1&limit=20&lang=uz
//! GET /api/products/{id}
//! GET /api/banners
//! POST|PUT|DELETE /api/admin/products[/{id}]
//! POST|PUT|DELETE /api/admin/categories[/{id}]
//! POST|DELETE /api/admin/banners[/{id}]
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use pagination::{PageQuery, Paginated};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Banner, BannerDraft, BannerId, BannerInput, Category, CategoryDraft, CategoryId,
    CategoryInput, Error, Language, Product, ProductDraft, ProductFilter, ProductId,
    ProductInput,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::schemas::ProductPage;
use crate::inbound::http::state::StoreState;
use crate::inbound::http::validation::{page_request, parse_language};

/// Product with name and description resolved for the requested language.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    /// Name in the requested language.
    pub name: String,
    /// Description in the requested language.
    pub description: Option<String>,
    /// `sale_price` when set, otherwise `price`.
    pub effective_price: i64,
}

impl ProductResponse {
    pub fn localized(product: Product, language: Language) -> Self {
        Self {
            name: product.name(language).to_owned(),
            description: product.description(language).map(str::to_owned),
            effective_price: product.effective_price(),
            product,
        }
    }
}

/// Query of `GET /api/products`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `ru` (default) or `uz`.
    pub lang: Option<String>,
}

/// Query carrying only the response language.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

/// Active categories ordered for display.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Active categories", body = [Category]),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["catalog"],
    operation_id = "listCategories",
    security([])
)]
#[get("/categories")]
pub async fn list_categories(state: web::Data<StoreState>) -> ApiResult<web::Json<Vec<Category>>> {
    Ok(web::Json(state.catalog.list_categories().await?))
}

/// Active products, newest first.
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Page of products", body = ProductPage),
        (status = 400, description = "Invalid query", body = Error)
    ),
    tags = ["catalog"],
    operation_id = "listProducts",
    security([])
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<StoreState>,
    query: web::Query<ProductListQuery>,
) -> ApiResult<web::Json<Paginated<ProductResponse>>> {
    let query = query.into_inner();
    let language = parse_language(query.lang.as_deref())?;
    let page = page_request(PageQuery {
        page: query.page,
        limit: query.limit,
    })?;
    let filter = ProductFilter::new(query.category_id, query.search.as_deref())?;
    let products = state.catalog.list_products(&filter, page).await?;
    Ok(web::Json(
        products.map(|product| ProductResponse::localized(product, language)),
    ))
}

/// One active product.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id"), LanguageQuery),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Unknown or inactive product", body = Error)
    ),
    tags = ["catalog"],
    operation_id = "getProduct",
    security([])
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<StoreState>,
    path: web::Path<ProductId>,
    query: web::Query<LanguageQuery>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id = path.into_inner();
    let language = parse_language(query.lang.as_deref())?;
    match state.catalog.find_product(id).await? {
        Some(product) if product.is_active => {
            Ok(web::Json(ProductResponse::localized(product, language)))
        }
        _ => Err(Error::not_found(format!("product {id} not found"))),
    }
}

/// Active banners ordered for display.
#[utoipa::path(
    get,
    path = "/api/banners",
    responses((status = 200, description = "Active banners", body = [Banner])),
    tags = ["catalog"],
    operation_id = "listBanners",
    security([])
)]
#[get("/banners")]
pub async fn list_banners(state: web::Data<StoreState>) -> ApiResult<web::Json<Vec<Banner>>> {
    Ok(web::Json(state.catalog.list_banners().await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid product", body = Error),
        (status = 403, description = "Admin rights required", body = Error),
        (status = 409, description = "SKU already exists", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "createProduct"
)]
#[post("/admin/products")]
pub async fn create_product(
    state: web::Data<StoreState>,
    admin: AdminUser,
    payload: web::Json<ProductInput>,
) -> ApiResult<HttpResponse> {
    let draft = ProductDraft::try_from(payload.into_inner())?;
    let product = state.catalog.create_product(&draft).await?;
    info!(product_id = product.id, sku = %product.sku, admin_id = admin.0.id, "product created");
    Ok(HttpResponse::Created().json(product))
}

/// Replace a product; `initial_stock` is ignored.
#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid product", body = Error),
        (status = 404, description = "Unknown product", body = Error),
        (status = 409, description = "SKU already exists", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "updateProduct"
)]
#[put("/admin/products/{id}")]
pub async fn update_product(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    path: web::Path<ProductId>,
    payload: web::Json<ProductInput>,
) -> ApiResult<web::Json<Product>> {
    let draft = ProductDraft::try_from(payload.into_inner())?;
    Ok(web::Json(
        state.catalog.update_product(path.into_inner(), &draft).await?,
    ))
}

/// Hide a product from the storefront.
#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, description = "Unknown product", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "deleteProduct"
)]
#[delete("/admin/products/{id}")]
pub async fn delete_product(
    state: web::Data<StoreState>,
    admin: AdminUser,
    path: web::Path<ProductId>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    state.catalog.deactivate_product(id).await?;
    info!(product_id = id, admin_id = admin.0.id, "product deactivated");
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid category", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "createCategory"
)]
#[post("/admin/categories")]
pub async fn create_category(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    payload: web::Json<CategoryInput>,
) -> ApiResult<HttpResponse> {
    let draft = CategoryDraft::try_from(payload.into_inner())?;
    let category = state.catalog.create_category(&draft).await?;
    Ok(HttpResponse::Created().json(category))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "updateCategory"
)]
#[put("/admin/categories/{id}")]
pub async fn update_category(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    path: web::Path<CategoryId>,
    payload: web::Json<CategoryInput>,
) -> ApiResult<web::Json<Category>> {
    let draft = CategoryDraft::try_from(payload.into_inner())?;
    Ok(web::Json(
        state.catalog.update_category(path.into_inner(), &draft).await?,
    ))
}

/// Delete a category; its products become uncategorised.
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "deleteCategory"
)]
#[delete("/admin/categories/{id}")]
pub async fn delete_category(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    path: web::Path<CategoryId>,
) -> ApiResult<HttpResponse> {
    state.catalog.delete_category(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/admin/banners",
    request_body = BannerInput,
    responses(
        (status = 201, description = "Banner created", body = Banner),
        (status = 400, description = "Invalid banner", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "createBanner"
)]
#[post("/admin/banners")]
pub async fn create_banner(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    payload: web::Json<BannerInput>,
) -> ApiResult<HttpResponse> {
    let draft = BannerDraft::try_from(payload.into_inner())?;
    let banner = state.catalog.create_banner(&draft).await?;
    Ok(HttpResponse::Created().json(banner))
}

#[utoipa::path(
    delete,
    path = "/api/admin/banners/{id}",
    params(("id" = i64, Path, description = "Banner id")),
    responses(
        (status = 204, description = "Banner deleted"),
        (status = 404, description = "Unknown banner", body = Error)
    ),
    tags = ["catalog-admin"],
    operation_id = "deleteBanner"
)]
#[delete("/admin/banners/{id}")]
pub async fn delete_banner(
    state: web::Data<StoreState>,
    _admin: AdminUser,
    path: web::Path<BannerId>,
) -> ApiResult<HttpResponse> {
    state.catalog.delete_banner(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCatalogRepository, RepositoryError};
    use crate::inbound::http::store_api;
    use crate::inbound::http::test_utils::{
        StorePorts, admin, auth_data, auth_header, customer, json_body, product, users_returning,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockall::predicate::eq;
    use rstest::rstest;
    use serde_json::json;

    async fn call(
        catalog: MockCatalogRepository,
        caller: crate::domain::User,
        request: test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let ports = StorePorts {
            catalog,
            ..StorePorts::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(auth_data(users_returning(caller)))
                .app_data(ports.into_state())
                .configure(store_api),
        )
        .await;
        test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[actix_web::test]
    async fn lists_products_in_requested_language() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_list_products()
            .withf(|filter, page| {
                filter.search.as_deref() == Some("choy") && page.page() == 2 && page.limit() == 5
            })
            .return_once(|_, page| Ok(Paginated::new(vec![product(7)], page, 6)));

        let response = call(
            catalog,
            customer(1),
            test::TestRequest::get().uri("/api/products?search=choy&page=2&limit=5&lang=uz"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["items"][0]["name"], "Mahsulot 7");
        assert_eq!(body["items"][0]["sku"], "SKU-7");
        assert_eq!(body["items"][0]["effective_price"], 10_000);
    }

    #[rstest]
    #[case("/api/products?limit=0")]
    #[case("/api/products?lang=en")]
    #[case("/api/products?page=abc")]
    #[actix_web::test]
    async fn rejects_invalid_listing_queries(#[case] uri: &str) {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_list_products().never();

        let response = call(catalog, customer(1), test::TestRequest::get().uri(uri)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "invalid_request");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(false))]
    #[actix_web::test]
    async fn missing_or_inactive_product_is_not_found(#[case] active: Option<bool>) {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_find_product()
            .with(eq(9))
            .return_once(move |_| {
                Ok(active.map(|is_active| Product {
                    is_active,
                    ..product(9)
                }))
            });

        let response = call(catalog, customer(1), test::TestRequest::get().uri("/api/products/9")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn customers_cannot_create_products() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_create_product().never();

        let response = call(
            catalog,
            customer(1),
            test::TestRequest::post()
                .uri("/api/admin/products")
                .insert_header(auth_header(1))
                .set_json(json!({ "sku": "TEA-1", "name_ru": "Чай", "name_uz": "Choy", "price": 5000 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn admin_product_validation_reports_the_field() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_create_product().never();

        let response = call(
            catalog,
            admin(2),
            test::TestRequest::post()
                .uri("/api/admin/products")
                .insert_header(auth_header(2))
                .set_json(json!({
                    "sku": "TEA-1", "name_ru": "Чай", "name_uz": "Choy",
                    "price": 5000, "sale_price": 6000
                })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "sale_price");
    }

    #[rstest]
    #[actix_web::test]
    async fn duplicate_sku_is_a_conflict() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_create_product()
            .return_once(|_| Err(RepositoryError::conflict("sku TEA-1 already exists")));

        let response = call(
            catalog,
            admin(2),
            test::TestRequest::post()
                .uri("/api/admin/products")
                .insert_header(auth_header(2))
                .set_json(json!({ "sku": "TEA-1", "name_ru": "Чай", "name_uz": "Choy", "price": 5000 })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[actix_web::test]
    async fn admin_deletes_banner() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_delete_banner()
            .with(eq(4))
            .times(1)
            .return_once(|_| Ok(()));

        let response = call(
            catalog,
            admin(2),
            test::TestRequest::delete()
                .uri("/api/admin/banners/4")
                .insert_header(auth_header(2)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
