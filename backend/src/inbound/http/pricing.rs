//! Marketplace price lists and storefront price changes.
//!
//! ```text
//! GET /api/seller/prices?marketplace_id=1
//! PUT /api/seller/prices/{product_id}/{marketplace_id} {"price":125000,"external_sku":"YM-1"}
//! PATCH /api/seller/products/{id}/price {"price":99000,"sale_price":89000}
//! ```

use actix_web::{get, patch, put, web};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, MarketplaceId, MarketplacePrice, MarketplacePriceInput, MarketplacePriceUpdate,
    Pricing, Product, ProductId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::state::SellerState;

/// Query of `GET /api/seller/prices`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PriceListQuery {
    pub marketplace_id: Option<MarketplaceId>,
}

/// Body of `PATCH /api/seller/products/{id}/price`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StorefrontPriceRequest {
    #[schema(example = 99000)]
    pub price: i64,
    #[schema(example = 89000)]
    pub sale_price: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/seller/prices",
    params(PriceListQuery),
    responses(
        (status = 200, description = "Marketplace prices ordered by SKU", body = [MarketplacePrice]),
        (status = 403, description = "Admin rights required", body = Error)
    ),
    tags = ["pricing"],
    operation_id = "listPrices"
)]
#[get("/prices")]
pub async fn list_prices(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    query: web::Query<PriceListQuery>,
) -> ApiResult<web::Json<Vec<MarketplacePrice>>> {
    Ok(web::Json(state.pricing.list(query.marketplace_id).await?))
}

/// Insert or replace the price of a product on one marketplace.
#[utoipa::path(
    put,
    path = "/api/seller/prices/{product_id}/{marketplace_id}",
    params(
        ("product_id" = i64, Path, description = "Product id"),
        ("marketplace_id" = i64, Path, description = "Marketplace id")
    ),
    request_body = MarketplacePriceInput,
    responses(
        (status = 200, description = "Stored price", body = MarketplacePrice),
        (status = 400, description = "Invalid price", body = Error),
        (status = 404, description = "Unknown product or marketplace", body = Error)
    ),
    tags = ["pricing"],
    operation_id = "upsertPrice"
)]
#[put("/prices/{product_id}/{marketplace_id}")]
pub async fn upsert_price(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<(ProductId, MarketplaceId)>,
    payload: web::Json<MarketplacePriceInput>,
) -> ApiResult<web::Json<MarketplacePrice>> {
    let (product_id, marketplace_id) = path.into_inner();
    let update = MarketplacePriceUpdate::try_from(payload.into_inner())?;
    let price = state
        .pricing
        .upsert(product_id, marketplace_id, &update)
        .await?;
    info!(product_id, marketplace_id, price = price.price, "marketplace price stored");
    Ok(web::Json(price))
}

/// Change the storefront price, validated like the catalog.
#[utoipa::path(
    patch,
    path = "/api/seller/products/{id}/price",
    params(("id" = i64, Path, description = "Product id")),
    request_body = StorefrontPriceRequest,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 400, description = "Invalid price", body = Error),
        (status = 404, description = "Unknown product", body = Error)
    ),
    tags = ["pricing"],
    operation_id = "updateStorefrontPrice"
)]
#[patch("/products/{id}/price")]
pub async fn update_storefront_price(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<ProductId>,
    payload: web::Json<StorefrontPriceRequest>,
) -> ApiResult<web::Json<Product>> {
    let pricing = Pricing::new(payload.price, payload.sale_price)?;
    let product = state
        .catalog
        .update_pricing(path.into_inner(), pricing)
        .await?;
    info!(product_id = product.id, price = product.price, "storefront price changed");
    Ok(web::Json(product))
}
