//! Shopping cart of the authenticated customer.
//!
//! ```text
//! GET /api/cart
//! POST /api/cart/items {"product_id":7,"quantity":2}
//! PUT /api/cart/items/{product_id} {"quantity":0}
//! DELETE /api/cart/items/{product_id}
//! DELETE /api/cart
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{CartLineUpdate, CartQuantity, CartView, Error, ProductId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::StoreState;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    #[schema(minimum = 1, maximum = 99)]
    pub quantity: i32,
}

/// Body of `PUT /api/cart/items/{product_id}`; zero removes the line.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    #[schema(minimum = 0, maximum = 99)]
    pub quantity: i32,
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart with totals", body = CartView),
        (status = 401, description = "Missing or invalid init data", body = Error)
    ),
    tags = ["cart"],
    operation_id = "getCart"
)]
#[get("/cart")]
pub async fn get_cart(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<CartView>> {
    Ok(web::Json(state.cart.view(user.0.id).await?))
}

/// Add a product, incrementing an existing line up to 99.
#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Invalid quantity", body = Error),
        (status = 404, description = "Unknown or inactive product", body = Error)
    ),
    tags = ["cart"],
    operation_id = "addCartItem"
)]
#[post("/cart/items")]
pub async fn add_cart_item(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    payload: web::Json<AddCartItemRequest>,
) -> ApiResult<web::Json<CartView>> {
    let AddCartItemRequest {
        product_id,
        quantity,
    } = payload.into_inner();
    let quantity = CartQuantity::new(quantity)?;
    Ok(web::Json(
        state.cart.add(user.0.id, product_id, quantity).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = i64, Path, description = "Product id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Invalid quantity", body = Error),
        (status = 404, description = "Unknown or inactive product", body = Error)
    ),
    tags = ["cart"],
    operation_id = "updateCartItem"
)]
#[put("/cart/items/{product_id}")]
pub async fn update_cart_item(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
    payload: web::Json<UpdateCartItemRequest>,
) -> ApiResult<web::Json<CartView>> {
    let update = CartLineUpdate::from_quantity(payload.quantity)?;
    Ok(web::Json(
        state
            .cart
            .update(user.0.id, path.into_inner(), update)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 404, description = "Product not in the cart", body = Error)
    ),
    tags = ["cart"],
    operation_id = "removeCartItem"
)]
#[delete("/cart/items/{product_id}")]
pub async fn remove_cart_item(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
) -> ApiResult<web::Json<CartView>> {
    Ok(web::Json(
        state.cart.remove(user.0.id, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 204, description = "Cart emptied")),
    tags = ["cart"],
    operation_id = "clearCart"
)]
#[delete("/cart")]
pub async fn clear_cart(
    state: web::Data<StoreState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    state.cart.clear(user.0.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
