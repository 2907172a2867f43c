//! Seller stock levels and the stock movement ledger.
//!
//! ```text
//! GET /api/seller/inventory?low_stock=true&page=1&limit=20
//! POST /api/seller/inventory/{product_id}/adjust {"delta":-2,"note":"damaged"}
//! GET /api/seller/inventory/{product_id}/movements?page=1&limit=20
//! PUT /api/seller/inventory/{product_id}/threshold {"low_stock_threshold":5}
//! ```

use actix_web::{get, post, put, web};
use pagination::{PageQuery, Paginated};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, InventoryFilter, InventoryItem, InventoryMovement, ProductId, StockAdjustment,
    low_stock_threshold,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::orders::PageParams;
use crate::inbound::http::schemas::{InventoryPage, MovementPage};
use crate::inbound::http::state::SellerState;
use crate::inbound::http::validation::page_request;

/// Query of `GET /api/seller/inventory`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryQuery {
    /// Only items at or below their low-stock threshold.
    #[serde(default)]
    pub low_stock: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Body of `POST /api/seller/inventory/{product_id}/adjust`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    /// Units added (positive) or written off (negative); never zero.
    #[schema(example = -2)]
    pub delta: i32,
    pub note: Option<String>,
}

/// Body of `PUT /api/seller/inventory/{product_id}/threshold`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ThresholdRequest {
    #[schema(minimum = 0)]
    pub low_stock_threshold: i32,
}

#[utoipa::path(
    get,
    path = "/api/seller/inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Page of inventory items", body = InventoryPage),
        (status = 403, description = "Admin rights required", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "listInventory"
)]
#[get("/inventory")]
pub async fn list_inventory(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    query: web::Query<InventoryQuery>,
) -> ApiResult<web::Json<Paginated<InventoryItem>>> {
    let page = page_request(PageQuery {
        page: query.page,
        limit: query.limit,
    })?;
    let filter = InventoryFilter {
        low_stock: query.low_stock,
    };
    Ok(web::Json(state.inventory.list(filter, page).await?))
}

/// Manual stock correction recorded as an `adjustment` movement.
#[utoipa::path(
    post,
    path = "/api/seller/inventory/{product_id}/adjust",
    params(("product_id" = i64, Path, description = "Product id")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Updated stock", body = InventoryItem),
        (status = 400, description = "Zero delta", body = Error),
        (status = 404, description = "Unknown product", body = Error),
        (status = 409, description = "Stock would become negative", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "adjustStock"
)]
#[post("/inventory/{product_id}/adjust")]
pub async fn adjust_stock(
    state: web::Data<SellerState>,
    admin: AdminUser,
    path: web::Path<ProductId>,
    payload: web::Json<AdjustStockRequest>,
) -> ApiResult<web::Json<InventoryItem>> {
    let product_id = path.into_inner();
    let adjustment = StockAdjustment::new(payload.delta, payload.note.as_deref())?;
    let item = state.inventory.adjust(product_id, &adjustment).await?;
    info!(
        product_id,
        delta = adjustment.delta,
        quantity = item.quantity,
        admin_id = admin.0.id,
        "stock adjusted"
    );
    Ok(web::Json(item))
}

/// Stock ledger of one product, newest first.
#[utoipa::path(
    get,
    path = "/api/seller/inventory/{product_id}/movements",
    params(("product_id" = i64, Path, description = "Product id"), PageParams),
    responses((status = 200, description = "Page of movements", body = MovementPage)),
    tags = ["inventory"],
    operation_id = "listMovements"
)]
#[get("/inventory/{product_id}/movements")]
pub async fn list_movements(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<ProductId>,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<InventoryMovement>>> {
    let page = page_request(PageQuery::from(&*query))?;
    Ok(web::Json(
        state.inventory.movements(path.into_inner(), page).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/seller/inventory/{product_id}/threshold",
    params(("product_id" = i64, Path, description = "Product id")),
    request_body = ThresholdRequest,
    responses(
        (status = 200, description = "Updated stock", body = InventoryItem),
        (status = 400, description = "Negative threshold", body = Error),
        (status = 404, description = "Unknown product", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "setLowStockThreshold"
)]
#[put("/inventory/{product_id}/threshold")]
pub async fn set_threshold(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    path: web::Path<ProductId>,
    payload: web::Json<ThresholdRequest>,
) -> ApiResult<web::Json<InventoryItem>> {
    let threshold = low_stock_threshold(payload.low_stock_threshold)?;
    Ok(web::Json(
        state
            .inventory
            .set_threshold(path.into_inner(), threshold)
            .await?,
    ))
}
