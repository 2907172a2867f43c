//! Seller analytics.
//!
//! ```text
//! POST /api/seller/analytics/rebuild?date=2024-05-01
//! GET /api/seller/analytics/summary?from=2024-05-01&to=2024-05-31
//! GET /api/seller/analytics/top-products?from=2024-05-01&to=2024-05-31&limit=10
//! ```

use actix_web::{get, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{AnalyticsSummary, DailyAnalytics, DateRange, Error, TopProduct, top_products_limit};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminUser;
use crate::inbound::http::state::SellerState;
use crate::inbound::http::validation::{FieldName, parse_date};

/// Query of `POST /api/seller/analytics/rebuild`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RebuildQuery {
    /// Day to recompute, `YYYY-MM-DD` (UTC).
    #[param(example = "2024-05-01")]
    pub date: String,
}

/// Inclusive range, both ends `YYYY-MM-DD`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    #[param(example = "2024-05-01")]
    pub from: String,
    #[param(example = "2024-05-31")]
    pub to: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TopProductsQuery {
    #[param(example = "2024-05-01")]
    pub from: String,
    #[param(example = "2024-05-31")]
    pub to: String,
    /// 1..=50, default 10.
    pub limit: Option<u32>,
}

fn date_range(from: &str, to: &str) -> Result<DateRange, Error> {
    let from = parse_date(FieldName::new("from"), from)?;
    let to = parse_date(FieldName::new("to"), to)?;
    Ok(DateRange::new(from, to)?)
}

/// Recompute the rollup of one day from its orders.
#[utoipa::path(
    post,
    path = "/api/seller/analytics/rebuild",
    params(RebuildQuery),
    responses(
        (status = 200, description = "Rebuilt day", body = DailyAnalytics),
        (status = 400, description = "Malformed date", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "rebuildAnalytics"
)]
#[post("/analytics/rebuild")]
pub async fn rebuild_analytics(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    query: web::Query<RebuildQuery>,
) -> ApiResult<web::Json<DailyAnalytics>> {
    let day = parse_date(FieldName::new("date"), &query.date)?;
    Ok(web::Json(state.analytics.rebuild(day).await?))
}

#[utoipa::path(
    get,
    path = "/api/seller/analytics/summary",
    params(RangeQuery),
    responses(
        (status = 200, description = "Totals and per-day series", body = AnalyticsSummary),
        (status = 400, description = "Invalid range", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "analyticsSummary"
)]
#[get("/analytics/summary")]
pub async fn analytics_summary(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    query: web::Query<RangeQuery>,
) -> ApiResult<web::Json<AnalyticsSummary>> {
    let range = date_range(&query.from, &query.to)?;
    Ok(web::Json(state.analytics.summary(range).await?))
}

#[utoipa::path(
    get,
    path = "/api/seller/analytics/top-products",
    params(TopProductsQuery),
    responses(
        (status = 200, description = "Best sellers by revenue", body = [TopProduct]),
        (status = 400, description = "Invalid range or limit", body = Error)
    ),
    tags = ["analytics"],
    operation_id = "topProducts"
)]
#[get("/analytics/top-products")]
pub async fn top_products(
    state: web::Data<SellerState>,
    _admin: AdminUser,
    query: web::Query<TopProductsQuery>,
) -> ApiResult<web::Json<Vec<TopProduct>>> {
    let range = date_range(&query.from, &query.to)?;
    let limit = top_products_limit(query.limit)?;
    Ok(web::Json(state.analytics.top_products(range, limit).await?))
}
