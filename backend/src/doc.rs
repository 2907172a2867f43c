//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for both HTTP surfaces. It registers:
//!
//! - **Paths**: storefront endpoints under `/api`, seller endpoints under
//!   `/api/seller`, the bot webhook and the health probes
//! - **Schemas**: collected from the handlers, plus the error envelope
//! - **Security**: Telegram Mini-App `initData` sent as `Authorization: tma …`
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::{
    analytics, cart, catalog, favorites, health, inventory, marketplaces, orders, pricing,
    purchases, telegram_webhook, users,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the `initData` security scheme.
pub const INIT_DATA_SCHEME: &str = "TelegramInitData";

/// Enrich the generated document with the `initData` security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            INIT_DATA_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Raw Telegram WebApp initData prefixed with `tma `.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Amazing Store backend API",
        description = "Telegram Mini-App storefront and Seller App endpoints.",
        license(name = "MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("TelegramInitData" = [])),
    paths(
        catalog::list_categories,
        catalog::list_products,
        catalog::get_product,
        catalog::list_banners,
        catalog::create_product,
        catalog::update_product,
        catalog::delete_product,
        catalog::create_category,
        catalog::update_category,
        catalog::delete_category,
        catalog::create_banner,
        catalog::delete_banner,
        cart::get_cart,
        cart::add_cart_item,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        orders::place_order,
        orders::list_my_orders,
        orders::get_my_order,
        orders::cancel_my_order,
        orders::list_orders,
        orders::change_order_status,
        users::current_user,
        users::update_current_user,
        users::list_users,
        telegram_webhook::telegram_webhook,
        inventory::list_inventory,
        inventory::adjust_stock,
        inventory::list_movements,
        inventory::set_threshold,
        purchases::create_purchase,
        purchases::list_purchases,
        purchases::get_purchase,
        pricing::list_prices,
        pricing::upsert_price,
        pricing::update_storefront_price,
        marketplaces::list_marketplaces,
        marketplaces::create_marketplace,
        marketplaces::update_marketplace,
        marketplaces::sync_marketplace,
        analytics::rebuild_analytics,
        analytics::analytics_summary,
        analytics::top_products,
        health::ready,
        health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "catalog", description = "Categories, products and banners"),
        (name = "cart", description = "Shopping cart of the caller"),
        (name = "favorites", description = "Saved products of the caller"),
        (name = "orders", description = "Checkout and order management"),
        (name = "users", description = "Profiles of Telegram users"),
        (name = "telegram", description = "Bot API webhook"),
        (name = "inventory", description = "Stock levels and movements"),
        (name = "purchases", description = "Supplier purchases"),
        (name = "pricing", description = "Storefront and marketplace prices"),
        (name = "marketplaces", description = "Marketplace accounts and sync"),
        (name = "analytics", description = "Sales rollups"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[rstest]
    #[case("/api/products")]
    #[case("/api/orders/{id}/cancel")]
    #[case("/api/admin/orders/{id}/status")]
    #[case("/api/telegram/webhook")]
    #[case("/api/seller/inventory/{product_id}/adjust")]
    #[case("/api/seller/marketplaces/{id}/sync")]
    #[case("/api/seller/analytics/top-products")]
    #[case("/health/ready")]
    fn documents_paths(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn registers_init_data_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key(INIT_DATA_SCHEME));
    }
}
