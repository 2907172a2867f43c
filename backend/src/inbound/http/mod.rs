//! HTTP inbound adapter exposing REST endpoints.
//!
//! [`store_api`] mounts the Mini-App storefront under `/api`; [`seller_api`]
//! mounts the Seller App under `/api/seller`. Both install the extractor
//! error handlers so malformed input yields the shared error envelope.

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod favorites;
pub mod health;
pub mod inventory;
pub mod marketplaces;
pub mod orders;
pub mod pricing;
pub mod purchases;
pub mod schemas;
pub mod state;
pub mod telegram_webhook;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler));
}

/// Register the storefront routes.
pub fn store_api(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    cfg.service(
        web::scope("/api")
            .service(catalog::list_categories)
            .service(catalog::list_products)
            .service(catalog::get_product)
            .service(catalog::list_banners)
            .service(cart::get_cart)
            .service(cart::clear_cart)
            .service(cart::add_cart_item)
            .service(cart::update_cart_item)
            .service(cart::remove_cart_item)
            .service(favorites::list_favorites)
            .service(favorites::add_favorite)
            .service(favorites::remove_favorite)
            .service(orders::place_order)
            .service(orders::list_my_orders)
            .service(orders::get_my_order)
            .service(orders::cancel_my_order)
            .service(users::current_user)
            .service(users::update_current_user)
            .service(catalog::create_product)
            .service(catalog::update_product)
            .service(catalog::delete_product)
            .service(catalog::create_category)
            .service(catalog::update_category)
            .service(catalog::delete_category)
            .service(catalog::create_banner)
            .service(catalog::delete_banner)
            .service(orders::list_orders)
            .service(orders::change_order_status)
            .service(users::list_users)
            .service(telegram_webhook::telegram_webhook),
    );
}

/// Register the seller routes.
pub fn seller_api(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    cfg.service(
        web::scope("/api/seller")
            .service(inventory::list_inventory)
            .service(inventory::adjust_stock)
            .service(inventory::list_movements)
            .service(inventory::set_threshold)
            .service(purchases::create_purchase)
            .service(purchases::list_purchases)
            .service(purchases::get_purchase)
            .service(pricing::list_prices)
            .service(pricing::upsert_price)
            .service(pricing::update_storefront_price)
            .service(marketplaces::list_marketplaces)
            .service(marketplaces::create_marketplace)
            .service(marketplaces::update_marketplace)
            .service(marketplaces::sync_marketplace)
            .service(analytics::rebuild_analytics)
            .service(analytics::analytics_summary)
            .service(analytics::top_products),
    );
}
