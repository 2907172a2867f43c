//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Telegram customers and store admins.
    users (id) {
        id -> Int8,
        /// Telegram account id; unique.
        telegram_id -> Int8,
        first_name -> Varchar,
        last_name -> Nullable<Varchar>,
        username -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        /// `ru` or `uz`.
        language -> Varchar,
        is_admin -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    categories (id) {
        id -> Int8,
        name_ru -> Varchar,
        name_uz -> Varchar,
        image_url -> Nullable<Varchar>,
        sort_order -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Storefront products. Prices are whole UZS.
    products (id) {
        id -> Int8,
        sku -> Varchar,
        name_ru -> Varchar,
        name_uz -> Varchar,
        description_ru -> Nullable<Text>,
        description_uz -> Nullable<Text>,
        price -> Int8,
        sale_price -> Nullable<Int8>,
        category_id -> Nullable<Int8>,
        image_url -> Nullable<Varchar>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    banners (id) {
        id -> Int8,
        title_ru -> Varchar,
        title_uz -> Varchar,
        image_url -> Varchar,
        link_url -> Nullable<Varchar>,
        sort_order -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    cart_items (user_id, product_id) {
        user_id -> Int8,
        product_id -> Int8,
        quantity -> Int4,
        added_at -> Timestamptz,
    }
}

diesel::table! {
    favorites (user_id, product_id) {
        user_id -> Int8,
        product_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    orders (id) {
        id -> Int8,
        user_id -> Int8,
        /// One of `new`, `processing`, `ready`, `delivered`, `cancelled`.
        status -> Varchar,
        total_amount -> Int8,
        phone -> Varchar,
        address -> Nullable<Text>,
        comment -> Nullable<Text>,
        delivery_type -> Varchar,
        payment_method -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Price and name snapshot of each ordered product.
    order_items (id) {
        id -> Int8,
        order_id -> Int8,
        product_id -> Int8,
        sku -> Varchar,
        name_ru -> Varchar,
        name_uz -> Varchar,
        quantity -> Int4,
        unit_price -> Int8,
        line_total -> Int8,
    }
}

diesel::table! {
    /// Stock per product. `quantity` never drops below zero.
    inventory (product_id) {
        product_id -> Int8,
        quantity -> Int4,
        reserved -> Int4,
        low_stock_threshold -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    inventory_movements (id) {
        id -> Int8,
        product_id -> Int8,
        /// One of `purchase`, `sale`, `adjustment`, `return`.
        kind -> Varchar,
        quantity_delta -> Int4,
        reference -> Nullable<Varchar>,
        note -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    purchases (id) {
        id -> Int8,
        supplier -> Nullable<Varchar>,
        note -> Nullable<Text>,
        total_cost -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    purchase_items (id) {
        id -> Int8,
        purchase_id -> Int8,
        product_id -> Int8,
        quantity -> Int4,
        unit_cost -> Int8,
    }
}

diesel::table! {
    marketplaces (id) {
        id -> Int8,
        /// `yandex` or `uzum`.
        code -> Varchar,
        name -> Varchar,
        account_id -> Varchar,
        is_active -> Bool,
        last_synced_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    product_prices (product_id, marketplace_id) {
        product_id -> Int8,
        marketplace_id -> Int8,
        price -> Int8,
        external_sku -> Nullable<Varchar>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    daily_analytics (day) {
        day -> Date,
        orders_count -> Int4,
        cancelled_count -> Int4,
        items_sold -> Int4,
        revenue -> Int8,
        new_customers -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    product_analytics (day, product_id) {
        day -> Date,
        product_id -> Int8,
        quantity_sold -> Int4,
        revenue -> Int8,
    }
}

diesel::joinable!(cart_items -> products (product_id));
diesel::joinable!(cart_items -> users (user_id));
diesel::joinable!(favorites -> products (product_id));
diesel::joinable!(favorites -> users (user_id));
diesel::joinable!(inventory -> products (product_id));
diesel::joinable!(inventory_movements -> products (product_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(orders -> users (user_id));
diesel::joinable!(product_analytics -> products (product_id));
diesel::joinable!(product_prices -> marketplaces (marketplace_id));
diesel::joinable!(product_prices -> products (product_id));
diesel::joinable!(products -> categories (category_id));
diesel::joinable!(purchase_items -> purchases (purchase_id));

diesel::allow_tables_to_appear_in_same_query!(
    banners,
    cart_items,
    categories,
    daily_analytics,
    favorites,
    inventory,
    inventory_movements,
    marketplaces,
    order_items,
    orders,
    product_analytics,
    product_prices,
    products,
    purchase_items,
    purchases,
    users,
);
