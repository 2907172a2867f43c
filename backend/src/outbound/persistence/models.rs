//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live here so
//! every adapter decodes enum columns the same way.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Banner, Category, DailyAnalytics, DeliveryType, InventoryItem, InventoryMovement, Language,
    Marketplace, MarketplaceCode, MarketplacePrice, MovementKind, Order, OrderItem, OrderStatus,
    PaymentMethod, Product, Purchase, PurchaseItem, User,
};

use super::schema::{
    banners, categories, daily_analytics, inventory, inventory_movements, marketplaces,
    order_items, orders, product_analytics, product_prices, products, purchase_items, purchases,
    users,
};

fn unknown(column: &str, value: &str) -> RepositoryError {
    RepositoryError::query(format!("unrecognised {column} value '{value}'"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub language: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let language = Language::parse(&row.language).unwrap_or_else(|| {
            tracing::warn!(
                value = %row.language,
                user_id = row.id,
                "unrecognised language value, defaulting to ru"
            );
            Language::default()
        });
        Self {
            id: row.id,
            telegram_id: row.telegram_id,
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
            phone: row.phone,
            language,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub telegram_id: i64,
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub language: &'a str,
}

/// Profile refresh applied on every login; `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TelegramProfileChangeset<'a> {
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Client profile edit; `None` leaves the column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserProfileChangeset<'a> {
    pub phone: Option<&'a str>,
    pub language: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CategoryRow {
    pub id: i64,
    pub name_ru: String,
    pub name_uz: String,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name_ru: row.name_ru,
            name_uz: row.name_uz,
            image_url: row.image_url,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = categories)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CategoryValues<'a> {
    pub name_ru: &'a str,
    pub name_uz: &'a str,
    pub image_url: Option<&'a str>,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: i64,
    pub sku: String,
    pub name_ru: String,
    pub name_uz: String,
    pub description_ru: Option<String>,
    pub description_uz: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            name_ru: row.name_ru,
            name_uz: row.name_uz,
            description_ru: row.description_ru,
            description_uz: row.description_uz,
            price: row.price,
            sale_price: row.sale_price,
            category_id: row.category_id,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProductValues<'a> {
    pub sku: &'a str,
    pub name_ru: &'a str,
    pub name_uz: &'a str,
    pub description_ru: Option<&'a str>,
    pub description_uz: Option<&'a str>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub category_id: Option<i64>,
    pub image_url: Option<&'a str>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = banners)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BannerRow {
    pub id: i64,
    pub title_ru: String,
    pub title_uz: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<BannerRow> for Banner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: row.id,
            title_ru: row.title_ru,
            title_uz: row.title_uz,
            image_url: row.image_url,
            link_url: row.link_url,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = banners)]
pub(crate) struct NewBannerRow<'a> {
    pub title_ru: &'a str,
    pub title_uz: &'a str,
    pub image_url: &'a str,
    pub link_url: Option<&'a str>,
    pub sort_order: i32,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub total_amount: i64,
    pub phone: String,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub delivery_type: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub(crate) fn status(&self) -> Result<OrderStatus, RepositoryError> {
        self.status
            .parse()
            .map_err(|_| unknown("orders.status", &self.status))
    }

    /// Assemble the aggregate from the order row and its items.
    pub(crate) fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
        let status = self.status()?;
        let delivery_type = DeliveryType::parse(&self.delivery_type)
            .ok_or_else(|| unknown("orders.delivery_type", &self.delivery_type))?;
        let payment_method = PaymentMethod::parse(&self.payment_method)
            .ok_or_else(|| unknown("orders.payment_method", &self.payment_method))?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status,
            total_amount: self.total_amount,
            phone: self.phone,
            address: self.address,
            comment: self.comment,
            delivery_type,
            payment_method,
            items: items.into_iter().map(OrderItem::from).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub user_id: i64,
    pub status: &'a str,
    pub total_amount: i64,
    pub phone: &'a str,
    pub address: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub delivery_type: &'a str,
    pub payment_method: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderItemRow {
    pub order_id: i64,
    pub product_id: i64,
    pub sku: String,
    pub name_ru: String,
    pub name_uz: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            sku: row.sku,
            name_ru: row.name_ru,
            name_uz: row.name_uz,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub(crate) struct NewOrderItemRow<'a> {
    pub order_id: i64,
    pub product_id: i64,
    pub sku: &'a str,
    pub name_ru: &'a str,
    pub name_uz: &'a str,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Inventory row joined with the product's SKU and Russian name.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct InventoryJoinRow {
    pub product_id: i64,
    pub quantity: i32,
    pub reserved: i32,
    pub low_stock_threshold: i32,
    pub updated_at: DateTime<Utc>,
    pub sku: String,
    pub name: String,
}

impl From<InventoryJoinRow> for InventoryItem {
    fn from(row: InventoryJoinRow) -> Self {
        Self {
            product_id: row.product_id,
            sku: row.sku,
            name: row.name,
            quantity: row.quantity,
            reserved: row.reserved,
            low_stock_threshold: row.low_stock_threshold,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inventory)]
pub(crate) struct NewInventoryRow {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = inventory_movements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MovementRow {
    pub id: i64,
    pub product_id: i64,
    pub kind: String,
    pub quantity_delta: i32,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for InventoryMovement {
    type Error = RepositoryError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind = MovementKind::parse(&row.kind)
            .ok_or_else(|| unknown("inventory_movements.kind", &row.kind))?;
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            kind,
            quantity_delta: row.quantity_delta,
            reference: row.reference,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inventory_movements)]
pub(crate) struct NewMovementRow<'a> {
    pub product_id: i64,
    pub kind: &'a str,
    pub quantity_delta: i32,
    pub reference: Option<String>,
    pub note: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PurchaseRow {
    pub id: i64,
    pub supplier: Option<String>,
    pub note: Option<String>,
    pub total_cost: i64,
    pub created_at: DateTime<Utc>,
}

impl PurchaseRow {
    pub(crate) fn into_purchase(self, items: Vec<PurchaseItemRow>) -> Purchase {
        Purchase {
            id: self.id,
            supplier: self.supplier,
            note: self.note,
            total_cost: self.total_cost,
            created_at: self.created_at,
            items: items
                .into_iter()
                .map(|item| PurchaseItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_cost: item.unit_cost,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow<'a> {
    pub supplier: Option<&'a str>,
    pub note: Option<&'a str>,
    pub total_cost: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = purchase_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PurchaseItemRow {
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_cost: i64,
}

// ---------------------------------------------------------------------------
// Marketplaces and prices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = marketplaces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MarketplaceRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub account_id: String,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl TryFrom<MarketplaceRow> for Marketplace {
    type Error = RepositoryError;

    fn try_from(row: MarketplaceRow) -> Result<Self, Self::Error> {
        let code =
            MarketplaceCode::parse(&row.code).ok_or_else(|| unknown("marketplaces.code", &row.code))?;
        Ok(Self {
            id: row.id,
            code,
            name: row.name,
            account_id: row.account_id,
            is_active: row.is_active,
            last_synced_at: row.last_synced_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = marketplaces)]
pub(crate) struct NewMarketplaceRow<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub account_id: &'a str,
    pub is_active: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = marketplaces)]
pub(crate) struct MarketplaceChangeset<'a> {
    pub name: Option<&'a str>,
    pub account_id: Option<&'a str>,
    pub is_active: Option<bool>,
}

/// Marketplace price joined with the product's SKU and Russian name.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct PriceJoinRow {
    pub product_id: i64,
    pub marketplace_id: i64,
    pub price: i64,
    pub external_sku: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub sku: String,
    pub name: String,
}

impl From<PriceJoinRow> for MarketplacePrice {
    fn from(row: PriceJoinRow) -> Self {
        Self {
            product_id: row.product_id,
            marketplace_id: row.marketplace_id,
            sku: row.sku,
            name: row.name,
            price: row.price,
            external_sku: row.external_sku,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = product_prices)]
pub(crate) struct NewProductPriceRow<'a> {
    pub product_id: i64,
    pub marketplace_id: i64,
    pub price: i64,
    pub external_sku: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = daily_analytics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DailyAnalyticsRow {
    pub day: NaiveDate,
    pub orders_count: i32,
    pub cancelled_count: i32,
    pub items_sold: i32,
    pub revenue: i64,
    pub new_customers: i32,
}

impl From<DailyAnalyticsRow> for DailyAnalytics {
    fn from(row: DailyAnalyticsRow) -> Self {
        Self {
            day: row.day,
            orders_count: row.orders_count,
            cancelled_count: row.cancelled_count,
            items_sold: row.items_sold,
            revenue: row.revenue,
            new_customers: row.new_customers,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = product_analytics)]
pub(crate) struct ProductAnalyticsRow {
    pub day: NaiveDate,
    pub product_id: i64,
    pub quantity_sold: i32,
    pub revenue: i64,
}
