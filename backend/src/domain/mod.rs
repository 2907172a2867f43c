//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed store and seller entities used by the API
//! and persistence layers, validate client input into drafts, and run the
//! use-cases that span several ports (checkout, marketplace sync, analytics
//! rollups, bot replies).
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User (alias to `user::User`): store customer or admin.
//! - InitDataVerifier (alias to `telegram::InitDataVerifier`): Mini-App
//!   `initData` signature check.
//! - Order, Product, InventoryItem, …: persisted aggregates.
//! - `ports`: traits implemented by outbound adapters.

pub mod analytics;
pub mod analytics_service;
pub mod auth;
pub mod bot;
pub mod cart;
pub mod cart_service;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod language;
pub mod marketplace;
pub mod marketplace_sync;
pub mod notification;
pub mod order;
pub mod order_service;
pub mod ports;
pub mod pricing;
pub mod purchase;
pub mod telegram;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::analytics::{
    AnalyticsSummary, DEFAULT_TOP_PRODUCTS, DailyAnalytics, DateRange, MAX_RANGE_DAYS,
    MAX_TOP_PRODUCTS, TopProduct, top_products_limit,
};
pub use self::analytics_service::{AnalyticsService, ROLLUP_INTERVAL};
pub use self::auth::{AdminPolicy, AuthService};
pub use self::bot::{BotUpdate, BotUpdateHandler, IncomingMessage};
pub use self::cart::{
    CartItem, CartLine, CartLineUpdate, CartQuantity, CartView, MAX_LINE_QUANTITY,
};
pub use self::cart_service::{CartService, FavoritesService};
pub use self::catalog::{
    Banner, BannerDraft, BannerId, BannerInput, Category, CategoryDraft, CategoryId,
    CategoryInput, Pricing, Product, ProductDraft, ProductFilter, ProductId, ProductInput, Sku,
    effective_price,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::inventory::{
    InventoryFilter, InventoryItem, InventoryMovement, MovementKind, StockAdjustment,
    low_stock_threshold,
};
pub use self::language::Language;
pub use self::marketplace::{
    Marketplace, MarketplaceCode, MarketplaceDraft, MarketplaceId, MarketplaceInput,
    MarketplacePatch, MarketplacePatchInput, SyncFailure, SyncListing, SyncReport,
};
pub use self::marketplace_sync::MarketplaceSyncService;
pub use self::notification::{
    ButtonAction, InlineButton, InlineKeyboard, OutgoingMessage, admin_new_order_message,
    escape_html, format_sum, order_created_message, status_changed_message, welcome_message,
};
pub use self::order::{
    DeliveryType, InvalidTransition, MAX_ORDER_LINES, Order, OrderDraft, OrderId, OrderInput,
    OrderItem, OrderLine, OrderLineInput, OrderStatus, PaymentMethod, StatusChange,
    StockShortage, UnknownStatus,
};
pub use self::order_service::{OrderNotifier, OrderService};
pub use self::pricing::{MarketplacePrice, MarketplacePriceInput, MarketplacePriceUpdate};
pub use self::purchase::{
    MAX_PURCHASE_LINES, Purchase, PurchaseDraft, PurchaseId, PurchaseInput, PurchaseItem,
};
pub use self::telegram::{
    DEFAULT_INIT_DATA_MAX_AGE, InitData, InitDataError, InitDataVerifier, TelegramUser,
    VerifiedInitData, sign_init_data,
};
pub use self::trace_id::TraceId;
pub use self::user::{Phone, User, UserId, UserProfileSync, UserProfileUpdate};
pub use self::validation::{FieldError, FieldErrorCode};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use store_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("admins only"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
