//! Shared HTTP adapter state.
//!
//! Handlers accept these bundles via `actix_web::web::Data` so they only
//! depend on domain ports and services and remain testable without I/O. The
//! [`AuthService`](crate::domain::AuthService) used by the extractors is
//! registered separately because both surfaces need it.

use std::sync::Arc;

use crate::domain::ports::{
    CatalogRepository, InventoryRepository, MarketplaceRepository, PricingRepository,
    PurchaseRepository, UserRepository,
};
use crate::domain::{
    AnalyticsService, BotUpdateHandler, CartService, FavoritesService, MarketplaceSyncService,
    OrderService,
};

/// Dependencies of the Telegram Mini-App storefront.
#[derive(Clone)]
pub struct StoreState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub users: Arc<dyn UserRepository>,
    pub cart: CartService,
    pub favorites: FavoritesService,
    pub orders: OrderService,
    pub bot: BotUpdateHandler,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`; the webhook answers 404
    /// when unset.
    pub webhook_secret: Option<String>,
}

/// Dependencies of the Seller App.
#[derive(Clone)]
pub struct SellerState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub marketplaces: Arc<dyn MarketplaceRepository>,
    pub pricing: Arc<dyn PricingRepository>,
    pub sync: MarketplaceSyncService,
    pub analytics: AnalyticsService,
}
