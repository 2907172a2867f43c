//! Builders wiring Diesel repositories, caches and clients into HTTP state.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use store_backend::domain::ports::{
    BotNotifier, CatalogRepository, DisabledBotNotifier, MarketplaceClients, UserRepository,
};
use store_backend::domain::{
    AdminPolicy, AnalyticsService, AuthService, BotUpdateHandler, CartService, FavoritesService,
    InitDataVerifier, MarketplaceCode, MarketplaceSyncService, OrderNotifier, OrderService,
};
use store_backend::inbound::http::state::{SellerState, StoreState};
use store_backend::outbound::cache::CachedCatalogRepository;
use store_backend::outbound::marketplace::{UzumClient, YandexClient};
use store_backend::outbound::persistence::{
    DbPool, DieselAnalyticsRepository, DieselCartRepository, DieselCatalogRepository,
    DieselFavoritesRepository, DieselInventoryRepository, DieselMarketplaceRepository,
    DieselOrderRepository, DieselPricingRepository, DieselPurchaseRepository,
    DieselUserRepository,
};
use store_backend::outbound::telegram::TelegramBotClient;

use super::config::AppSettings;

const MARKETPLACE_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared adapters both surfaces are built from.
#[derive(Clone)]
pub struct Adapters {
    pub pool: DbPool,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub bot: Arc<dyn BotNotifier>,
    pub bot_client: Option<Arc<TelegramBotClient>>,
}

impl Adapters {
    pub fn new(pool: DbPool, settings: &AppSettings) -> Self {
        let bot_client = match TelegramBotClient::new(settings.bot_token.as_str()) {
            Ok(client) => Some(Arc::new(client)),
            Err(error) => {
                warn!(%error, "telegram client unavailable; notifications disabled");
                None
            }
        };
        let bot: Arc<dyn BotNotifier> = match &bot_client {
            Some(client) => client.clone(),
            None => Arc::new(DisabledBotNotifier),
        };
        let catalog = Arc::new(CachedCatalogRepository::new(
            Arc::new(DieselCatalogRepository::new(pool.clone())),
            settings.cache_ttl,
        ));
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            catalog,
            clock: Arc::new(DefaultClock),
            bot,
            bot_client,
            pool,
        }
    }
}

/// `initData` authentication for the configured surface.
pub fn build_auth(adapters: &Adapters, settings: &AppSettings) -> web::Data<AuthService> {
    web::Data::new(AuthService::new(
        InitDataVerifier::new(settings.auth_bot_token.as_str(), settings.auth_max_age),
        adapters.users.clone(),
        AdminPolicy::new(settings.admin_telegram_ids.iter().copied()),
        adapters.clock.clone(),
    ))
}

/// Bot `/start` replies for the webhook and the poller.
pub fn build_bot_handler(adapters: &Adapters, settings: &AppSettings) -> BotUpdateHandler {
    BotUpdateHandler::new(adapters.bot.clone(), settings.mini_app_url.clone())
}

pub fn build_store_state(adapters: &Adapters, settings: &AppSettings) -> web::Data<StoreState> {
    let pool = &adapters.pool;
    let orders = OrderService::new(
        Arc::new(DieselOrderRepository::new(pool.clone())),
        adapters.users.clone(),
        OrderNotifier::new(adapters.bot.clone(), settings.admin_chat_id),
    );
    web::Data::new(StoreState {
        catalog: adapters.catalog.clone(),
        users: adapters.users.clone(),
        cart: CartService::new(
            adapters.catalog.clone(),
            Arc::new(DieselCartRepository::new(pool.clone())),
        ),
        favorites: FavoritesService::new(
            adapters.catalog.clone(),
            Arc::new(DieselFavoritesRepository::new(pool.clone())),
        ),
        orders,
        bot: build_bot_handler(adapters, settings),
        webhook_secret: settings.webhook_secret.clone(),
    })
}

/// Marketplace clients for every code with configured credentials.
fn build_marketplace_clients(settings: &AppSettings) -> MarketplaceClients {
    let mut clients = MarketplaceClients::new();
    if let Some(credentials) = &settings.yandex {
        match YandexClient::new(
            credentials.api_url.as_str(),
            credentials.secret.as_str(),
            MARKETPLACE_TIMEOUT,
        ) {
            Ok(client) => clients = clients.with(MarketplaceCode::Yandex, Arc::new(client)),
            Err(error) => warn!(%error, "yandex client unavailable"),
        }
    }
    if let Some(credentials) = &settings.uzum {
        match UzumClient::new(
            credentials.api_url.as_str(),
            credentials.secret.as_str(),
            MARKETPLACE_TIMEOUT,
        ) {
            Ok(client) => clients = clients.with(MarketplaceCode::Uzum, Arc::new(client)),
            Err(error) => warn!(%error, "uzum client unavailable"),
        }
    }
    info!(
        yandex = clients.get(MarketplaceCode::Yandex).is_some(),
        uzum = clients.get(MarketplaceCode::Uzum).is_some(),
        "marketplace clients configured"
    );
    clients
}

pub fn build_seller_state(adapters: &Adapters, settings: &AppSettings) -> web::Data<SellerState> {
    let pool = &adapters.pool;
    let marketplaces = Arc::new(DieselMarketplaceRepository::new(pool.clone()));
    let pricing = Arc::new(DieselPricingRepository::new(pool.clone()));
    web::Data::new(SellerState {
        catalog: adapters.catalog.clone(),
        inventory: Arc::new(DieselInventoryRepository::new(pool.clone())),
        purchases: Arc::new(DieselPurchaseRepository::new(pool.clone())),
        marketplaces: marketplaces.clone(),
        pricing: pricing.clone(),
        sync: MarketplaceSyncService::new(
            marketplaces,
            pricing,
            build_marketplace_clients(settings),
            adapters.clock.clone(),
        ),
        analytics: build_analytics(adapters),
    })
}

pub fn build_analytics(adapters: &Adapters) -> AnalyticsService {
    AnalyticsService::new(
        Arc::new(DieselAnalyticsRepository::new(adapters.pool.clone())),
        adapters.clock.clone(),
    )
}
