//! Domain ports: the traits adapters implement at the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod analytics_repository;
mod bot_notifier;
mod cart_repository;
mod catalog_repository;
mod inventory_repository;
mod marketplace_client;
mod marketplace_repository;
mod order_repository;
mod repository_error;
mod user_repository;

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
pub use analytics_repository::AnalyticsRepository;
#[cfg(test)]
pub use bot_notifier::MockBotNotifier;
pub use bot_notifier::{BotNotifier, BotNotifierError, DisabledBotNotifier};
#[cfg(test)]
pub use cart_repository::{MockCartRepository, MockFavoritesRepository};
pub use cart_repository::{CartRepository, FavoritesRepository};
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::CatalogRepository;
#[cfg(test)]
pub use inventory_repository::{MockInventoryRepository, MockPurchaseRepository};
pub use inventory_repository::{InventoryRepository, PurchaseRepository};
#[cfg(test)]
pub use marketplace_client::MockMarketplaceClient;
pub use marketplace_client::{MarketplaceClient, MarketplaceClientError, MarketplaceClients};
#[cfg(test)]
pub use marketplace_repository::{MockMarketplaceRepository, MockPricingRepository};
pub use marketplace_repository::{MarketplaceRepository, PricingRepository};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::OrderRepository;
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
