//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Every repository port of the store and seller surfaces has a Diesel
//! implementation here, backed by `diesel-async` and a `bb8` pool.
//!
//! - Repository implementations translate between row structs and domain
//!   types. Invariants that need row locks (stock decrements, status
//!   transitions) run inside one transaction per call.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) never
//!   leave this module.
//! - Driver and pool failures become [`RepositoryError`] variants in
//!   `diesel_error_mapping.rs`.
//!
//! [`RepositoryError`]: crate::domain::ports::RepositoryError
//!
//! # Example
//!
//! ```ignore
//! use store_backend::outbound::persistence::{DbPool, DieselCatalogRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/store")).await?;
//! let catalog = DieselCatalogRepository::new(pool);
//! ```

mod diesel_analytics_repository;
mod diesel_cart_repository;
mod diesel_catalog_repository;
mod diesel_error_mapping;
mod diesel_inventory_repository;
mod diesel_marketplace_repository;
mod diesel_order_repository;
mod diesel_stock;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_analytics_repository::DieselAnalyticsRepository;
pub use diesel_cart_repository::{DieselCartRepository, DieselFavoritesRepository};
pub use diesel_catalog_repository::DieselCatalogRepository;
pub use diesel_inventory_repository::{DieselInventoryRepository, DieselPurchaseRepository};
pub use diesel_marketplace_repository::{DieselMarketplaceRepository, DieselPricingRepository};
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
