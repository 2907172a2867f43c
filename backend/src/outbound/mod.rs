//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **cache**: `moka` TTL cache in front of the catalog repository
//! - **telegram**: Bot API delivery and update polling
//! - **marketplace**: Yandex Market and Uzum partner API clients
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod marketplace;
pub mod persistence;
pub mod telegram;
