//! Port for orders.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Order, OrderDraft, OrderId, OrderStatus, StatusChange, UserId};

use super::RepositoryError;

/// Order persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Place an order in one transaction.
    ///
    /// Locks the inventory rows of every product in draft order, snapshots
    /// effective prices, rejects unknown or inactive products with
    /// `NotFound` and short stock with `InsufficientStock`, inserts the order
    /// and its lines, decrements stock with `sale` movements and drops the
    /// ordered products from the user's cart.
    async fn place(&self, user_id: UserId, draft: &OrderDraft) -> Result<Order, RepositoryError>;

    /// Orders of one user, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Paginated<Order>, RepositoryError>;

    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// All orders, optionally filtered by status, newest first.
    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Paginated<Order>, RepositoryError>;

    /// Move an order to `target` in one transaction.
    ///
    /// When `expected` is set the order must currently be in that state.
    /// Cancelling puts the ordered units back with `return` movements.
    async fn transition(
        &self,
        id: OrderId,
        target: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> Result<StatusChange, RepositoryError>;
}
