//! Checkout and order lifecycle use-cases.
//!
//! Writes happen in the repository transaction; customer and admin
//! notifications are sent afterwards on a detached task and never fail the
//! request.

use std::sync::Arc;

use pagination::{PageRequest, Paginated};
use tracing::{info, warn};

use super::ports::{BotNotifier, OrderRepository, UserRepository};
use super::{
    Error, InvalidTransition, Order, OrderDraft, OrderId, OrderStatus, OutgoingMessage, TraceId,
    User, admin_new_order_message, order_created_message, status_changed_message,
};

/// Renders and sends order notifications.
#[derive(Clone)]
pub struct OrderNotifier {
    bot: Arc<dyn BotNotifier>,
    admin_chat_id: Option<i64>,
}

impl OrderNotifier {
    pub fn new(bot: Arc<dyn BotNotifier>, admin_chat_id: Option<i64>) -> Self {
        Self { bot, admin_chat_id }
    }

    async fn deliver(&self, message: OutgoingMessage, order_id: OrderId) {
        if let Err(error) = self.bot.send_message(&message).await {
            warn!(%error, order_id, chat_id = message.chat_id, "order notification failed");
        }
    }

    /// Confirmation to the customer and a digest to the admin chat.
    pub async fn order_placed(&self, order: &Order, customer: &User) {
        let text = order_created_message(order, customer.language);
        self.deliver(OutgoingMessage::text(customer.telegram_id, text), order.id)
            .await;
        if let Some(chat_id) = self.admin_chat_id {
            let digest = admin_new_order_message(order, customer);
            self.deliver(OutgoingMessage::text(chat_id, digest), order.id)
                .await;
        }
    }

    /// Status update to the customer.
    pub async fn status_changed(&self, order: &Order, customer: &User) {
        let text = status_changed_message(order, customer.language);
        self.deliver(OutgoingMessage::text(customer.telegram_id, text), order.id)
            .await;
    }
}

/// Order use-cases for customers and store admins.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    notifier: OrderNotifier,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        notifier: OrderNotifier,
    ) -> Self {
        Self {
            orders,
            users,
            notifier,
        }
    }

    fn spawn_placed(&self, order: Order, customer: User) {
        let notifier = self.notifier.clone();
        tokio::spawn(TraceId::inherit(TraceId::current(), async move {
            notifier.order_placed(&order, &customer).await;
        }));
    }

    fn spawn_status_changed(&self, order: Order, customer: User) {
        let notifier = self.notifier.clone();
        tokio::spawn(TraceId::inherit(TraceId::current(), async move {
            notifier.status_changed(&order, &customer).await;
        }));
    }

    /// Place an order for `customer`.
    ///
    /// The order phone is copied to the profile when the customer has none.
    pub async fn place(&self, customer: &User, draft: OrderDraft) -> Result<Order, Error> {
        let order = self.orders.place(customer.id, &draft).await?;
        info!(
            order_id = order.id,
            user_id = customer.id,
            total = order.total_amount,
            lines = order.items.len(),
            "order placed"
        );

        if customer.phone.is_none() {
            if let Err(error) = self
                .users
                .set_phone_if_missing(customer.id, &draft.phone)
                .await
            {
                warn!(%error, user_id = customer.id, "failed to store customer phone");
            }
        }

        self.spawn_placed(order.clone(), customer.clone());
        Ok(order)
    }

    pub async fn list_mine(
        &self,
        customer: &User,
        page: PageRequest,
    ) -> Result<Paginated<Order>, Error> {
        Ok(self.orders.list_for_user(customer.id, page).await?)
    }

    /// Order of `customer`; other users' orders are reported as missing.
    pub async fn get_mine(&self, customer: &User, id: OrderId) -> Result<Order, Error> {
        match self.orders.find(id).await? {
            Some(order) if order.user_id == customer.id => Ok(order),
            _ => Err(Error::not_found(format!("order {id} not found"))),
        }
    }

    /// Customer cancellation, allowed only while the order is `new`.
    pub async fn cancel_mine(&self, customer: &User, id: OrderId) -> Result<Order, Error> {
        let order = self.get_mine(customer, id).await?;
        if order.status != OrderStatus::New {
            return Err(InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }
        let change = self
            .orders
            .transition(id, OrderStatus::Cancelled, Some(OrderStatus::New))
            .await?;
        info!(order_id = id, user_id = customer.id, "order cancelled by customer");
        self.spawn_status_changed(change.order.clone(), customer.clone());
        Ok(change.order)
    }

    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Paginated<Order>, Error> {
        Ok(self.orders.list(status, page).await?)
    }

    /// Admin status change following the order state machine.
    pub async fn change_status(&self, id: OrderId, target: OrderStatus) -> Result<Order, Error> {
        let change = self.orders.transition(id, target, None).await?;
        info!(
            order_id = id,
            from = %change.previous,
            to = %change.order.status,
            "order status changed"
        );
        match self.users.find_by_id(change.order.user_id).await {
            Ok(Some(customer)) => self.spawn_status_changed(change.order.clone(), customer),
            Ok(None) => warn!(order_id = id, "order owner missing; status not announced"),
            Err(error) => warn!(%error, order_id = id, "failed to load order owner"),
        }
        Ok(change.order)
    }
}
