//! Orders, their lines and the status lifecycle.
//!
//! ```text
//! new ──► processing ──► ready ──► delivered
//!  │          │            │
//!  └──────────┴────────────┴──► cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::catalog::ProductId;
use super::user::{Phone, UserId};
use super::validation::{FieldError, optional_text};
use super::{Error, MAX_LINE_QUANTITY};

pub type OrderId = i64;

/// Maximum number of lines in one order request.
pub const MAX_ORDER_LINES: usize = 50;
const ADDRESS_MAX: usize = 500;
const COMMENT_MAX: usize = 1000;

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Processing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Processing,
        Self::Ready,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// States reachable in one step.
    pub fn next_states(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::Delivered, Self::Cancelled],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next_states().contains(&target)
    }

    /// Validate a transition, returning the new state.
    pub fn transition_to(self, target: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot change order status from {from} to {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl From<InvalidTransition> for Error {
    fn from(err: InvalidTransition) -> Self {
        Error::conflict(err.to_string()).with_details(json!({
            "code": "invalid_status_transition",
            "from": err.from,
            "to": err.to,
        }))
    }
}

/// Not enough stock to fulfil a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
pub struct StockShortage {
    pub product_id: ProductId,
    pub available: i32,
    pub requested: i32,
}

impl From<StockShortage> for Error {
    fn from(err: StockShortage) -> Self {
        Error::conflict("insufficient stock").with_details(json!({
            "code": "insufficient_stock",
            "product_id": err.product_id,
            "available": err.available,
            "requested": err.requested,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Pickup,
    Delivery,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pickup" => Some(Self::Pickup),
            "delivery" => Some(Self::Delivery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(Self::Cash),
            "card" => Some(Self::Card),
            _ => None,
        }
    }
}

/// One requested line of `POST /api/orders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct OrderInput {
    pub items: Vec<OrderLineInput>,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
}

/// Validated order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Validated order request.
///
/// Lines are unique per product and sorted by product id so inventory rows
/// are always locked in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    lines: Vec<OrderLine>,
    pub phone: Phone,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
}

impl OrderDraft {
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }
}

impl TryFrom<OrderInput> for OrderDraft {
    type Error = FieldError;

    fn try_from(input: OrderInput) -> Result<Self, Self::Error> {
        if input.items.is_empty() {
            return Err(FieldError::required("items"));
        }
        if input.items.len() > MAX_ORDER_LINES {
            return Err(FieldError::out_of_range(
                "items",
                format!("an order may contain at most {MAX_ORDER_LINES} lines"),
            )
            .with_value(input.items.len()));
        }

        let mut lines: Vec<OrderLine> = Vec::with_capacity(input.items.len());
        for item in &input.items {
            if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
                return Err(FieldError::out_of_range(
                    "quantity",
                    format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"),
                )
                .with_value(item.quantity));
            }
            match lines.iter_mut().find(|line| line.product_id == item.product_id) {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => lines.push(OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                }),
            }
        }
        if let Some(line) = lines.iter().find(|line| line.quantity > MAX_LINE_QUANTITY) {
            return Err(FieldError::out_of_range(
                "quantity",
                format!(
                    "combined quantity for product {} exceeds {MAX_LINE_QUANTITY}",
                    line.product_id
                ),
            )
            .with_value(line.quantity));
        }
        lines.sort_by_key(|line| line.product_id);

        let address = optional_text("address", input.address.as_deref(), ADDRESS_MAX)?;
        if input.delivery_type == DeliveryType::Delivery && address.is_none() {
            return Err(FieldError::required("address"));
        }

        Ok(Self {
            lines,
            phone: Phone::parse(&input.phone)?,
            address,
            comment: optional_text("comment", input.comment.as_deref(), COMMENT_MAX)?,
            delivery_type: input.delivery_type,
            payment_method: input.payment_method,
        })
    }
}

/// Line of a placed order with the price captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub sku: String,
    pub name_ru: String,
    pub name_uz: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub phone: String,
    pub address: Option<String>,
    pub comment: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order after a successful status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
}
