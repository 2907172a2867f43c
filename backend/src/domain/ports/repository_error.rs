//! Error shared by the persistence ports.

use serde_json::json;

use crate::domain::order::{InvalidTransition, OrderStatus, StockShortage};
use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Errors raised by repository adapters.
    pub enum RepositoryError {
        /// The database could not be reached.
        Connection { message: String } =>
            "repository connection failed: {message}",
        /// The addressed row does not exist.
        NotFound { message: String } => "{message}",
        /// A uniqueness rule was violated.
        Conflict { message: String } => "{message}",
        /// A foreign key, check or not-null constraint rejected the write.
        Constraint { message: String } => "{message}",
        /// Not enough stock to apply a decrement.
        InsufficientStock { product_id: i64, available: i32, requested: i32 } =>
            "insufficient stock for product {product_id}: requested {requested}, available {available}",
        /// The order is not in a state that permits the requested change.
        InvalidTransition { from: OrderStatus, to: OrderStatus } =>
            "cannot change order status from {from} to {to}",
        /// Any other query failure.
        Query { message: String } =>
            "repository query failed: {message}",
    }
}

impl From<StockShortage> for RepositoryError {
    fn from(value: StockShortage) -> Self {
        Self::insufficient_stock(value.product_id, value.available, value.requested)
    }
}

impl From<InvalidTransition> for RepositoryError {
    fn from(value: InvalidTransition) -> Self {
        Self::invalid_transition(value.from, value.to)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Connection { message } => {
                tracing::warn!(%message, "database unavailable");
                Error::service_unavailable("database unavailable")
            }
            RepositoryError::NotFound { message } => Error::not_found(message),
            RepositoryError::Conflict { message } => Error::conflict(message),
            RepositoryError::Constraint { message } => {
                Error::invalid_request(message).with_details(json!({ "code": "constraint_violation" }))
            }
            RepositoryError::InsufficientStock {
                product_id,
                available,
                requested,
            } => StockShortage {
                product_id,
                available,
                requested,
            }
            .into(),
            RepositoryError::InvalidTransition { from, to } => {
                InvalidTransition { from, to }.into()
            }
            RepositoryError::Query { message } => {
                tracing::error!(%message, "repository query failed");
                Error::internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(RepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(RepositoryError::not_found("product not found"), ErrorCode::NotFound)]
    #[case(RepositoryError::conflict("sku already exists"), ErrorCode::Conflict)]
    #[case(RepositoryError::constraint("unknown category"), ErrorCode::InvalidRequest)]
    #[case(RepositoryError::insufficient_stock(1_i64, 0_i32, 2_i32), ErrorCode::Conflict)]
    #[case(
        RepositoryError::invalid_transition(OrderStatus::Delivered, OrderStatus::New),
        ErrorCode::Conflict
    )]
    #[case(RepositoryError::query("syntax error"), ErrorCode::InternalError)]
    fn maps_to_domain_error_codes(#[case] err: RepositoryError, #[case] expected: ErrorCode) {
        assert_eq!(Error::from(err).code(), expected);
    }

    #[rstest]
    fn connection_errors_hide_driver_message() {
        let err = Error::from(RepositoryError::connection("password authentication failed"));
        assert_eq!(err.message(), "database unavailable");
    }
}
