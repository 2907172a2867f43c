//! Shared Diesel error mapping for every repository adapter.
//!
//! PostgreSQL conditions map onto [`RepositoryError`] as follows:
//!
//! | Condition | Variant |
//! |---|---|
//! | unique violation (23505) | `Conflict` |
//! | foreign key (23503), check (23514), not-null (23502) | `Constraint` |
//! | closed connection, pool checkout or build failure | `Connection` |
//! | no row | `NotFound` |
//! | anything else | `Query` |

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Map pool errors to repository connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> RepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RepositoryError::connection(message)
        }
    }
}

fn constraint_message(info: &dyn DatabaseErrorInformation, fallback: &str) -> String {
    match info.constraint_name() {
        Some(name) => format!("{fallback} ({name})"),
        None => fallback.to_owned(),
    }
}

/// Map Diesel errors to repository errors.
pub(crate) fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => RepositoryError::not_found("record not found"),
        DieselError::QueryBuilderError(_) => RepositoryError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::conflict(constraint_message(info.as_ref(), "record already exists"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            RepositoryError::constraint(constraint_message(
                info.as_ref(),
                "referenced record does not exist",
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
            RepositoryError::constraint(constraint_message(info.as_ref(), "value out of range"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::NotNullViolation, info) => {
            RepositoryError::constraint(constraint_message(info.as_ref(), "required value missing"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => RepositoryError::query("database error"),
        _ => RepositoryError::query("database error"),
    }
}

/// Lets `?` on Diesel calls inside `transaction` closures whose error type is
/// [`RepositoryError`].
impl From<DieselError> for RepositoryError {
    fn from(error: DieselError) -> Self {
        map_diesel_error(error)
    }
}

/// Row counts travel as `i64`; page envelopes count in `u64`.
pub(crate) fn count_to_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for PostgreSQL error classification.

    use super::*;
    use rstest::rstest;

    struct Info {
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "boom"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { constraint }))
    }

    #[rstest]
    fn unique_violation_is_a_conflict_naming_the_constraint() {
        let err = map_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            Some("products_sku_key"),
        ));
        assert_eq!(
            err,
            RepositoryError::conflict("record already exists (products_sku_key)")
        );
    }

    #[rstest]
    #[case(DatabaseErrorKind::ForeignKeyViolation)]
    #[case(DatabaseErrorKind::CheckViolation)]
    #[case(DatabaseErrorKind::NotNullViolation)]
    fn integrity_failures_are_constraint_errors(#[case] kind: DatabaseErrorKind) {
        let err = map_diesel_error(database_error(kind, None));
        assert!(matches!(err, RepositoryError::Constraint { .. }));
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let err = map_diesel_error(database_error(DatabaseErrorKind::ClosedConnection, None));
        assert!(matches!(err, RepositoryError::Connection { .. }));
    }

    #[rstest]
    fn missing_row_is_not_found() {
        assert!(matches!(
            map_diesel_error(DieselError::NotFound),
            RepositoryError::NotFound { .. }
        ));
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        assert_eq!(
            map_pool_error(PoolError::checkout("timed out")),
            RepositoryError::connection("timed out")
        );
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(42, 42)]
    fn negative_counts_clamp_to_zero(#[case] count: i64, #[case] expected: u64) {
        assert_eq!(count_to_total(count), expected);
    }
}
