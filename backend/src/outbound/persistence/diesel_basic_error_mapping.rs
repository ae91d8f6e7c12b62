//! Shared Diesel error mapping for repositories with basic query semantics.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// `NotFound`, query-builder failures and constraint violations map to query
/// errors; a dropped connection maps to a connection error.
pub fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Whether `error` is a unique violation, optionally of a named constraint.
pub fn is_unique_violation(error: &DieselError, constraint: Option<&str>) -> bool {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => constraint
            .is_none_or(|expected| info.constraint_name().is_none_or(|name| name == expected)),
        _ => false,
    }
}

/// Whether `error` is a foreign key violation.
pub fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Sample {
        Query(&'static str),
        Connection(&'static str),
    }

    struct Info {
        constraint: Option<&'static str>,
    }

    impl diesel::result::DatabaseErrorInformation for Info {
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
    fn closed_connections_map_to_connection_errors() {
        let mapped = map_basic_diesel_error(
            database_error(DatabaseErrorKind::ClosedConnection, None),
            Sample::Query,
            Sample::Connection,
        );
        assert_eq!(mapped, Sample::Connection("database connection error"));
    }

    #[rstest]
    fn not_found_maps_to_query_errors() {
        let mapped =
            map_basic_diesel_error(DieselError::NotFound, Sample::Query, Sample::Connection);
        assert_eq!(mapped, Sample::Query("record not found"));
    }

    #[rstest]
    fn pool_errors_keep_their_message() {
        let mapped: String = map_basic_pool_error(PoolError::checkout("timed out"), |m| m);
        assert_eq!(mapped, "timed out");
    }

    #[rstest]
    #[case(None, None, true)]
    #[case(Some("categories_organization_name_key"), None, true)]
    #[case(
        Some("categories_organization_name_key"),
        Some("categories_organization_name_key"),
        true
    )]
    #[case(Some("users_firebase_uid_key"), Some("categories_organization_name_key"), false)]
    fn unique_violations_match_by_constraint(
        #[case] actual: Option<&'static str>,
        #[case] expected: Option<&str>,
        #[case] matches: bool,
    ) {
        let error = database_error(DatabaseErrorKind::UniqueViolation, actual);
        assert_eq!(is_unique_violation(&error, expected), matches);
    }

    #[rstest]
    fn foreign_key_violations_are_detected() {
        let error = database_error(DatabaseErrorKind::ForeignKeyViolation, None);
        assert!(is_foreign_key_violation(&error));
        assert!(!is_unique_violation(&error, None));
    }
}
