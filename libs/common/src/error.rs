//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Whether the failure is transient: the pool is exhausted, the
    /// connection dropped or a timeout fired.
    pub fn is_transient(&self) -> bool {
        match self {
            DatabaseError::Connection(_) => true,
            DatabaseError::Query(err) => is_transient_sqlx(err),
            DatabaseError::Migration(_) | DatabaseError::Configuration(_) => false,
        }
    }
}

/// Classify a raw sqlx error as transient.
///
/// Statement timeouts surface as `57014` (query_canceled) from PostgreSQL.
pub fn is_transient_sqlx(err: &SqlxError) -> bool {
    match err {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => true,
        SqlxError::Tls(_) | SqlxError::WorkerCrashed => true,
        SqlxError::Database(db) => matches!(db.code().as_deref(), Some("57014") | Some("57P01")),
        _ => false,
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_transient() {
        assert!(is_transient_sqlx(&SqlxError::PoolTimedOut));
        assert!(DatabaseError::Connection(SqlxError::PoolClosed).is_transient());
    }

    #[test]
    fn row_not_found_is_not_transient() {
        assert!(!is_transient_sqlx(&SqlxError::RowNotFound));
        assert!(!DatabaseError::Migration("bad checksum".to_string()).is_transient());
    }
}
