//! Error types for PostgreSQL operations.

use deadpool_postgres::PoolError;
use tagsql_query::{ErrorCode, QueryError};
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A bound value does not fit the parameter type.
    #[error("type conversion error: {0}")]
    TypeConversion(String),

    /// Timeout error.
    #[error("operation timed out after {0}ms")]
    Timeout(u64),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Postgres(e) => e.is_closed(),
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Pool(PoolError::Timeout(_)))
    }

    /// The SQLSTATE code reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(SqlState::code),
            _ => None,
        }
    }
}

/// Map a server SQLSTATE to the error code callers match on.
fn classify_state(state: &SqlState) -> Option<ErrorCode> {
    if *state == SqlState::UNIQUE_VIOLATION {
        Some(ErrorCode::UniqueConstraint)
    } else if *state == SqlState::FOREIGN_KEY_VIOLATION {
        Some(ErrorCode::ForeignKeyConstraint)
    } else if *state == SqlState::NOT_NULL_VIOLATION {
        Some(ErrorCode::NotNullConstraint)
    } else if *state == SqlState::QUERY_CANCELED {
        Some(ErrorCode::QueryTimeout)
    } else {
        None
    }
}

impl From<PgError> for QueryError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Pool(PoolError::Timeout(kind)) => QueryError::new(
                ErrorCode::ConnectionTimeout,
                format!("Timed out waiting for a connection ({:?})", kind),
            )
            .with_suggestion("Increase max_connections or the pool wait timeout"),
            PgError::Pool(e) => {
                let message = e.to_string();
                QueryError::connection(message).with_source(e)
            }
            PgError::Postgres(e) => {
                let message = match e.as_db_error() {
                    Some(db) => db.message().to_string(),
                    None => e.to_string(),
                };
                let table = e
                    .as_db_error()
                    .and_then(|db| db.table())
                    .map(str::to_string);

                let mut mapped = match e.code().and_then(classify_state) {
                    Some(ErrorCode::QueryTimeout) => {
                        QueryError::new(ErrorCode::QueryTimeout, message)
                            .with_suggestion("Raise statement_timeout or narrow the query")
                    }
                    Some(code) => QueryError::constraint_violation(code, message),
                    None if e.is_closed() => QueryError::connection(message),
                    None => QueryError::database(message),
                };
                if let Some(table) = table {
                    mapped = mapped.with_table(table);
                }
                mapped.with_source(e)
            }
            PgError::Config(msg) => QueryError::configuration(msg),
            PgError::TypeConversion(msg) => QueryError::parameter_conversion(msg),
            PgError::Timeout(ms) => QueryError::timeout(ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));
        assert!(!err.is_connection_error());

        let err = PgError::Timeout(5000);
        assert!(err.is_timeout());
        assert_eq!(err.sql_state(), None);
    }

    #[test]
    fn test_into_query_error() {
        let query_err: QueryError = PgError::Timeout(1000).into();
        assert!(query_err.is_timeout());

        let query_err: QueryError = PgError::type_conversion("text into uuid").into();
        assert_eq!(query_err.code, ErrorCode::ParameterConversion);

        let query_err: QueryError = PgError::config("bad port").into();
        assert_eq!(query_err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_classify_state() {
        assert_eq!(
            classify_state(&SqlState::UNIQUE_VIOLATION),
            Some(ErrorCode::UniqueConstraint)
        );
        assert_eq!(
            classify_state(&SqlState::from_code("23503")),
            Some(ErrorCode::ForeignKeyConstraint)
        );
        assert_eq!(
            classify_state(&SqlState::NOT_NULL_VIOLATION),
            Some(ErrorCode::NotNullConstraint)
        );
        assert_eq!(classify_state(&SqlState::SYNTAX_ERROR), None);
    }
}
