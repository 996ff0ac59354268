//! Error types for statement composition and execution.
//!
//! Errors carry a numeric code for programmatic handling, a message, and
//! context about what was being composed or executed.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Composition errors (template arity, malformed batches, misplaced tables)
//! - 3xxx: Connection errors (pool, timeout)
//! - 5xxx: Execution errors (database, constraint violations)
//! - 6xxx: Data errors (parameter conversion)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use tagsql_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::ragged_batch(1, 2, 3);
//! assert_eq!(err.code, ErrorCode::RaggedBatch);
//! assert_eq!(err.code.code(), "T1002");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for composition and execution.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Composition errors (1xxx)
    /// Segment count does not match value count (T1001).
    TemplateArity = 1001,
    /// Batch rows have different lengths (T1002).
    RaggedBatch = 1002,
    /// Batch has no rows or an empty row (T1003).
    EmptyBatch = 1003,
    /// Table reference outside a table slot (T1004).
    MisplacedTable = 1004,
    /// Raw batch cell that is not the default keyword (T1005).
    UnsafeBatchCell = 1005,
    /// Batch nested inside a batch cell (T1006).
    NestedBatch = 1006,
    /// Identifier not part of the trusted enumeration (T1007).
    UntrustedIdentifier = 1007,

    // Connection errors (3xxx)
    /// Database connection failed (T3001).
    ConnectionFailed = 3001,
    /// Connection pool exhausted (T3002).
    PoolExhausted = 3002,
    /// Connection timeout (T3003).
    ConnectionTimeout = 3003,

    // Execution errors (5xxx)
    /// Query timeout (T5001).
    QueryTimeout = 5001,
    /// General database error (T5002).
    DatabaseError = 5002,
    /// Unique constraint violation (T5003).
    UniqueConstraint = 5003,
    /// Foreign key constraint violation (T5004).
    ForeignKeyConstraint = 5004,
    /// Not null constraint violation (T5005).
    NotNullConstraint = 5005,

    // Data errors (6xxx)
    /// Parameter could not be converted for the driver (T6001).
    ParameterConversion = 6001,
    /// Serialization error (T6002).
    SerializationError = 6002,

    // Configuration errors (7xxx)
    /// Invalid configuration (T7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (T9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T1001").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::TemplateArity => "Segment and value counts do not line up",
            Self::RaggedBatch => "Batch rows have inconsistent lengths",
            Self::EmptyBatch => "Batch is empty",
            Self::MisplacedTable => "Table reference outside a table slot",
            Self::UnsafeBatchCell => "Raw batch cell is not the default keyword",
            Self::NestedBatch => "Batch nested inside a batch",
            Self::UntrustedIdentifier => "Identifier is not a known column or table",
            Self::ConnectionFailed => "Database connection failed",
            Self::PoolExhausted => "Connection pool exhausted",
            Self::ConnectionTimeout => "Connection timeout",
            Self::QueryTimeout => "Query timeout",
            Self::DatabaseError => "Database error",
            Self::UniqueConstraint => "Unique constraint violation",
            Self::ForeignKeyConstraint => "Foreign key constraint violation",
            Self::NotNullConstraint => "Not null constraint violation",
            Self::ParameterConversion => "Parameter conversion failed",
            Self::SerializationError => "Serialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }

    /// Check if this code belongs to the composition category.
    pub fn is_composition(&self) -> bool {
        (1000..2000).contains(&(*self as u16))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The table involved.
    pub table: Option<String>,
    /// The SQL text (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors that can occur while composing or executing statements.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.context.table = Some(table.into());
        self
    }

    /// Set the SQL text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Composition Errors ==============

    /// Create a template arity error.
    pub fn template_arity(segments: usize, values: usize) -> Self {
        Self::new(
            ErrorCode::TemplateArity,
            format!(
                "Template has {} segments for {} values; expected {}",
                segments,
                values,
                values + 1
            ),
        )
        .with_suggestion("Every value must sit between two literal segments, use \"\" for empty ends")
    }

    /// Create a ragged batch error.
    pub fn ragged_batch(row: usize, expected: usize, found: usize) -> Self {
        Self::new(
            ErrorCode::RaggedBatch,
            format!(
                "Batch row {} has {} cells, expected {} like the first row",
                row, found, expected
            ),
        )
        .with_suggestion("Pad missing cells with Value::raw(\"DEFAULT\") or Value::null()")
    }

    /// Create an empty batch error.
    pub fn empty_batch() -> Self {
        Self::new(ErrorCode::EmptyBatch, "Batch must contain at least one non-empty row")
            .with_suggestion("Skip the INSERT entirely when there is nothing to write")
    }

    /// Create a misplaced table error.
    pub fn misplaced_table(table: impl Into<String>) -> Self {
        let table = table.into();
        Self::new(
            ErrorCode::MisplacedTable,
            format!(
                "Table {} is not preceded by FROM, INSERT INTO, UPDATE, DELETE FROM, JOIN or USING",
                table
            ),
        )
        .with_table(&table)
        .with_suggestion("Bind the value as a plain parameter if it is data, not a table name")
    }

    /// Create an unsafe batch cell error.
    pub fn unsafe_batch_cell(text: impl Into<String>, keyword: &str) -> Self {
        Self::new(
            ErrorCode::UnsafeBatchCell,
            format!(
                "Raw batch cell {:?} is not the {} keyword",
                text.into(),
                keyword
            ),
        )
        .with_suggestion("Batch cells are parameterized, only the default keyword may be raw")
    }

    /// Create a nested batch error.
    pub fn nested_batch() -> Self {
        Self::new(ErrorCode::NestedBatch, "A batch cannot be used as a batch cell")
    }

    /// Create an untrusted identifier error.
    pub fn untrusted_identifier(kind: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::UntrustedIdentifier,
            format!("Unknown {} {:?}", kind, name),
        )
        .with_suggestion("Identifiers must come from the table definition, never from request input")
    }

    // ============== Execution Errors ==============

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ConnectionFailed, format!("Connection error: {}", message))
            .with_suggestion("Check that the database server is running")
            .with_suggestion("Verify the connection URL is correct")
    }

    /// Create a pool exhausted error.
    pub fn pool_exhausted(max_connections: usize) -> Self {
        Self::new(
            ErrorCode::PoolExhausted,
            format!("Connection pool exhausted (max {} connections)", max_connections),
        )
        .with_suggestion("Increase max_connections in pool configuration")
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {}ms", duration_ms),
        )
    }

    /// Create a constraint violation error.
    pub fn constraint_violation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    /// Create a parameter conversion error.
    pub fn parameter_conversion(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::ParameterConversion,
            format!("Cannot convert parameter: {}", message),
        )
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message),
        )
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// Check if this error was raised while composing a statement.
    pub fn is_composition_error(&self) -> bool {
        self.code.is_composition()
    }

    /// Check if this is a constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UniqueConstraint
                | ErrorCode::ForeignKeyConstraint
                | ErrorCode::NotNullConstraint
        )
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self.code, ErrorCode::QueryTimeout | ErrorCode::ConnectionTimeout)
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionFailed | ErrorCode::PoolExhausted | ErrorCode::ConnectionTimeout
        )
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionTimeout | ErrorCode::PoolExhausted | ErrorCode::QueryTimeout
        )
    }

    /// Display the full error with context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref table) = self.context.table {
            output.push_str(&format!("  → Table: {}\n", table));
        }
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.len() > 200 {
                let cut = (0..=200).rev().find(|i| sql.is_char_boundary(*i)).unwrap_or(0);
                format!("{}...", &sql[..cut])
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::serialization(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::TemplateArity.code(), "T1001");
        assert_eq!(ErrorCode::ConnectionFailed.code(), "T3001");
        assert_eq!(ErrorCode::InvalidConfiguration.code(), "T7001");
    }

    #[test]
    fn test_composition_category() {
        assert!(QueryError::empty_batch().is_composition_error());
        assert!(QueryError::misplaced_table("User").is_composition_error());
        assert!(!QueryError::connection("refused").is_composition_error());
    }

    #[test]
    fn test_ragged_batch_message() {
        let err = QueryError::ragged_batch(2, 3, 1);
        assert!(err.message.contains("row 2"));
        assert!(err.message.contains("expected 3"));
        assert!(!err.context.suggestions.is_empty());
    }

    #[test]
    fn test_misplaced_table_context() {
        let err = QueryError::misplaced_table("Listing");
        assert_eq!(err.context.table.as_deref(), Some("Listing"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(QueryError::timeout(1000).is_retryable());
        assert!(QueryError::pool_exhausted(10).is_retryable());
        assert!(!QueryError::database("syntax error").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = QueryError::template_arity(2, 2);
        assert_eq!(
            err.to_string(),
            "[T1001] Template has 2 segments for 2 values; expected 3"
        );
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::misplaced_table("User")
            .with_context("composing statement")
            .with_sql("SELECT * FROM x WHERE name = ");

        let output = err.display_full();
        assert!(output.contains("T1004"));
        assert!(output.contains("→ Table: User"));
        assert!(output.contains("→ SQL:"));
        assert!(output.contains("Suggestions"));
    }
}
