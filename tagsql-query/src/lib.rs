//! # tagsql-query
//!
//! Parameterized SQL statement composition.
//!
//! Queries are written as literal SQL segments with values between them. The
//! [`Composer`] turns each value into the right thing for where it sits:
//!
//! - ordinary values become `$n` placeholders with the value bound
//! - table names after `FROM`, `JOIN`, `UPDATE`, `INSERT INTO`, `DELETE FROM`
//!   or `USING` become schema-qualified identifiers
//! - previously composed statements are inlined with their placeholders renumbered
//! - batches expand to `($1,$2),($3,$4)` for multi-row inserts
//! - [`escape_raw`] text is inserted verbatim
//!
//! Write targets are recorded in a [`MutationSet`] so callers can invalidate
//! cached reads.
//!
//! ## Composing
//!
//! ```rust
//! use tagsql_query::{stmt, Composer, MutationSet, SqlValue, Value};
//!
//! let composer = Composer::default();
//! let mut changed = MutationSet::new();
//!
//! let stmt = composer
//!     .compose(
//!         stmt!("UPDATE {} SET \"name\" = {} WHERE \"id\" = {}", Value::table("User"), "ann", 7),
//!         Some(&mut changed),
//!     )
//!     .unwrap();
//!
//! assert_eq!(stmt.text(), "UPDATE \"public\".\"User\" SET \"name\" = $1 WHERE \"id\" = $2");
//! assert_eq!(stmt.values(), &[SqlValue::String("ann".into()), SqlValue::Int(7)]);
//! assert!(changed.contains("User"));
//! ```
//!
//! ## Nesting
//!
//! ```rust
//! use tagsql_query::{stmt, Composer, Value};
//!
//! let composer = Composer::default();
//! let active = composer
//!     .compose(stmt!("\"active\" = {}", true), None)
//!     .unwrap();
//! let query = composer
//!     .compose(
//!         stmt!("SELECT * FROM {} WHERE \"org\" = {} AND {}", Value::table("User"), 3, active),
//!         None,
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     query.text(),
//!     "SELECT * FROM \"public\".\"User\" WHERE \"org\" = $1 AND \"active\" = $2"
//! );
//! ```
//!
//! ## Joining
//!
//! ```rust
//! use tagsql_query::{stmt, join, Composer};
//!
//! let composer = Composer::default();
//! let parts = vec![
//!     composer.compose(stmt!("\"a\" = {}", 1), None).unwrap(),
//!     composer.compose(stmt!("\"b\" = {}", 2), None).unwrap(),
//! ];
//! let clause = join(parts, " AND ");
//! assert_eq!(clause.text(), "\"a\" = $1 AND \"b\" = $2");
//! ```
//!
//! ## Errors
//!
//! Malformed input fails with a [`QueryError`] in strict mode, the default.
//! See [`ComposeMode`] for the permissive alternative.

#[macro_use]
pub mod macros;

pub mod classify;
pub mod compose;
pub mod config;
pub mod error;
pub mod executor;
pub mod helpers;
pub mod logging;
pub mod mutation;
pub mod session;
pub mod sql;
pub mod statement;
pub mod template;
pub mod value;

pub use classify::{Operation, TableSlot, ValueClass, classify};
pub use compose::{Composer, compose, join};
pub use config::{
    ComposeMode, ComposerConfig, ConfigError, ConfigResult, EnvSource, MapEnvSource, StdEnvSource,
};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use executor::StatementExecutor;
pub use helpers::{CastType, Comparison, SortOrder, TableSchema};
pub use mutation::MutationSet;
pub use session::Session;
pub use statement::Statement;
pub use template::{Template, TemplateBuilder};
pub use value::{SqlValue, Value, batch, escape_raw};

// Re-export logging utilities
pub use logging::{LogFormat, LogSettings, get_log_format, get_log_level, init as init_logging, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compose::{Composer, compose, join};
    pub use crate::config::{ComposeMode, ComposerConfig};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::executor::StatementExecutor;
    pub use crate::mutation::MutationSet;
    pub use crate::session::Session;
    pub use crate::statement::Statement;
    pub use crate::template::{Template, TemplateBuilder};
    pub use crate::value::{SqlValue, Value, batch, escape_raw};
    pub use crate::{row, stmt};
}
