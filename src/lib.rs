//! # tagsql
//!
//! Injection-safe composition of parameterized SQL statements.
//!
//! Write SQL as literal text with values between the fragments. Each value is
//! rendered by where it sits and what it is: scalars become `$n` parameters,
//! table names in table slots become schema-qualified identifiers, composed
//! statements are inlined with renumbered placeholders, and batches expand to
//! multi-row value lists. Tables written by `INSERT`, `UPDATE` and `DELETE`
//! are collected so cached reads can be invalidated.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagsql::prelude::*;
//!
//! let composer = Composer::default();
//! let mut changed = MutationSet::new();
//!
//! let insert = composer
//!     .compose(
//!         stmt!(
//!             "INSERT INTO {} (\"email\", \"role\") VALUES {}",
//!             Value::table("User"),
//!             batch(vec![row!["a@x.io", "admin"], row!["b@x.io", escape_raw("DEFAULT")]]),
//!         ),
//!         Some(&mut changed),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     insert.text(),
//!     "INSERT INTO \"public\".\"User\" (\"email\", \"role\") VALUES ($1,$2),($3,DEFAULT)"
//! );
//! assert!(changed.contains("User"));
//! ```
//!
//! With the `postgres` feature (on by default), [`postgres::PgExecutor`] runs
//! the composed statements on a pooled connection.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use tagsql_query::*;

/// PostgreSQL executor.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use tagsql_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tagsql_query::prelude::*;

    #[cfg(feature = "postgres")]
    pub use tagsql_postgres::prelude::*;
}
