//! Tables written during one unit of work.
//!
//! A [`MutationSet`] belongs to one request or transaction. Every statement
//! composed with it records the target table of its `INSERT INTO`, `UPDATE` or
//! `DELETE FROM`; afterwards the surrounding machinery reads the set to decide
//! which cached reads are stale.
//!
//! ```rust
//! use tagsql_query::{Composer, MutationSet, Template, Value};
//!
//! let composer = Composer::default();
//! let mut changed = MutationSet::new();
//!
//! let template = Template::new(
//!     vec!["UPDATE ", " SET \"status\" = ", ""],
//!     vec![Value::table("Order"), "paid".into()],
//! );
//! composer.compose(template, Some(&mut changed)).unwrap();
//!
//! assert!(changed.contains("Order"));
//! ```

use indexmap::IndexSet;
use smol_str::SmolStr;

/// Set of table names written by a unit of work, in first-write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationSet {
    tables: IndexSet<SmolStr>,
}

impl MutationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write to `table`. Returns `true` if it was not already recorded.
    pub fn insert(&mut self, table: impl Into<SmolStr>) -> bool {
        self.tables.insert(table.into())
    }

    /// Check whether `table` was written.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Number of distinct tables written.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate over the written tables in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(SmolStr::as_str)
    }

    /// Check whether any of `tables` was written.
    ///
    /// Cache layers call this with the tables a cached read depends on.
    pub fn touches_any<'a>(&self, tables: impl IntoIterator<Item = &'a str>) -> bool {
        tables.into_iter().any(|t| self.contains(t))
    }

    /// Fold the writes of a nested unit of work into this one.
    pub fn merge(&mut self, other: MutationSet) {
        self.tables.extend(other.tables);
    }

    /// The written tables as owned strings.
    pub fn changed_tables(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a MutationSet {
    type Item = &'a SmolStr;
    type IntoIter = indexmap::set::Iter<'a, SmolStr>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
