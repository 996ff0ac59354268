//! The composed statement handed to a driver.
//!
//! A [`Statement`] is the final `(text, values)` pair, plus an optional name a
//! driver may use to reuse a prepared statement. Alongside the text it keeps the
//! byte range of every `$n` placeholder it emitted, so that a parent statement
//! can renumber them without scanning the text again. Raw fragments and string
//! literals that happen to contain `$1` are therefore never rewritten.
//!
//! ```rust
//! use tagsql_query::{Statement, SqlValue};
//!
//! let stmt = Statement::from_sql("SELECT * FROM t WHERE id = $1", vec![SqlValue::Int(7)]);
//! assert_eq!(stmt.text(), "SELECT * FROM t WHERE id = $1");
//! assert_eq!(stmt.param_count(), 1);
//!
//! let stmt = stmt.with_name("listing_by_id");
//! assert_eq!(stmt.name(), Some("listing_by_id"));
//! ```

use std::fmt;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::value::SqlValue;

/// Position of one `$n` placeholder inside the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placeholder {
    /// Byte offset of the `$`.
    pub start: usize,
    /// Byte offset one past the last digit.
    pub end: usize,
    /// The 1-based parameter number.
    pub index: usize,
}

pub(crate) type Placeholders = SmallVec<[Placeholder; 8]>;

/// A parameterized SQL statement.
///
/// Immutable once built. The placeholders `$1..$N` in [`text`](Self::text)
/// correspond to [`values`](Self::values) by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    text: String,
    values: Vec<SqlValue>,
    placeholders: Placeholders,
    name: Option<SmolStr>,
}

impl Statement {
    pub(crate) fn from_parts(
        text: String,
        values: Vec<SqlValue>,
        placeholders: Placeholders,
    ) -> Self {
        Self {
            text,
            values,
            placeholders,
            name: None,
        }
    }

    /// An empty statement with no text and no values.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A statement made of trusted literal text with no parameters.
    ///
    /// Any `$` in the text is left alone when the statement is nested.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Adopt SQL written elsewhere, with its `$n` placeholders already in place.
    ///
    /// Every `$` followed by digits is treated as a placeholder, so the text
    /// should not contain such sequences inside string literals. Each `$k`
    /// must satisfy `1 <= k <= values.len()`; debug builds assert it.
    pub fn from_sql(text: impl Into<String>, values: Vec<SqlValue>) -> Self {
        let text = text.into();
        let placeholders = scan_placeholders(&text);
        debug_assert!(
            placeholders
                .iter()
                .all(|p| (1..=values.len()).contains(&p.index)),
            "placeholder out of range for {} values in {:?}",
            values.len(),
            text
        );
        Self {
            text,
            values,
            placeholders,
            name: None,
        }
    }

    /// Set the statement name.
    pub fn with_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the statement name in place.
    pub fn set_name(&mut self, name: impl Into<SmolStr>) {
        self.name = Some(name.into());
    }

    /// The statement name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The SQL text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parameter values, in placeholder order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of bound parameters.
    pub fn param_count(&self) -> usize {
        self.values.len()
    }

    /// Check if the statement has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The parameter number of every placeholder, left to right.
    pub fn placeholder_indices(&self) -> Vec<usize> {
        self.placeholders.iter().map(|p| p.index).collect()
    }

    /// Consume the statement into its text and values.
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.text, self.values)
    }

    pub(crate) fn into_inner(self) -> (String, Vec<SqlValue>, Placeholders) {
        (self.text, self.values, self.placeholders)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Find every `$<digits>` token in `text`.
fn scan_placeholders(text: &str) -> Placeholders {
    let bytes = text.as_bytes();
    let mut found = Placeholders::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i + 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > start + 1 {
            if let Ok(index) = text[start + 1..end].parse::<usize>() {
                found.push(Placeholder { start, end, index });
            }
        }
        i = end;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_literal() {
        assert!(Statement::empty().is_empty());

        let stmt = Statement::literal("SELECT 1");
        assert_eq!(stmt.text(), "SELECT 1");
        assert_eq!(stmt.param_count(), 0);
        assert!(stmt.placeholder_indices().is_empty());
    }

    #[test]
    fn test_literal_ignores_dollar_signs() {
        let stmt = Statement::literal("SELECT '$1'");
        assert!(stmt.placeholder_indices().is_empty());
    }

    #[test]
    fn test_from_sql_scans_placeholders() {
        let stmt = Statement::from_sql(
            "UPDATE t SET a = $1, b = $2 WHERE id = $10 AND cost > $",
            (1..=10).map(SqlValue::Int).collect(),
        );
        assert_eq!(stmt.placeholder_indices(), vec![1, 2, 10]);
        let last = stmt.placeholders[2];
        assert_eq!(&stmt.text()[last.start..last.end], "$10");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "placeholder out of range")]
    fn test_from_sql_rejects_unbound_placeholder() {
        Statement::from_sql("SELECT $1, $2", vec![SqlValue::Int(1)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "placeholder out of range")]
    fn test_from_sql_rejects_zero_placeholder() {
        Statement::from_sql("SELECT $0", vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_name() {
        let mut stmt = Statement::literal("SELECT 1");
        assert_eq!(stmt.name(), None);
        stmt.set_name("ping");
        assert_eq!(stmt.name(), Some("ping"));
    }

    #[test]
    fn test_display_and_into_parts() {
        let stmt = Statement::from_sql("SELECT $1", vec![SqlValue::Bool(true)]);
        assert_eq!(stmt.to_string(), "SELECT $1");

        let (text, values) = stmt.into_parts();
        assert_eq!(text, "SELECT $1");
        assert_eq!(values, vec![SqlValue::Bool(true)]);
    }
}
