//! Values interpolated into a statement.
//!
//! [`SqlValue`] is a scalar that ends up in the statement's parameter list.
//! [`Value`] is what a caller interpolates between two literal segments: a
//! scalar, a table name, a nested statement, a raw fragment, or a batch of rows.
//!
//! ```rust
//! use tagsql_query::{SqlValue, Value};
//!
//! let val: SqlValue = 42.into();
//! assert!(matches!(val, SqlValue::Int(42)));
//!
//! let val: Value = "a@b.com".into();
//! assert!(matches!(val, Value::Plain(SqlValue::String(_))));
//!
//! let val = Value::table("User");
//! assert!(matches!(val, Value::Table(_)));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use uuid::Uuid;

use crate::statement::Statement;

/// A scalar bound as a positional parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// UUID value.
    Uuid(Uuid),
    /// Timestamp with time zone.
    Timestamp(DateTime<Utc>),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values, bound as one array parameter.
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in logs and conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::String(_) => "string",
            Self::Json(_) => "json",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A value interpolated between two literal segments.
///
/// The variant decides how the value is rendered:
///
/// - `Plain` becomes a `$n` placeholder, or a qualified table name when it is a
///   string sitting in a table slot (`FROM`, `JOIN`, `UPDATE`, ...).
/// - `Table` is always meant as a table name.
/// - `Nested` is inlined with its placeholders renumbered.
/// - `Raw` is inserted verbatim. Never build one from request input.
/// - `Batch` expands to `($1,$2),($3,$4)` for multi-row inserts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A scalar parameter.
    Plain(SqlValue),
    /// A table identifier, qualified with the configured schema.
    Table(SmolStr),
    /// A previously composed statement.
    Nested(Statement),
    /// Caller-attested literal SQL text.
    Raw(String),
    /// Rows for a multi-row value list.
    Batch(Vec<Vec<Value>>),
}

impl Value {
    /// A table reference.
    pub fn table(name: impl Into<SmolStr>) -> Self {
        Self::Table(name.into())
    }

    /// Literal SQL text inserted without parameterization.
    ///
    /// This is the one place SQL injection is possible: only pass column names,
    /// operators or keywords chosen from a fixed set known at compile time.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// A batch of rows for `INSERT ... VALUES`.
    pub fn batch<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<Value>,
    {
        Self::Batch(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// A SQL `NULL` parameter.
    pub fn null() -> Self {
        Self::Plain(SqlValue::Null)
    }

    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Table(_) => "table",
            Self::Nested(_) => "nested",
            Self::Raw(_) => "raw",
            Self::Batch(_) => "batch",
        }
    }
}

/// Wrap trusted literal SQL text so it is inserted verbatim.
///
/// Never pass user-controlled input here.
pub fn escape_raw(text: impl Into<String>) -> Value {
    Value::raw(text)
}

/// Wrap a two-dimensional list of cells for multi-row expansion.
pub fn batch<R, C>(rows: R) -> Value
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: Into<Value>,
{
    Value::batch(rows)
}

macro_rules! impl_plain_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Plain(v.into())
                }
            }
        )*
    };
}

impl_plain_from!(bool, i32, i64, f64, String, &str, Uuid, DateTime<Utc>, serde_json::Value);

impl From<SqlValue> for Value {
    fn from(v: SqlValue) -> Self {
        Self::Plain(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Self::Plain(v.into())
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Plain(v.into())
    }
}

impl From<Statement> for Value {
    fn from(v: Statement) -> Self {
        Self::Nested(v)
    }
}
