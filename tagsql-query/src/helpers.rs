//! Raw-fragment builders for identifiers that cannot be parameterized.
//!
//! Column lists, `COALESCE` mappings across joined tables, type casts and
//! comparison operators have to be spliced into the SQL text. These helpers
//! only emit names found in a [`TableSchema`], which is declared in code and
//! never built from request input, so the raw fragments they produce are safe.
//!
//! ```rust
//! use tagsql_query::helpers::{TableSchema, select_columns};
//! use tagsql_query::{Composer, Template};
//!
//! let user = TableSchema::new("User", ["id", "email", "role"]);
//!
//! let template = Template::builder()
//!     .sql("SELECT ")
//!     .value(select_columns(&user, &["id", "email"]).unwrap())
//!     .sql(" FROM ")
//!     .table(user.name())
//!     .build();
//!
//! let stmt = Composer::default().compose(template, None).unwrap();
//! assert_eq!(stmt.text(), "SELECT \"id\", \"email\" FROM \"public\".\"User\"");
//! ```

use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};
use crate::sql::escape_identifier;
use crate::value::{Value, escape_raw};

/// A table and the columns it is known to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: SmolStr,
    columns: IndexSet<SmolStr>,
}

impl TableSchema {
    /// Declare a table with its columns.
    pub fn new(name: &'static str, columns: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            name: SmolStr::new_static(name),
            columns: columns.into_iter().map(SmolStr::new_static).collect(),
        }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the table has `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// All declared columns, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(SmolStr::as_str)
    }

    fn require(&self, column: &str) -> QueryResult<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(QueryError::untrusted_identifier("column", column).with_table(self.name.as_str()))
        }
    }
}

/// `"a", "b", "c"` for the given columns, or every column when `columns` is empty.
pub fn select_columns(table: &TableSchema, columns: &[&str]) -> QueryResult<Value> {
    let names = resolve(table, columns)?;
    Ok(escape_raw(
        names
            .iter()
            .map(|c| escape_identifier(c))
            .collect::<Vec<_>>()
            .join(", "),
    ))
}

/// `"Table"."a", "Table"."b"`, qualified with the table name.
pub fn qualified_columns(table: &TableSchema, columns: &[&str]) -> QueryResult<Value> {
    let names = resolve(table, columns)?;
    let prefix = escape_identifier(table.name());
    Ok(escape_raw(
        names
            .iter()
            .map(|c| format!("{}.{}", prefix, escape_identifier(c)))
            .collect::<Vec<_>>()
            .join(", "),
    ))
}

fn resolve<'a>(table: &'a TableSchema, columns: &[&'a str]) -> QueryResult<Vec<&'a str>> {
    if columns.is_empty() {
        return Ok(table.columns().collect());
    }
    for column in columns {
        table.require(column)?;
    }
    Ok(columns.to_vec())
}

/// `COALESCE("A"."f", "B"."f") AS "f"` for each field, across joined tables.
///
/// Each field must exist on at least one table; tables without it are left
/// out of that field's `COALESCE`. Tables are tried in the order given.
pub fn coalesce_fields(tables: &[&TableSchema], fields: &[&str]) -> QueryResult<Value> {
    let mut parts = Vec::with_capacity(fields.len());

    for field in fields {
        let sources: Vec<String> = tables
            .iter()
            .filter(|t| t.has_column(field))
            .map(|t| format!("{}.{}", escape_identifier(t.name()), escape_identifier(field)))
            .collect();

        if sources.is_empty() {
            return Err(QueryError::untrusted_identifier("field", *field));
        }

        parts.push(format!(
            "COALESCE({}) AS {}",
            sources.join(", "),
            escape_identifier(field)
        ));
    }

    Ok(escape_raw(parts.join(", ")))
}

/// PostgreSQL types a value may be cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastType {
    /// `text`
    Text,
    /// `integer`
    Integer,
    /// `bigint`
    BigInt,
    /// `numeric`
    Numeric,
    /// `boolean`
    Boolean,
    /// `uuid`
    Uuid,
    /// `timestamptz`
    Timestamptz,
    /// `jsonb`
    Jsonb,
    /// `text[]`
    TextArray,
    /// `uuid[]`
    UuidArray,
    /// `bigint[]`
    BigIntArray,
}

impl CastType {
    /// The type name as written in SQL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Uuid => "uuid",
            Self::Timestamptz => "timestamptz",
            Self::Jsonb => "jsonb",
            Self::TextArray => "text[]",
            Self::UuidArray => "uuid[]",
            Self::BigIntArray => "bigint[]",
        }
    }
}

/// `::type`, placed right after a parameter.
pub fn cast(ty: CastType) -> Value {
    escape_raw(format!("::{}", ty.as_sql()))
}

/// Comparison operators chosen at runtime, for example from a filter enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `ILIKE`
    ILike,
    /// `IS DISTINCT FROM`
    DistinctFrom,
}

impl Comparison {
    /// The operator as written in SQL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::ILike => "ILIKE",
            Self::DistinctFrom => "IS DISTINCT FROM",
        }
    }
}

/// The operator as a raw fragment.
pub fn comparison(op: Comparison) -> Value {
    escape_raw(op.as_sql())
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// `"column" ASC` or `"column" DESC`, for a known column.
pub fn order_by(table: &TableSchema, column: &str, order: SortOrder) -> QueryResult<Value> {
    table.require(column)?;
    let direction = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    Ok(escape_raw(format!("{} {}", escape_identifier(column), direction)))
}
