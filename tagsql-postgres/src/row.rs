//! Reading typed values out of result rows.

use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

use crate::error::{PgError, PgResult};

/// Column access that reports failures as [`PgError`].
pub trait RowExt {
    /// Get a column value by name.
    fn column<T>(&self, name: &str) -> PgResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn column<T>(&self, name: &str) -> PgResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(name)
            .map_err(|e| PgError::type_conversion(format!("column '{}': {}", name, e)))
    }
}

/// Build a value from one result row.
pub trait FromPgRow: Sized {
    /// Decode the row.
    fn from_row(row: &Row) -> PgResult<Self>;
}

/// Implement [`FromPgRow`] for a struct whose fields match column names.
///
/// ```rust,ignore
/// struct Listing {
///     id: uuid::Uuid,
///     title: String,
///     price: Option<i64>,
/// }
///
/// impl_from_row!(Listing { id: uuid::Uuid, title: String, price: Option<i64> });
/// ```
#[macro_export]
macro_rules! impl_from_row {
    ($type:ident { $($field:ident : $field_type:ty),* $(,)? }) => {
        impl $crate::row::FromPgRow for $type {
            fn from_row(row: &$crate::tokio_postgres::Row) -> $crate::error::PgResult<Self> {
                use $crate::row::RowExt;
                Ok(Self {
                    $(
                        $field: row.column::<$field_type>(stringify!($field))?,
                    )*
                })
            }
        }
    };
}
