//! Template construction macros.
//!
//! # Examples
//!
//! ```rust
//! use tagsql_query::{stmt, row, Composer, Value, batch};
//!
//! let stmt = Composer::default()
//!     .compose(stmt!("SELECT * FROM {} WHERE \"id\" = {}", Value::table("User"), 7), None)
//!     .unwrap();
//! assert_eq!(stmt.text(), "SELECT * FROM \"public\".\"User\" WHERE \"id\" = $1");
//!
//! let insert = stmt!(
//!     "INSERT INTO {} (\"name\", \"age\") VALUES {}",
//!     Value::table("User"),
//!     batch(vec![row!["ann", 31], row!["bob", 42]]),
//! );
//! assert_eq!(insert.values().len(), 2);
//! ```

/// Build a [`Template`](crate::template::Template) from a format string with
/// `{}` holes.
///
/// Each argument is converted with `Into<Value>`. Plain Rust values become
/// parameters; use [`Value::table`](crate::value::Value::table),
/// [`escape_raw`](crate::value::escape_raw), [`batch`](crate::value::batch)
/// or a nested [`Statement`](crate::statement::Statement) for the other kinds.
///
/// A hole count that differs from the argument count is reported when the
/// template is composed.
///
/// Write `{{` and `}}` for literal braces, as with `format!`. A `{}` inside a
/// single-quoted SQL literal is not a hole, so `'{}'` (an empty array or JSON
/// object) can be written as is.
///
/// - `stmt!("SELECT 1")` - literal only
/// - `stmt!("... {} ...", a, b)` - with values
#[macro_export]
macro_rules! stmt {
    ($fmt:expr $(,)?) => {
        $crate::template::Template::from_format($fmt, ::std::vec::Vec::new())
    };
    ($fmt:expr, $($value:expr),+ $(,)?) => {
        $crate::template::Template::from_format(
            $fmt,
            vec![$($crate::value::Value::from($value)),+],
        )
    };
}

/// Build one batch row, converting each cell with `Into<Value>`.
///
/// ```rust
/// use tagsql_query::{row, escape_raw, Value};
///
/// let cells: Vec<Value> = row!["ann", escape_raw("DEFAULT"), 31];
/// assert_eq!(cells.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($cell:expr),+ $(,)?) => {
        vec![$($crate::value::Value::from($cell)),+]
    };
}
