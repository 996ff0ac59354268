//! Statement composition.
//!
//! [`Composer::compose`] walks a [`Template`]'s segments and values in
//! lockstep. Each value is classified against the segment before it and then
//! rendered:
//!
//! - plain scalars become `$n` and are pushed onto the value list,
//! - table names become `"schema"."table"` and consume no parameter,
//! - nested statements are inlined with their placeholders shifted to continue
//!   the outer numbering,
//! - raw fragments are copied verbatim,
//! - batches expand to `($1,$2),($3,$4)`.
//!
//! One counter runs across the whole composition, nested levels included, so
//! numbering never collides.
//!
//! ```rust
//! use tagsql_query::{Composer, SqlValue, Template, Value};
//!
//! let composer = Composer::default();
//!
//! let template = Template::new(
//!     vec!["SELECT * FROM ", " WHERE \"email\" = ", " AND \"role\" = ", ""],
//!     vec!["User".into(), "a@b.com".into(), "owner".into()],
//! );
//! let stmt = composer.compose(template, None).unwrap();
//!
//! assert_eq!(
//!     stmt.text(),
//!     "SELECT * FROM \"public\".\"User\" WHERE \"email\" = $1 AND \"role\" = $2"
//! );
//! assert_eq!(stmt.values(), &[SqlValue::from("a@b.com"), SqlValue::from("owner")]);
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::classify::{Operation, TableSlot, ValueClass, classify};
use crate::config::ComposerConfig;
use crate::error::{QueryError, QueryResult};
use crate::mutation::MutationSet;
use crate::sql::push_qualified;
use crate::statement::{Placeholder, Placeholders, Statement};
use crate::template::Template;
use crate::value::{SqlValue, Value};

/// Turns templates into parameterized statements.
///
/// Holds no per-call state; one instance can be shared across requests.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    config: Arc<ComposerConfig>,
}

impl Composer {
    /// Create a composer, validating the configuration.
    pub fn new(config: ComposerConfig) -> QueryResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Create a composer from the `TAGSQL_*` environment variables.
    pub fn from_env() -> QueryResult<Self> {
        Self::new(ComposerConfig::from_env()?)
    }

    /// The active configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// The schema table references are qualified with.
    pub fn schema(&self) -> &str {
        &self.config.schema
    }

    /// Compose a template into a statement.
    ///
    /// When `tracker` is given, the target table of every `INSERT INTO`,
    /// `UPDATE` and `DELETE FROM` slot is added to it, provided the segment
    /// before the slot names a write (see [`Operation::detect`]). The tracker
    /// is only touched when composition succeeds.
    pub fn compose(
        &self,
        template: Template,
        tracker: Option<&mut MutationSet>,
    ) -> QueryResult<Statement> {
        let (segments, values) = template.into_parts();
        self.compose_parts(segments, values, tracker)
    }

    /// Compose from separate segment and value lists.
    pub fn compose_parts<S: AsRef<str>>(
        &self,
        segments: impl IntoIterator<Item = S>,
        values: impl IntoIterator<Item = Value>,
        tracker: Option<&mut MutationSet>,
    ) -> QueryResult<Statement> {
        let segments: Vec<S> = segments.into_iter().collect();
        let values: Vec<Value> = values.into_iter().collect();

        if segments.len() != values.len() + 1 {
            return Err(QueryError::template_arity(segments.len(), values.len())
                .with_context("composing statement"));
        }

        let mut renderer = Renderer::new(&self.config, tracker.is_some());
        let mut segments = segments.into_iter();
        let mut preceding = match segments.next() {
            Some(first) => first,
            None => return Err(QueryError::template_arity(0, values.len())),
        };
        renderer.push_text(preceding.as_ref());

        for (value, segment) in values.into_iter().zip(segments) {
            renderer
                .push_value(value, preceding.as_ref())
                .map_err(|e| e.with_sql(renderer.text.clone()))?;
            renderer.push_text(segment.as_ref());
            preceding = segment;
        }

        let written = std::mem::take(&mut renderer.written);
        let statement = renderer.finish();
        debug!(
            sql_len = statement.text().len(),
            param_count = statement.param_count(),
            tracked_tables = written.len(),
            mode = %self.config.mode,
            "Composer::compose()"
        );
        if let Some(tracker) = tracker {
            for table in written {
                tracker.insert(table);
            }
        }
        Ok(statement)
    }

    /// Join statements with a literal operator between them.
    ///
    /// See [`join`].
    pub fn join(&self, statements: impl IntoIterator<Item = Statement>, operator: &str) -> Statement {
        join(statements, operator)
    }
}

/// Compose with the default configuration (`public` schema, strict mode).
pub fn compose<S: AsRef<str>>(
    segments: impl IntoIterator<Item = S>,
    values: impl IntoIterator<Item = Value>,
    tracker: Option<&mut MutationSet>,
) -> QueryResult<Statement> {
    Composer::default().compose_parts(segments, values, tracker)
}

/// Fold statements into one, with `operator` as literal text between each pair.
///
/// Every step is a composition of `[acc, next]` with `["", operator, ""]`, so
/// the placeholders of each statement are renumbered after the ones before it.
/// An empty input gives an empty statement.
///
/// ```rust
/// use tagsql_query::{Statement, SqlValue, join};
///
/// let a = Statement::from_sql("\"price\" > $1", vec![SqlValue::Int(10)]);
/// let b = Statement::from_sql("\"price\" < $1", vec![SqlValue::Int(50)]);
///
/// let both = join([a, b], " AND ");
/// assert_eq!(both.text(), "\"price\" > $1 AND \"price\" < $2");
/// assert_eq!(both.param_count(), 2);
/// ```
pub fn join(statements: impl IntoIterator<Item = Statement>, operator: &str) -> Statement {
    let config = ComposerConfig::default();
    let mut statements = statements.into_iter();
    let Some(first) = statements.next() else {
        return Statement::empty();
    };

    statements.fold(first, |acc, next| {
        let mut renderer = Renderer::new(&config, false);
        renderer.push_nested(acc);
        renderer.push_text(operator);
        renderer.push_nested(next);
        renderer.finish()
    })
}

/// Accumulates one composition.
///
/// `values.len() + 1` is always the next free parameter number. Written
/// tables wait in `written` until the whole template has rendered.
struct Renderer<'a> {
    config: &'a ComposerConfig,
    track: bool,
    text: String,
    values: Vec<SqlValue>,
    placeholders: Placeholders,
    written: Vec<SmolStr>,
}

impl<'a> Renderer<'a> {
    fn new(config: &'a ComposerConfig, track: bool) -> Self {
        Self {
            config,
            track,
            text: String::new(),
            values: Vec::new(),
            placeholders: Placeholders::new(),
            written: Vec::new(),
        }
    }

    fn strict(&self) -> bool {
        self.config.mode.is_strict()
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn write_placeholder(&mut self, index: usize) {
        let start = self.text.len();
        // Writing to a String cannot fail.
        let _ = write!(self.text, "${}", index);
        self.placeholders.push(Placeholder {
            start,
            end: self.text.len(),
            index,
        });
    }

    fn push_param(&mut self, value: SqlValue) {
        let index = self.values.len() + 1;
        self.write_placeholder(index);
        self.values.push(value);
    }

    fn push_value(&mut self, value: Value, preceding: &str) -> QueryResult<()> {
        match (classify(&value, preceding), value) {
            (ValueClass::TableRef(slot), Value::Table(name)) => {
                self.push_table(name, slot, preceding)
            }
            (ValueClass::TableRef(slot), Value::Plain(SqlValue::String(name))) => {
                self.push_table(SmolStr::from(name), slot, preceding)
            }
            (ValueClass::MisplacedTable, Value::Table(name)) => {
                if self.strict() {
                    return Err(QueryError::misplaced_table(name.as_str()));
                }
                trace!(table = %name, "binding misplaced table as a parameter");
                self.push_param(SqlValue::String(name.into()));
            }
            (ValueClass::Nested, Value::Nested(statement)) => self.push_nested(statement),
            (ValueClass::Raw, Value::Raw(text)) => self.push_text(&text),
            (ValueClass::Batch, Value::Batch(rows)) => self.push_batch(rows)?,
            (_, value) => self.push_param(into_scalar(value)),
        }
        Ok(())
    }

    fn push_table(&mut self, name: SmolStr, slot: TableSlot, preceding: &str) {
        push_qualified(&mut self.text, &self.config.schema, &name);

        if !self.track || slot.mutation().is_none() {
            return;
        }
        match Operation::detect(preceding) {
            Some(operation) if operation.is_write() => {
                trace!(table = %name, operation = ?operation, "tracking mutated table");
                self.written.push(name);
            }
            operation => {
                trace!(table = %name, operation = ?operation, "write slot in a read segment, not tracked");
            }
        }
    }

    /// Inline `statement`, shifting each `$k` to `$(next + k - 1)`.
    fn push_nested(&mut self, statement: Statement) {
        let offset = self.values.len();
        let (text, values, placeholders) = statement.into_inner();

        let mut cursor = 0;
        for placeholder in &placeholders {
            self.text.push_str(&text[cursor..placeholder.start]);
            self.write_placeholder(placeholder.index + offset);
            cursor = placeholder.end;
        }
        self.text.push_str(&text[cursor..]);
        self.values.extend(values);
    }

    fn push_batch(&mut self, rows: Vec<Vec<Value>>) -> QueryResult<()> {
        if let Err(err) = check_batch_shape(&rows) {
            if self.strict() {
                return Err(err);
            }
            trace!(rows = rows.len(), "binding malformed batch as a parameter");
            self.push_param(into_scalar(Value::Batch(rows)));
            return Ok(());
        }

        for (r, row) in rows.into_iter().enumerate() {
            if r > 0 {
                self.text.push(',');
            }
            self.text.push('(');
            for (c, cell) in row.into_iter().enumerate() {
                if c > 0 {
                    self.text.push(',');
                }
                self.push_cell(cell)?;
            }
            self.text.push(')');
        }
        Ok(())
    }

    fn push_cell(&mut self, cell: Value) -> QueryResult<()> {
        match cell {
            Value::Raw(text) if text.eq_ignore_ascii_case(&self.config.default_keyword) => {
                self.push_text(&text);
            }
            Value::Raw(text) if self.strict() => {
                return Err(QueryError::unsafe_batch_cell(text, &self.config.default_keyword));
            }
            Value::Batch(_) if self.strict() => return Err(QueryError::nested_batch()),
            Value::Table(name) if self.strict() => {
                return Err(QueryError::misplaced_table(name.as_str()));
            }
            Value::Nested(statement) => self.push_nested(statement),
            other => self.push_param(into_scalar(other)),
        }
        Ok(())
    }

    fn finish(self) -> Statement {
        Statement::from_parts(self.text, self.values, self.placeholders)
    }
}

/// Rows must be non-empty and all as long as the first.
fn check_batch_shape(rows: &[Vec<Value>]) -> QueryResult<()> {
    let Some(first) = rows.first() else {
        return Err(QueryError::empty_batch());
    };
    if first.is_empty() {
        return Err(QueryError::empty_batch());
    }
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.len() != first.len() {
            return Err(QueryError::ragged_batch(i, first.len(), row.len()));
        }
    }
    Ok(())
}

/// Flatten a value into a single bindable scalar.
///
/// Used when permissive mode binds malformed input as an ordinary parameter.
fn into_scalar(value: Value) -> SqlValue {
    match value {
        Value::Plain(v) => v,
        Value::Table(name) => SqlValue::String(name.into()),
        Value::Raw(text) => SqlValue::String(text),
        Value::Nested(statement) => SqlValue::String(statement.into_parts().0),
        Value::Batch(rows) => SqlValue::List(
            rows.into_iter()
                .map(|row| SqlValue::List(row.into_iter().map(into_scalar).collect()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposeMode;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn strict() -> Composer {
        Composer::default()
    }

    fn permissive() -> Composer {
        Composer::new(ComposerConfig::new().permissive()).unwrap()
    }

    #[test]
    fn test_plain_values() {
        let stmt = strict()
            .compose_parts(["SELECT ", ", ", ""], [Value::from(1i64), Value::from(true)], None)
            .unwrap();
        assert_eq!(stmt.text(), "SELECT $1, $2");
        assert_eq!(stmt.values(), &[SqlValue::Int(1), SqlValue::Bool(true)]);
        assert_eq!(stmt.placeholder_indices(), vec![1, 2]);
    }

    #[test]
    fn test_table_consumes_no_parameter() {
        let stmt = strict()
            .compose_parts(["SELECT * FROM ", " WHERE id = ", ""], ["Listing".into(), 9i64.into()], None)
            .unwrap();
        assert_eq!(stmt.text(), "SELECT * FROM \"public\".\"Listing\" WHERE id = $1");
        assert_eq!(stmt.param_count(), 1);
    }

    #[test]
    fn test_custom_schema() {
        let composer = Composer::new(ComposerConfig::new().schema("market")).unwrap();
        let stmt = composer
            .compose_parts(["DELETE FROM ", ""], [Value::table("Cart")], None)
            .unwrap();
        assert_eq!(stmt.text(), "DELETE FROM \"market\".\"Cart\"");
    }

    #[test]
    fn test_distinct_from_is_plain() {
        let stmt = strict()
            .compose_parts(["SELECT 1 WHERE \"a\" IS DISTINCT FROM ", ""], ["User".into()], None)
            .unwrap();
        assert_eq!(stmt.text(), "SELECT 1 WHERE \"a\" IS DISTINCT FROM $1");
        assert_eq!(stmt.values(), &[SqlValue::from("User")]);
    }

    #[test]
    fn test_raw_in_table_slot_stays_raw() {
        let stmt = strict()
            .compose_parts(["SELECT * FROM ", ""], [Value::raw("generate_series(1, 3)")], None)
            .unwrap();
        assert_eq!(stmt.text(), "SELECT * FROM generate_series(1, 3)");
        assert_eq!(stmt.param_count(), 0);
    }

    #[test]
    fn test_nested_renumbering() {
        let inner = strict()
            .compose_parts(["\"c\" = ", ""], [Value::from(3i64)], None)
            .unwrap();
        let stmt = strict()
            .compose_parts(
                ["\"a\" = ", " AND (", ") AND \"d\" = ", ""],
                [Value::from(1i64), Value::Nested(inner), Value::from(4i64)],
                None,
            )
            .unwrap();
        assert_eq!(stmt.text(), "\"a\" = $1 AND (\"c\" = $2) AND \"d\" = $3");
        assert_eq!(
            stmt.values(),
            &[SqlValue::Int(1), SqlValue::Int(3), SqlValue::Int(4)]
        );
    }

    #[test]
    fn test_nested_raw_dollar_not_renumbered() {
        let inner = strict()
            .compose_parts(["SELECT ", " WHERE x = ", ""], [Value::raw("'$1'"), Value::from(5i64)], None)
            .unwrap();
        let stmt = strict()
            .compose_parts(["SELECT ", ", (", ")"], [Value::from(0i64), Value::Nested(inner)], None)
            .unwrap();
        assert_eq!(stmt.text(), "SELECT $1, (SELECT '$1' WHERE x = $2)");
    }

    #[test]
    fn test_nested_from_sql_renumbered() {
        let inner = Statement::from_sql("\"b\" = $1 OR \"b\" = $2", vec![SqlValue::Int(1), SqlValue::Int(2)]);
        let stmt = strict()
            .compose_parts(["\"a\" = ", " AND (", ")"], [Value::from(0i64), inner.into()], None)
            .unwrap();
        assert_eq!(stmt.text(), "\"a\" = $1 AND (\"b\" = $2 OR \"b\" = $3)");
        assert_eq!(stmt.param_count(), 3);
    }

    #[test]
    fn test_batch_expansion() {
        let rows = Value::batch(vec![vec![1i64, 2], vec![3, 4], vec![5, 6]]);
        let stmt = strict()
            .compose_parts(["INSERT INTO t (a, b) VALUES ", ""], [rows], None)
            .unwrap();
        assert_eq!(stmt.text(), "INSERT INTO t (a, b) VALUES ($1,$2),($3,$4),($5,$6)");
        assert_eq!(
            stmt.values(),
            &(1..=6).map(SqlValue::Int).collect::<Vec<_>>()[..]
        );
    }

    #[test]
    fn test_batch_default_keyword() {
        let rows = Value::Batch(vec![
            vec![Value::raw("default"), Value::from("a")],
            vec![Value::raw("DEFAULT"), Value::from("b")],
        ]);
        let stmt = strict()
            .compose_parts(["INSERT INTO t (id, name) VALUES ", ""], [rows], None)
            .unwrap();
        assert_eq!(stmt.text(), "INSERT INTO t (id, name) VALUES (default,$1),(DEFAULT,$2)");
        assert_eq!(stmt.param_count(), 2);
    }

    #[test]
    fn test_batch_with_nested_cell() {
        let lookup = Statement::from_sql("(SELECT id FROM u WHERE email = $1)", vec!["a@b.com".into()]);
        let rows = Value::Batch(vec![vec![Value::Nested(lookup), Value::from(5i64)]]);
        let stmt = strict()
            .compose_parts(["VALUES ", ""], [rows], None)
            .unwrap();
        assert_eq!(stmt.text(), "VALUES ((SELECT id FROM u WHERE email = $1),$2)");
    }

    #[test]
    fn test_strict_rejects_ragged_batch() {
        let rows = Value::batch(vec![vec![1i64, 2], vec![3]]);
        let err = strict()
            .compose_parts(["VALUES ", ""], [rows], None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RaggedBatch);
        assert_eq!(err.context.sql.as_deref(), Some("VALUES "));
    }

    #[test]
    fn test_permissive_binds_ragged_batch() {
        let rows = Value::batch(vec![vec![1i64, 2], vec![3]]);
        let stmt = permissive()
            .compose_parts(["VALUES ", ""], [rows], None)
            .unwrap();
        assert_eq!(stmt.text(), "VALUES $1");
        assert_eq!(
            stmt.values(),
            &[SqlValue::List(vec![
                SqlValue::List(vec![SqlValue::Int(1), SqlValue::Int(2)]),
                SqlValue::List(vec![SqlValue::Int(3)]),
            ])]
        );
    }

    #[test]
    fn test_empty_batch() {
        let empty = Value::Batch(Vec::new());
        let err = strict()
            .compose_parts(["VALUES ", ""], [empty.clone()], None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyBatch);

        let stmt = permissive()
            .compose_parts(["VALUES ", ""], [empty], None)
            .unwrap();
        assert_eq!(stmt.values(), &[SqlValue::List(Vec::new())]);
    }

    #[test]
    fn test_unsafe_batch_cell() {
        let rows = Value::Batch(vec![vec![Value::raw("now()")]]);
        let err = strict()
            .compose_parts(["VALUES ", ""], [rows.clone()], None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsafeBatchCell);

        let stmt = permissive()
            .compose_parts(["VALUES ", ""], [rows], None)
            .unwrap();
        assert_eq!(stmt.text(), "VALUES ($1)");
        assert_eq!(stmt.values(), &[SqlValue::from("now()")]);
    }

    #[test]
    fn test_misplaced_table() {
        let err = strict()
            .compose_parts(["WHERE \"kind\" = ", ""], [Value::table("User")], None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MisplacedTable);

        let stmt = permissive()
            .compose_parts(["WHERE \"kind\" = ", ""], [Value::table("User")], None)
            .unwrap();
        assert_eq!(stmt.text(), "WHERE \"kind\" = $1");
        assert_eq!(stmt.values(), &[SqlValue::from("User")]);
    }

    #[test]
    fn test_arity_error() {
        let err = strict()
            .compose_parts(["SELECT ", ""], Vec::<Value>::new(), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TemplateArity);

        let err = permissive()
            .compose_parts(Vec::<&str>::new(), Vec::<Value>::new(), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TemplateArity);
    }

    #[test]
    fn test_tracking() {
        let mut changed = MutationSet::new();
        strict()
            .compose_parts(
                ["UPDATE ", " SET x = 1 FROM ", " JOIN ", " WHERE id = ", ""],
                [
                    Value::table("Order"),
                    Value::table("Cart"),
                    Value::table("Item"),
                    Value::from(1i64),
                ],
                Some(&mut changed),
            )
            .unwrap();
        assert_eq!(changed.changed_tables(), vec!["Order"]);
    }

    #[test]
    fn test_select_not_tracked() {
        let mut changed = MutationSet::new();
        strict()
            .compose_parts(["SELECT * FROM ", ""], [Value::table("Order")], Some(&mut changed))
            .unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn test_failed_compose_leaves_tracker_untouched() {
        let mut changed = MutationSet::new();
        let err = strict()
            .compose_parts(
                ["UPDATE ", " SET \"kind\" = ", ""],
                [Value::table("Order"), Value::table("User")],
                Some(&mut changed),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MisplacedTable);
        assert!(changed.is_empty());

        let err = strict()
            .compose_parts(
                ["INSERT INTO ", " VALUES ", ""],
                [Value::table("Score"), Value::Batch(vec![vec![1i64.into()], vec![]])],
                Some(&mut changed),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RaggedBatch);
        assert!(changed.is_empty());
    }

    #[test]
    fn test_write_slot_after_select_in_same_segment() {
        let mut changed = MutationSet::new();
        strict()
            .compose_parts(
                ["WITH s AS (SELECT 1) UPDATE ", " SET \"n\" = ", ""],
                [Value::table("Order"), Value::from(2i64)],
                Some(&mut changed),
            )
            .unwrap();
        assert!(changed.is_empty());

        // A CTE passed as a nested statement leaves the write in its own segment.
        let cte = Statement::literal("WITH s AS (SELECT 1)");
        strict()
            .compose_parts(
                ["", " UPDATE ", " SET \"n\" = ", ""],
                [Value::from(cte), Value::table("Order"), Value::from(2i64)],
                Some(&mut changed),
            )
            .unwrap();
        assert_eq!(changed.changed_tables(), vec!["Order"]);
    }

    #[test]
    fn test_join_fn() {
        let parts = vec![
            Statement::from_sql("a = $1", vec![SqlValue::Int(1)]),
            Statement::literal("b IS NULL"),
            Statement::from_sql("c = $1", vec![SqlValue::Int(3)]),
        ];
        let joined = join(parts, " OR ");
        assert_eq!(joined.text(), "a = $1 OR b IS NULL OR c = $2");
        assert_eq!(joined.values(), &[SqlValue::Int(1), SqlValue::Int(3)]);
    }

    #[test]
    fn test_join_edges() {
        assert!(join(Vec::new(), " AND ").is_empty());

        let one = Statement::from_sql("a = $1", vec![SqlValue::Int(1)]);
        assert_eq!(join([one.clone()], " AND "), one);
    }

    #[test]
    fn test_mode_reported() {
        assert_eq!(permissive().config().mode, ComposeMode::Permissive);
        assert_eq!(strict().schema(), "public");
    }
}
