//! Templates: literal segments interleaved with values.
//!
//! A [`Template`] is the input to composition. It can be built directly from
//! segments and values, fluently with [`TemplateBuilder`], or with the
//! [`stmt!`](crate::stmt) macro.
//!
//! ```rust
//! use tagsql_query::{Composer, Template, Value};
//!
//! let template = Template::builder()
//!     .sql("SELECT * FROM ")
//!     .table("Listing")
//!     .sql(" WHERE \"price\" < ")
//!     .bind(100)
//!     .build();
//!
//! assert_eq!(template.segments().len(), template.values().len() + 1);
//!
//! let stmt = Composer::default().compose(template, None).unwrap();
//! assert_eq!(stmt.text(), "SELECT * FROM \"public\".\"Listing\" WHERE \"price\" < $1");
//! ```

use crate::statement::Statement;
use crate::value::Value;

/// Literal segments and the values between them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    segments: Vec<String>,
    values: Vec<Value>,
}

impl Template {
    /// Create a template from segments and values.
    ///
    /// `segments.len()` must be `values.len() + 1`; composition rejects any
    /// other shape.
    pub fn new<S: Into<String>>(
        segments: impl IntoIterator<Item = S>,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            values: values.into_iter().collect(),
        }
    }

    /// A template that is only literal text.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
            values: Vec::new(),
        }
    }

    /// Split `format` on `{}` holes and pair them with `values`.
    ///
    /// `{{` and `}}` stand for literal braces, as in `format!`. A `{}` inside a
    /// single-quoted SQL literal is text, so `'{}'` needs no escaping.
    ///
    /// This is what the [`stmt!`](crate::stmt) macro expands to.
    pub fn from_format(format: &str, values: Vec<Value>) -> Self {
        Self {
            segments: split_holes(format),
            values,
        }
    }

    /// Start a fluent builder.
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::new()
    }

    /// The literal segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The interpolated values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Check that segments and values alternate.
    pub fn is_well_formed(&self) -> bool {
        self.segments.len() == self.values.len() + 1
    }

    /// Consume the template into its segments and values.
    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        (self.segments, self.values)
    }
}

fn split_holes(format: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match (c, next) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                current.push(c);
            }
            ('{', Some('}')) if !in_literal => {
                chars.next();
                segments.push(std::mem::take(&mut current));
            }
            ('\'', _) => {
                in_literal = !in_literal;
                current.push(c);
            }
            _ => current.push(c),
        }
    }

    segments.push(current);
    segments
}

/// Fluent builder for a [`Template`].
///
/// Consecutive literal pushes are merged into one segment and a value pushed
/// right after another value gets an empty segment between them, so the
/// result is always well formed.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    segments: Vec<String>,
    values: Vec<Value>,
}

impl TemplateBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            segments: vec![String::new()],
            values: Vec::new(),
        }
    }

    /// Append literal SQL text.
    pub fn sql(mut self, text: impl AsRef<str>) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.push_str(text.as_ref());
        }
        self
    }

    /// Append literal SQL text if `condition` holds.
    pub fn sql_if(self, condition: bool, text: impl AsRef<str>) -> Self {
        if condition { self.sql(text) } else { self }
    }

    /// Interpolate any value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self.segments.push(String::new());
        self
    }

    /// Bind a parameter.
    pub fn bind(self, value: impl Into<Value>) -> Self {
        self.value(value)
    }

    /// Push SQL and bind a value if `condition` holds.
    pub fn push_bind_if(
        self,
        condition: bool,
        text: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> Self {
        if condition {
            self.sql(text).bind(value)
        } else {
            self
        }
    }

    /// Interpolate a table name.
    pub fn table(self, name: &str) -> Self {
        self.value(Value::table(name))
    }

    /// Interpolate a nested statement.
    pub fn nest(self, statement: Statement) -> Self {
        self.value(Value::Nested(statement))
    }

    /// Interpolate trusted raw SQL.
    pub fn raw(self, text: impl Into<String>) -> Self {
        self.value(Value::raw(text))
    }

    /// Interpolate a batch of rows.
    pub fn batch(self, rows: Vec<Vec<Value>>) -> Self {
        self.value(Value::Batch(rows))
    }

    /// Finish the template.
    pub fn build(self) -> Template {
        Template {
            segments: self.segments,
            values: self.values,
        }
    }
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let template = Template::new(["SELECT ", ""], [Value::from(1i64)]);
        assert!(template.is_well_formed());
        assert_eq!(template.segments(), ["SELECT ", ""]);
    }

    #[test]
    fn test_from_format() {
        let template = Template::from_format(
            "SELECT * FROM {} WHERE id = {}",
            vec![Value::table("User"), Value::from(1i64)],
        );
        assert_eq!(template.segments(), ["SELECT * FROM ", " WHERE id = ", ""]);
        assert!(template.is_well_formed());
    }

    #[test]
    fn test_from_format_braces() {
        let template = Template::from_format(
            "UPDATE {} SET \"tags\" = '{}', \"meta\" = {{}}::jsonb WHERE \"id\" = {}",
            vec![Value::table("Listing"), Value::from(7i64)],
        );
        assert_eq!(
            template.segments(),
            ["UPDATE ", " SET \"tags\" = '{}', \"meta\" = {}::jsonb WHERE \"id\" = ", ""]
        );
        assert!(template.is_well_formed());

        let escaped = Template::from_format("SELECT '{{}}', '{{1,2}}' = {}", vec![Value::from(1i64)]);
        assert_eq!(escaped.segments(), ["SELECT '{}', '{1,2}' = ", ""]);

        let doubled_quote = Template::from_format("SELECT 'it''s {}' || {}", vec![Value::from("x")]);
        assert_eq!(doubled_quote.segments(), ["SELECT 'it''s {}' || ", ""]);
    }

    #[test]
    fn test_builder_merges_literals() {
        let template = Template::builder()
            .sql("SELECT * ")
            .sql("FROM ")
            .table("User")
            .build();
        assert_eq!(template.segments(), ["SELECT * FROM ", ""]);
        assert_eq!(template.values().len(), 1);
    }

    #[test]
    fn test_builder_adjacent_values() {
        let template = Template::builder().bind(1i64).bind(2i64).build();
        assert_eq!(template.segments(), ["", "", ""]);
        assert!(template.is_well_formed());
    }

    #[test]
    fn test_builder_conditionals() {
        let role: Option<&str> = None;
        let template = Template::builder()
            .sql("SELECT 1 WHERE TRUE")
            .push_bind_if(role.is_some(), " AND \"role\" = ", role)
            .sql_if(true, " LIMIT 1")
            .build();
        assert_eq!(template.segments(), ["SELECT 1 WHERE TRUE LIMIT 1"]);
        assert!(template.values().is_empty());
    }

    #[test]
    fn test_default_is_not_well_formed() {
        assert!(!Template::default().is_well_formed());
        assert!(TemplateBuilder::new().build().is_well_formed());
    }
}
