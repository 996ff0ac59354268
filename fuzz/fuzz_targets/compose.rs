//! Fuzz target for statement composition.
//!
//! Builds arbitrary templates, including nested statements and batches, and
//! checks that every successful composition numbers its placeholders
//! `$1..$n` left to right with exactly `n` bound values.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_compose
//! ```

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use tagsql_query::{
    Composer, ComposerConfig, MutationSet, Statement, Template, Value, join,
};

#[derive(Debug, Arbitrary)]
struct FuzzTemplate {
    lead: String,
    parts: Vec<(FuzzValue, String)>,
}

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Table(String),
    Raw(String),
    Nested(Box<FuzzTemplate>),
    Batch(Vec<Vec<FuzzCell>>),
}

#[derive(Debug, Arbitrary)]
enum FuzzCell {
    Int(i64),
    String(String),
    Default,
    Raw(String),
}

impl FuzzTemplate {
    fn into_template(self, composer: &Composer, depth: usize) -> Template {
        let mut segments = vec![self.lead];
        let mut values = Vec::new();
        for (value, segment) in self.parts.into_iter().take(16) {
            values.push(value.into_value(composer, depth));
            segments.push(segment);
        }
        Template::new(segments, values)
    }
}

impl FuzzValue {
    fn into_value(self, composer: &Composer, depth: usize) -> Value {
        match self {
            FuzzValue::Null => Value::null(),
            FuzzValue::Bool(b) => b.into(),
            FuzzValue::Int(i) => i.into(),
            FuzzValue::Float(f) => f.into(),
            FuzzValue::String(s) => s.into(),
            FuzzValue::Table(t) => Value::table(t),
            FuzzValue::Raw(r) => Value::raw(r),
            FuzzValue::Nested(inner) if depth < 5 => {
                let template = inner.into_template(composer, depth + 1);
                match composer.compose(template, None) {
                    Ok(statement) => statement.into(),
                    Err(_) => Value::null(),
                }
            }
            FuzzValue::Nested(_) => Value::null(),
            FuzzValue::Batch(rows) => Value::Batch(
                rows.into_iter()
                    .take(8)
                    .map(|row| row.into_iter().take(8).map(FuzzCell::into_value).collect())
                    .collect(),
            ),
        }
    }
}

impl FuzzCell {
    fn into_value(self) -> Value {
        match self {
            FuzzCell::Int(i) => i.into(),
            FuzzCell::String(s) => s.into(),
            FuzzCell::Default => Value::raw("DEFAULT"),
            FuzzCell::Raw(r) => Value::raw(r),
        }
    }
}

fn check(statement: &Statement) {
    let expected: Vec<usize> = (1..=statement.param_count()).collect();
    assert_eq!(statement.placeholder_indices(), expected);
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    let Ok(permissive) = bool::arbitrary(&mut unstructured) else {
        return;
    };
    let config = if permissive {
        ComposerConfig::new().permissive()
    } else {
        ComposerConfig::new()
    };
    let Ok(composer) = Composer::new(config) else {
        return;
    };

    let mut statements = Vec::new();
    for _ in 0..4 {
        let Ok(fuzz) = FuzzTemplate::arbitrary(&mut unstructured) else {
            break;
        };
        let mut changed = MutationSet::new();
        let template = fuzz.into_template(&composer, 0);
        if let Ok(statement) = composer.compose(template, Some(&mut changed)) {
            check(&statement);
            statements.push(statement);
        }
    }

    check(&join(statements, " AND "));
});
