//! Value classification and table-slot detection.
//!
//! Whether a string is data or a table name depends on the literal text in
//! front of it. `SELECT * FROM {}` takes a table, `WHERE a IS DISTINCT FROM {}`
//! takes a value even though it also ends in `FROM`.

use crate::value::{SqlValue, Value};

/// Keyword that opened a table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSlot {
    /// `INSERT INTO`
    InsertInto,
    /// `DELETE FROM`
    DeleteFrom,
    /// `UPDATE`
    Update,
    /// `FROM`
    From,
    /// `JOIN`
    Join,
    /// `USING`
    Using,
}

/// Longer keywords first so `DELETE FROM` wins over `FROM`.
const SLOT_KEYWORDS: &[(&str, TableSlot)] = &[
    ("insert into", TableSlot::InsertInto),
    ("delete from", TableSlot::DeleteFrom),
    ("update", TableSlot::Update),
    ("from", TableSlot::From),
    ("join", TableSlot::Join),
    ("using", TableSlot::Using),
];

impl TableSlot {
    /// Detect whether `segment` ends in a table slot.
    ///
    /// The segment is case-folded and right-trimmed; the keyword must end it as
    /// a whole word. `IS DISTINCT FROM` is a predicate, not a table slot.
    pub fn detect(segment: &str) -> Option<Self> {
        let folded = segment.trim_end().to_ascii_lowercase();

        let slot = SLOT_KEYWORDS.iter().find_map(|(keyword, slot)| {
            ends_with_word(&folded, keyword).then_some(*slot)
        })?;

        if ends_with_word(&folded, "distinct from") {
            return None;
        }

        Some(slot)
    }

    /// The SQL keyword for this slot.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::InsertInto => "INSERT INTO",
            Self::DeleteFrom => "DELETE FROM",
            Self::Update => "UPDATE",
            Self::From => "FROM",
            Self::Join => "JOIN",
            Self::Using => "USING",
        }
    }

    /// The write this slot targets, if any.
    ///
    /// `FROM`, `JOIN` and `USING` only read their table, even inside an
    /// `UPDATE` or `DELETE`.
    pub fn mutation(&self) -> Option<Operation> {
        match self {
            Self::InsertInto => Some(Operation::Insert),
            Self::Update => Some(Operation::Update),
            Self::DeleteFrom => Some(Operation::Delete),
            Self::From | Self::Join | Self::Using => None,
        }
    }
}

/// Check that `text` ends with `keyword` and the keyword is not the tail of a
/// longer identifier.
fn ends_with_word(text: &str, keyword: &str) -> bool {
    if !text.ends_with(keyword) {
        return false;
    }
    let head = &text[..text.len() - keyword.len()];
    match head.chars().next_back() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '_' || c == '"'),
    }
}

/// Kind of statement a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// SELECT query.
    Select,
    /// INSERT statement.
    Insert,
    /// UPDATE statement.
    Update,
    /// DELETE statement.
    Delete,
}

impl Operation {
    /// Detect the operation named in `segment` by case-insensitive substring
    /// search, checked in the order `select`, `insert`, `update`, `delete`.
    pub fn detect(segment: &str) -> Option<Self> {
        let folded = segment.to_ascii_lowercase();
        [
            ("select", Self::Select),
            ("insert", Self::Insert),
            ("update", Self::Update),
            ("delete", Self::Delete),
        ]
        .into_iter()
        .find_map(|(token, op)| folded.contains(token).then_some(op))
    }

    /// Check if this is a read operation.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Select)
    }

    /// Check if this is a write operation.
    pub fn is_write(&self) -> bool {
        !self.is_read()
    }
}

/// How a value will be rendered at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Bound as a `$n` parameter.
    Plain,
    /// Rendered as a qualified table name.
    TableRef(TableSlot),
    /// Flattened into the parent.
    Nested,
    /// Inserted verbatim.
    Raw,
    /// Expanded into a multi-row value list.
    Batch,
    /// An explicit table outside any table slot.
    MisplacedTable,
}

/// Classify `value` given the segment that precedes it.
///
/// Nested, raw and batch values keep their kind even in a table slot. Only an
/// explicit table or a plain string can become a table reference.
pub fn classify(value: &Value, preceding: &str) -> ValueClass {
    match value {
        Value::Nested(_) => ValueClass::Nested,
        Value::Raw(_) => ValueClass::Raw,
        Value::Batch(_) => ValueClass::Batch,
        Value::Table(_) => match TableSlot::detect(preceding) {
            Some(slot) => ValueClass::TableRef(slot),
            None => ValueClass::MisplacedTable,
        },
        Value::Plain(SqlValue::String(_)) => match TableSlot::detect(preceding) {
            Some(slot) => ValueClass::TableRef(slot),
            None => ValueClass::Plain,
        },
        Value::Plain(_) => ValueClass::Plain,
    }
}
