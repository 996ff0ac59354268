//! Identifier quoting.

/// Escape a string for use as a SQL identifier (not a value).
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Write `"schema"."table"` into `out`.
pub fn push_qualified(out: &mut String, schema: &str, table: &str) {
    out.reserve(schema.len() + table.len() + 5);
    push_escaped(out, schema);
    out.push('.');
    push_escaped(out, table);
}

/// Render `"schema"."table"`.
pub fn qualify(schema: &str, table: &str) -> String {
    let mut out = String::new();
    push_qualified(&mut out, schema, table);
    out
}

fn push_escaped(out: &mut String, name: &str) {
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

/// Check if a name is a plain identifier: ASCII letters, digits and
/// underscores, not starting with a digit.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
