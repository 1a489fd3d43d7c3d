use serde::{Deserialize, Serialize};

use crate::value::SqlValue;

/// The SQL dialect a store speaks.
///
/// The two dialects differ in identifier quoting (`[name]` vs `"name"`),
/// boolean literal encoding (`1`/`0` vs `true`/`false`), and how a generated
/// row identifier is retrieved (`OUTPUT inserted.col` vs `RETURNING col`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `PostgreSQL`
    Postgres,
    /// SQL Server
    Mssql,
}

impl Dialect {
    /// Quote an identifier for this dialect.
    ///
    /// The identifier's internal characters are not sanitized beyond the
    /// wrapping. Callers must only pass identifiers already validated
    /// against a known column set.
    #[must_use]
    pub fn escape_identifier(self, name: &str) -> String {
        match self {
            Dialect::Mssql => format!("[{name}]"),
            Dialect::Postgres => format!("\"{name}\""),
        }
    }

    /// Render a value as a dialect-safe SQL literal.
    ///
    /// Numbers and booleans are never quoted. Lists escape each element and
    /// join with `,` without surrounding parentheses; the WHERE renderer adds
    /// those for `IN` lists. Everything else funnels through string escaping.
    #[must_use]
    pub fn escape_value(self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => match self {
                Dialect::Mssql => if *b { "1" } else { "0" }.to_string(),
                Dialect::Postgres => if *b { "true" } else { "false" }.to_string(),
            },
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::List(items) => items
                .iter()
                .map(|v| self.escape_value(v))
                .collect::<Vec<_>>()
                .join(","),
            SqlValue::Timestamp(ts) => {
                escape_string(&ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            }
            SqlValue::Json(v) => escape_string(&v.to_string()),
            SqlValue::Text(s) => escape_string(s),
        }
    }
}

/// Wrap `s` in single quotes, doubling embedded quotes and backslash-escaping
/// control characters that break literal syntax (`\x1a` renders as `\Z`).
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\u{1a}' => out.push_str("\\Z"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
