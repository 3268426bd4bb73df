//! Scalar values and SQL literal escaping.
//!
//! [`Value`] is the unified scalar type flowing through filters and row maps.
//! `Absent` is distinct from `Null`: absent means "skip this condition or
//! assignment", null means "compare or assign SQL NULL".

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value supplied. Conditions and SET entries carrying this are skipped;
    /// INSERT retains the column as NULL.
    Absent,
    /// SQL NULL.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Render this value as an injection-safe Firebird literal.
    ///
    /// Strings are quoted with embedded quotes doubled, booleans render as
    /// `1`/`0` (the dialect has no boolean literal before 3.0), timestamps use
    /// the canonical `'YYYY-MM-DD HH:MM:SS.mmm'` form, and both `Null` and
    /// `Absent` render as `NULL` so that insert paths keep the column.
    pub fn escape(&self) -> String {
        match self {
            Value::Absent | Value::Null => "NULL".to_string(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::Float(_) => "NULL".to_string(),
            Value::Text(s) => quote(s),
            Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f")),
        }
    }

    /// The raw textual form of this value, without quoting.
    ///
    /// Used to splice LIKE wildcards around an operand before escaping.
    /// Returns `None` for `Absent` and `Null`, which cannot form a pattern.
    pub(crate) fn pattern_text(&self) -> Option<String> {
        match self {
            Value::Absent | Value::Null => None,
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some("0".to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        }
    }
}

/// Quote a string literal, doubling embedded single quotes.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Timestamp(v.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

/// `None` maps to `Absent`, not `Null`: an optional that was not supplied
/// skips the condition or assignment entirely. Use `Value::Null` explicitly
/// to compare against or assign SQL NULL.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Absent,
        }
    }
}
