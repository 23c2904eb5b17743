//! Cell values and the comparison policy used by sorting and filtering.

use std::cmp::Ordering;

/// A value read out of a record for one column.
///
/// Records are opaque to the engine; the [`Row`](crate::column::Row) trait
/// (or a column's `sort_value` override) produces one of these per cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing / unset. Sorts after every other value in both directions.
    Null,
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value {
    /// Check whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    ///
    /// Used by range filters; strings are not parsed.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// String coercion used for discrete filter membership and
    /// mixed-type comparison.
    pub fn coerce_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => {
                // Integers render without a trailing ".0" so coerced values
                // match filter option strings like "3".
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Num(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Compare two non-null values.
///
/// Two strings compare case-insensitively; two numbers numerically;
/// anything else is compared through string coercion.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Str(a), Value::Str(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Num(a), Value::Num(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => a
            .coerce_string()
            .to_lowercase()
            .cmp(&b.coerce_string().to_lowercase()),
    }
}
