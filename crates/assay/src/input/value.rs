//! Scalar cell values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell of a dataset.
///
/// Conversion is explicit: anything that is not a finite number or a
/// non-empty label becomes [`Value::Missing`], never a silent `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A finite number.
    Numeric(f64),
    /// A non-numeric label.
    Categorical(String),
    /// Empty, NA-like or unconvertible cell.
    Missing,
}

impl Value {
    /// Build a numeric value; non-finite input becomes `Missing`.
    pub fn numeric(value: f64) -> Self {
        if value.is_finite() {
            Value::Numeric(value)
        } else {
            Value::Missing
        }
    }

    /// Build a categorical value from a label.
    pub fn categorical(label: impl Into<String>) -> Self {
        Value::Categorical(label.into())
    }

    /// Parse a raw text cell.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if Self::is_missing_token(trimmed) {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Numeric(v),
            _ => Value::Categorical(trimmed.to_string()),
        }
    }

    /// Check if a raw token represents a missing value.
    pub fn is_missing_token(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
    }

    /// Returns true for [`Value::Missing`].
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the value.
    ///
    /// Numeric-looking labels are parsed; everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) if v.is_finite() => Some(*v),
            Value::Numeric(_) => None,
            Value::Categorical(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Value::Missing => None,
        }
    }

    /// String form used as a categorical level.
    pub fn label(&self) -> String {
        match self {
            Value::Numeric(v) => v.to_string(),
            Value::Categorical(s) => s.clone(),
            Value::Missing => "NA".to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Missing
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(v) => write!(f, "{}", v),
            Value::Categorical(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::numeric(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Numeric(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Numeric(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Categorical(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Categorical(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_and_labels() {
        assert_eq!(Value::parse("3.5"), Value::Numeric(3.5));
        assert_eq!(Value::parse(" 42 "), Value::Numeric(42.0));
        assert_eq!(Value::parse("A"), Value::Categorical("A".to_string()));
    }

    #[test]
    fn test_parse_missing_tokens() {
        for token in ["", "  ", "NA", "n/a", "NaN", "null", "None"] {
            assert_eq!(Value::parse(token), Value::Missing, "token {:?}", token);
        }
    }

    #[test]
    fn test_non_finite_becomes_missing() {
        assert_eq!(Value::numeric(f64::NAN), Value::Missing);
        assert_eq!(Value::numeric(f64::INFINITY), Value::Missing);
        assert_eq!(Value::parse("inf"), Value::Categorical("inf".to_string()));
        assert_eq!(Value::parse("inf").as_f64(), None);
    }

    #[test]
    fn test_as_f64_boundary() {
        assert_eq!(Value::Numeric(2.0).as_f64(), Some(2.0));
        assert_eq!(Value::categorical("7").as_f64(), Some(7.0));
        assert_eq!(Value::categorical("seven").as_f64(), None);
        assert_eq!(Value::Missing.as_f64(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Value::Numeric(2.0).label(), "2");
        assert_eq!(Value::Numeric(2.5).label(), "2.5");
        assert_eq!(Value::categorical("x").label(), "x");
        assert_eq!(Value::Missing.label(), "NA");
    }

    #[test]
    fn test_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Numeric(1.5),
            Value::categorical("a"),
            Value::Missing,
        ])
        .unwrap();
        assert_eq!(json, r#"[1.5,"a",null]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[2], Value::Missing);
    }
}
