//! The DSL's dynamically-typed value.
//!
//! Every field read from input, every local and out-of-stream variable, and
//! every intermediate result is a [`Value`]. Besides the usual scalars and
//! collections there are two special states: `Absent`, for data that is not
//! there at all (a missing field, an unset variable), and `Error`, produced by
//! operators and functions applied to inputs they cannot handle.

mod index;
mod infer;

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;

pub use index::IndexError;
pub(crate) use index::{map_key, nest, unalias};

/// Insertion-ordered string-keyed map, used for map values and out-of-stream variables.
pub type Mlrmap = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Absent,
    Error(String),
    /// The empty string.
    Void,
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Map(Mlrmap),
    Array(Vec<Value>),
}

impl Value {
    pub const ABSENT: Value = Value::Absent;
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);

    #[inline(always)]
    pub fn empty_map() -> Value {
        Value::Map(Mlrmap::new())
    }

    #[inline(always)]
    pub fn empty_array() -> Value {
        Value::Array(Vec::new())
    }

    /// A string value taken verbatim, without type inference.
    pub fn from_string(s: impl Into<String>) -> Value {
        let s = s.into();
        if s.is_empty() {
            Value::Void
        } else {
            Value::String(s)
        }
    }

    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(message.into())
    }

    /// Type names as shown to users by `typeof` and in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Error(_) => "error",
            Value::Void => "empty",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Map(_) => "map",
            Value::Array(_) => "array",
        }
    }

    #[inline(always)]
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    #[inline(always)]
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    #[inline(always)]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    #[inline(always)]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// True for strings, including the empty string.
    #[inline(always)]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_) | Value::Void)
    }

    #[inline(always)]
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    #[inline(always)]
    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    #[inline(always)]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    #[inline(always)]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    #[inline(always)]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline(always)]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline(always)]
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Array(_))
    }

    /// Absent, empty string, empty map or empty array.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Absent | Value::Void => true,
            Value::Map(m) => m.is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mlrmap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// String form used for concatenation, map keys and text output.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            Value::Void => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "(absent)"),
            Value::Error(_) => write!(f, "(error)"),
            Value::Void => Ok(()),
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Map(m) => write!(
                f,
                "{{{}}}",
                m.iter()
                    .map(|(k, v)| format!("\"{}\": {}", k, v.to_quoted()))
                    .join(", ")
            ),
            Value::Array(a) => write!(f, "[{}]", a.iter().map(Value::to_quoted).join(", ")),
        }
    }
}

impl Value {
    fn to_quoted(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            Value::Void => "\"\"".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map(Value::Int).unwrap_or(Value::Float(n as f64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from_string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::from_string(s)
    }
}

impl From<Mlrmap> for Value {
    fn from(m: Mlrmap) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::absent(Value::Absent, "absent")]
    #[case::error(Value::error("x"), "error")]
    #[case::void(Value::from_string(""), "empty")]
    #[case::string(Value::from("abc"), "string")]
    #[case::int(Value::Int(1), "int")]
    #[case::float(Value::Float(1.5), "float")]
    #[case::boolean(Value::TRUE, "boolean")]
    #[case::map(Value::empty_map(), "map")]
    #[case::array(Value::empty_array(), "array")]
    fn test_type_name(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.type_name(), expected);
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Void.to_string(), "");
        assert_eq!(Value::Absent.to_string(), "(absent)");
    }

    #[test]
    fn test_display_collections() {
        let value: Value = vec![
            ("a", Value::Int(1)),
            ("b", Value::Array(vec![Value::from("x"), Value::TRUE])),
        ]
        .into_iter()
        .collect();
        assert_eq!(value.to_string(), r#"{"a": 1, "b": ["x", true]}"#);
    }

    #[test]
    fn test_is_empty() {
        assert!(Value::Absent.is_empty());
        assert!(Value::Void.is_empty());
        assert!(Value::empty_map().is_empty());
        assert!(!Value::Int(0).is_empty());
    }
}
