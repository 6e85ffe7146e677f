//! Scalar value and column type definitions
//!
//! Supported types:
//! - bool: Boolean
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - text: UTF-8 string
//!
//! Every type admits `Null`; nullability is a column property.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{ValueError, ValueResult};

/// A single typed scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Returns true if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }

    /// Converts a JSON scalar into a value.
    ///
    /// Arrays and objects are rejected.
    pub fn from_json(json: &serde_json::Value) -> ValueResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(ValueError::UnsupportedJson(n.to_string()))
                }
            }
            Json::String(s) => Ok(Value::Text(s.clone())),
            other => Err(ValueError::UnsupportedJson(other.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
}

impl DataType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Text => "text",
        }
    }

    /// Checks that a value may be stored in a column of this type.
    ///
    /// `Null` is accepted here; nullability is checked by the schema.
    pub fn check(&self, value: &Value) -> ValueResult<()> {
        match (self, value) {
            (_, Value::Null)
            | (DataType::Bool, Value::Bool(_))
            | (DataType::Int, Value::Int(_))
            | (DataType::Float, Value::Float(_) | Value::Int(_))
            | (DataType::Text, Value::Text(_)) => Ok(()),
            (expected, found) => Err(ValueError::TypeMismatch {
                expected: expected.type_name(),
                found: found.type_name(),
            }),
        }
    }

    /// Compares two values of this type.
    ///
    /// Ordering rules:
    /// - null sorts before any non-null (callers applying a null ordering
    ///   policy handle nulls before reaching here)
    /// - ints widen to floats in float columns
    /// - NaN and mismatched types are errors
    pub fn compare(&self, a: &Value, b: &Value) -> ValueResult<Ordering> {
        match (a, b) {
            (Value::Null, Value::Null) => return Ok(Ordering::Equal),
            (Value::Null, _) => return Ok(Ordering::Less),
            (_, Value::Null) => return Ok(Ordering::Greater),
            _ => {}
        }

        match self {
            DataType::Bool => Ok(self.as_bool(a)?.cmp(&self.as_bool(b)?)),
            DataType::Int => Ok(self.as_int(a)?.cmp(&self.as_int(b)?)),
            DataType::Float => {
                let (x, y) = (self.as_float(a)?, self.as_float(b)?);
                x.partial_cmp(&y).ok_or(ValueError::Incomparable(if x.is_nan() {
                    x
                } else {
                    y
                }))
            }
            DataType::Text => Ok(self.as_text(a)?.cmp(self.as_text(b)?)),
        }
    }

    /// Value equality for full-row comparison.
    ///
    /// Unlike [`DataType::compare`], NaN equals NaN, so a stored NaN outside
    /// the sort key never aborts a diff. Type mismatches are still errors.
    pub fn value_eq(&self, a: &Value, b: &Value) -> ValueResult<bool> {
        match self {
            DataType::Float if !a.is_null() && !b.is_null() => {
                let (x, y) = (self.as_float(a)?, self.as_float(b)?);
                Ok(x == y || (x.is_nan() && y.is_nan()))
            }
            _ => Ok(self.compare(a, b)?.is_eq()),
        }
    }

    fn mismatch(&self, found: &Value) -> ValueError {
        ValueError::TypeMismatch {
            expected: self.type_name(),
            found: found.type_name(),
        }
    }

    fn as_bool(&self, v: &Value) -> ValueResult<bool> {
        match v {
            Value::Bool(b) => Ok(*b),
            other => Err(self.mismatch(other)),
        }
    }

    fn as_int(&self, v: &Value) -> ValueResult<i64> {
        match v {
            Value::Int(i) => Ok(*i),
            other => Err(self.mismatch(other)),
        }
    }

    fn as_float(&self, v: &Value) -> ValueResult<f64> {
        match v {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(self.mismatch(other)),
        }
    }

    fn as_text<'v>(&self, v: &'v Value) -> ValueResult<&'v str> {
        match v {
            Value::Text(s) => Ok(s),
            other => Err(self.mismatch(other)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
