//! Compile-time constant values.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{String, Vec};

/// A constant value, as it appears in literals, folded enum references and
/// resolved type identifiers.
///
/// This is deliberately a plain data type: arithmetic, comparison and
/// conversion between values belong to the runtime, not to the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Duration { seconds: i64, nanos: i32 },
    Timestamp { seconds: i64, nanos: i32 },
    /// A type used as a value, e.g. `int` in `type(x) == int`.
    Type(String),
}

impl Value {
    /// Name of the value's kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null_type",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Duration { .. } => "google.protobuf.Duration",
            Value::Timestamp { .. } => "google.protobuf.Timestamp",
            Value::Type(_) => "type",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}u", u),
            Value::Double(d) => write!(f, "{:?}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(bytes) => {
                write!(f, "b\"")?;
                for byte in bytes {
                    write!(f, "\\x{:02x}", byte)?;
                }
                write!(f, "\"")
            }
            Value::Duration { seconds, nanos } => write!(f, "duration({}s, {}ns)", seconds, nanos),
            Value::Timestamp { seconds, nanos } => {
                write!(f, "timestamp({}s, {}ns)", seconds, nanos)
            }
            Value::Type(name) => write!(f, "type({})", name),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(String::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}
