//! Loosely typed values carried by error objects.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object::ErrorObject;

/// Key/value metadata attached to an error.
pub type Metadata = serde_json::Map<String, Value>;

/// A serialized (or draft) error object.
pub type JsonObject = serde_json::Map<String, Value>;

/// A code that is either text or a number.
///
/// Used for the high level `code`, the low level `subCode`, protocol status
/// codes and log levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Number(i64),
    /// A JSON number that does not fit `i64` (fractions, large unsigned).
    Decimal(serde_json::Number),
    Text(String),
}

impl Code {
    /// Read a code out of a JSON value. Only strings and numbers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Code::Text(s.clone())),
            Value::Number(n) => Some(
                n.as_i64()
                    .map(Code::Number)
                    .unwrap_or_else(|| Code::Decimal(n.clone())),
            ),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Code::Number(n) => Value::from(*n),
            Code::Decimal(n) => Value::Number(n.clone()),
            Code::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Code::Text(s) => Some(s),
            Code::Number(_) | Code::Decimal(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Code::Number(n) => Some(*n),
            Code::Decimal(_) | Code::Text(_) => None,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Number(n) => write!(f, "{}", n),
            Code::Decimal(n) => write!(f, "{}", n),
            Code::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Code::Text(value.to_string())
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Code::Text(value)
    }
}

impl From<i64> for Code {
    fn from(value: i64) -> Self {
        Code::Number(value)
    }
}

impl From<i32> for Code {
    fn from(value: i32) -> Self {
        Code::Number(value.into())
    }
}

impl From<u16> for Code {
    fn from(value: u16) -> Self {
        Code::Number(value.into())
    }
}

impl From<Code> for Value {
    fn from(code: Code) -> Self {
        code.to_value()
    }
}

/// The wrapped cause of an error.
///
/// Opaque to the registry: it is carried along, exposed through
/// `to_json` and never reconstructed into its original type on
/// deserialization (a deserialized cause is always [`Cause::Value`]).
#[derive(Clone)]
pub enum Cause {
    /// Any Rust error.
    Error(Arc<dyn std::error::Error + Send + Sync + 'static>),
    /// Another error object, e.g. one produced by a different registry.
    Nested(Box<ErrorObject>),
    /// Raw JSON, typically what came back from a serialized payload.
    Value(Value),
}

impl Cause {
    /// Wrap a Rust error.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Cause::Error(Arc::new(err))
    }

    /// The cause's message, if it has one.
    ///
    /// JSON causes only have a message when they are objects with a string
    /// `message` field.
    pub fn message(&self) -> Option<String> {
        match self {
            Cause::Error(err) => Some(err.to_string()),
            Cause::Nested(obj) => Some(obj.message().to_string()),
            Cause::Value(Value::Object(map)) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            Cause::Value(_) => None,
        }
    }

    /// JSON form used by `ErrorObject::to_json`.
    pub fn to_value(&self) -> Value {
        match self {
            Cause::Error(err) => serde_json::json!({ "message": err.to_string() }),
            Cause::Nested(obj) => Value::Object(obj.to_json(&[])),
            Cause::Value(value) => value.clone(),
        }
    }

    pub fn as_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Cause::Error(err) => Some(err.as_ref()),
            Cause::Nested(obj) => {
                Some(obj.as_ref() as &(dyn std::error::Error + Send + Sync + 'static))
            }
            Cause::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cause::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
            Cause::Nested(obj) => f.debug_tuple("Nested").field(&obj.to_string()).finish(),
            Cause::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<Value> for Cause {
    fn from(value: Value) -> Self {
        Cause::Value(value)
    }
}

impl From<ErrorObject> for Cause {
    fn from(obj: ErrorObject) -> Self {
        Cause::Nested(Box::new(obj))
    }
}

impl From<std::io::Error> for Cause {
    fn from(err: std::io::Error) -> Self {
        Cause::error(err)
    }
}

impl From<stratum_error::Error> for Cause {
    fn from(err: stratum_error::Error) -> Self {
        Cause::error(err)
    }
}

impl From<&str> for Cause {
    fn from(message: &str) -> Self {
        Cause::Value(serde_json::json!({ "message": message }))
    }
}
