//! Handler Error Types
//!
//! Maps whatever a handler signals as failure to a JSON-RPC error object.

use barrister_core::protocol::{error_code, ErrorObject};
use serde_json::Value;
use thiserror::Error;

/// Failure value a handler passes to its completion signal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    /// Structured error with its own code
    #[error("({code}) {message}")]
    Coded {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// Any other object; sent as `data` under the generic code
    #[error("Unknown error")]
    Object(Value),

    /// Bare numeric code
    #[error("Server error: {0}")]
    Code(i64),

    /// Bare message under the generic code
    #[error("{0}")]
    Message(String),
}

impl HandlerError {
    pub fn coded(code: i64, message: impl Into<String>) -> Self {
        HandlerError::Coded {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Classify an untyped error value by its shape.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(ref obj) => match obj.get("code").and_then(integral_code) {
                Some(code) => HandlerError::Coded {
                    code,
                    message: obj
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    data: obj.get("data").cloned().filter(|d| !d.is_null()),
                },
                None => HandlerError::Object(value),
            },
            Value::Number(_) => match integral_code(&value) {
                Some(code) => HandlerError::Code(code),
                None => HandlerError::Object(value),
            },
            Value::String(s) => HandlerError::Message(s),
            other => HandlerError::Object(other),
        }
    }
}

/// Integer value of `value`, also accepting floats with no fractional part.
fn integral_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        HandlerError::Message(msg.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        HandlerError::Message(msg)
    }
}

impl From<i64> for HandlerError {
    fn from(code: i64) -> Self {
        HandlerError::Code(code)
    }
}

impl From<ErrorObject> for HandlerError {
    fn from(err: ErrorObject) -> Self {
        HandlerError::Coded {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

/// Convert HandlerError to a JSON-RPC error object
pub fn to_error_object(err: HandlerError) -> ErrorObject {
    match err {
        HandlerError::Coded {
            code,
            message,
            data,
        } => ErrorObject {
            code,
            message,
            data,
        },
        HandlerError::Object(obj) => {
            ErrorObject::new(error_code::SERVER_ERROR, "Unknown error").with_data(obj)
        }
        HandlerError::Code(code) => ErrorObject::new(code, format!("Server error: {}", code)),
        HandlerError::Message(msg) => ErrorObject::new(error_code::SERVER_ERROR, msg),
    }
}
