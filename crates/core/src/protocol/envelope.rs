//! JSON-RPC 2.0 Envelope Types
//!
//! Data only. Requests carry positional params; responses carry exactly one
//! of `result` or `error`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Reserved introspection method returning the raw IDL document.
pub const IDL_METHOD: &str = "barrister-idl";

/// Error codes used on the wire
pub mod error_code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Default for application errors.
    pub const SERVER_ERROR: i64 = -32000;
    /// Handler result failed return-type validation.
    pub const INVALID_RESPONSE: i64 = -32001;
    pub const REQUEST_ABORTED: i64 = -32002;
}

/// JSON-RPC 2.0 request object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

impl Request {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Value::String(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Lenient conversion from an untyped envelope, producing the error
    /// response the server should send when the shape is wrong.
    pub fn from_value(value: Value) -> Result<Self, Response> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            _ => {
                return Err(Response::error(
                    Value::Null,
                    ErrorObject::new(error_code::INVALID_REQUEST, "Request must be an object"),
                ))
            }
        };

        let id = obj.remove("id").unwrap_or(Value::Null);
        let method = match obj.remove("method") {
            Some(Value::String(m)) if !m.is_empty() => m,
            _ => {
                return Err(Response::error(
                    id,
                    ErrorObject::new(
                        error_code::INVALID_REQUEST,
                        "Request did not contain a method",
                    ),
                ))
            }
        };
        let params = match obj.remove("params") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(params)) => params,
            Some(_) => {
                return Err(Response::error(
                    id,
                    ErrorObject::new(error_code::INVALID_PARAMS, "params must be an array"),
                ))
            }
        };
        let jsonrpc = match obj.remove("jsonrpc") {
            Some(Value::String(v)) => v,
            _ => JSONRPC_VERSION.to_string(),
        };

        Ok(Self {
            jsonrpc,
            id,
            method,
            params,
        })
    }

    /// Key under which this request is correlated with its response.
    pub fn id_key(&self) -> String {
        id_key(&self.id)
    }
}

/// Correlation key for an envelope id. String ids map to themselves.
pub fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl std::fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}

/// JSON-RPC 2.0 response object.
///
/// `result: Some(Value::Null)` is a successful null result and is
/// distinct from an absent `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse into the caller-facing outcome. A response with neither
    /// slot set is treated as a null result.
    pub fn into_outcome(self) -> Result<Value, ErrorObject> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }

    /// Lenient conversion from an untyped envelope.
    pub fn from_value(value: Value) -> Result<Self, ErrorObject> {
        serde_json::from_value(value).map_err(|e| {
            ErrorObject::new(
                error_code::INTERNAL_ERROR,
                format!("Malformed response envelope: {}", e),
            )
        })
    }

    pub fn id_key(&self) -> String {
        id_key(&self.id)
    }
}

/// Per-request properties handed to the server by the transport
/// (headers, peer identity, ...).
pub type Props = Map<String, Value>;
