//! SDK Types
//!
//! Client construction options and the per-entry results a batch hands
//! back once it is sent.

use barrister_core::protocol::ErrorObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Validate requests locally once a contract is loaded
    pub validate_request: bool,
    /// Install the default coercer on the loaded contract
    pub coerce: bool,
    /// Install the stdout trace hook at construction
    pub trace: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            validate_request: true,
            coerce: false,
            trace: false,
        }
    }
}

impl ClientOptions {
    /// Defaults overridden by `BARRISTER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            validate_request: env_flag("BARRISTER_VALIDATE_REQUEST")
                .unwrap_or(defaults.validate_request),
            coerce: env_flag("BARRISTER_COERCE").unwrap_or(defaults.coerce),
            trace: env_flag("BARRISTER_TRACE").unwrap_or(defaults.trace),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// One entry of a sent batch, in enqueue order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub id: String,
    pub method: String,
    pub params: Vec<Value>,
    pub outcome: Result<Value, ErrorObject>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ErrorObject> {
        self.outcome.as_ref().err()
    }
}
