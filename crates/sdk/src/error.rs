//! SDK Error Types
//!
//! Everything a client call can fail with. Remote failures keep their
//! JSON-RPC code and data in `SdkError::Rpc`. Local failures such as an
//! unloaded contract or a bad interface name get their own variants and
//! carry no code.

use barrister_core::protocol::ErrorObject;
use barrister_core::ContractError;
use serde_json::Value;
use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Contract not loaded; call load_contract first")]
    ContractNotLoaded,

    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// Error envelope from the server, the transport or local validation
    #[error("RPC error ({code}): {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Invalid contract: {0}")]
    Contract(#[from] ContractError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Deferred already has a {0} continuation")]
    AlreadyRegistered(&'static str),

    #[error("Deferred result was already delivered to a continuation")]
    Consumed,
}

impl SdkError {
    /// JSON-RPC error code, if this error carries one
    pub fn code(&self) -> Option<i64> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ErrorObject> for SdkError {
    fn from(err: ErrorObject) -> Self {
        SdkError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}
