// Central Error Type for the Contract layer

use thiserror::Error;

/// Errors raised while building a [`Contract`](crate::contract::Contract)
/// from an IDL document.
///
/// Validation failures of individual values are not errors of this kind:
/// they are reported as `ValidationError`s and surfaced on the wire as
/// JSON-RPC error objects.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Malformed IDL: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Struct '{child}' extends unknown struct '{parent}'")]
    UnknownParent { child: String, parent: String },

    #[error("Cyclic extends chain: {}", chain.join(" -> "))]
    CyclicExtends { chain: Vec<String> },

    #[error("Duplicate definition: {0}")]
    Duplicate(String),
}

/// Result type alias using ContractError
pub type Result<T> = std::result::Result<T, ContractError>;
