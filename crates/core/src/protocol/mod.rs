//! JSON-RPC 2.0 envelope model and wire codec.

pub mod codec;
pub mod envelope;

pub use codec::{from_str, parse_response, to_ascii_string};
pub use envelope::{
    error_code, id_key, ErrorObject, Props, Request, Response, IDL_METHOD, JSONRPC_VERSION,
};
