// Transport Port
// Abstraction over whatever carries envelopes to the server (HTTP, IPC, in-process)

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// What a transport hands back for one send.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportReply {
    /// Undecoded response body; parsed by the client.
    Raw(String),
    /// Body already decoded by the transport.
    Parsed(Value),
    /// The peer answered with no body at all.
    Empty,
}

/// Transport-level failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Transport error: {0}")]
    Failed(String),

    /// The exchange was cut off before a reply arrived.
    #[error("Request aborted: {0}")]
    Aborted(String),
}

/// Transport trait
///
/// `payload` is a single request envelope or an array of them (batch).
/// Retries and timeouts belong to the implementation; callers only react to
/// the returned error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: Value) -> Result<TransportReply, TransportError>;
}
