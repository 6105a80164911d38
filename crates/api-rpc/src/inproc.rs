//! In-process transport
//!
//! Connects a client directly to a server in the same process. Requests
//! still go through the wire encoding so both sides exercise the full
//! codec path.

use crate::server::Server;
use async_trait::async_trait;
use barrister_core::port::{Transport, TransportError, TransportReply};
use barrister_core::protocol::{to_ascii_string, Props};
use serde_json::Value;
use std::sync::Arc;

pub struct InProcessTransport {
    server: Arc<Server>,
    props: Props,
}

impl InProcessTransport {
    pub fn new(server: Arc<Server>) -> Self {
        Self {
            server,
            props: Props::new(),
        }
    }

    /// Properties passed to the server's filters on every request.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn send(&self, payload: Value) -> Result<TransportReply, TransportError> {
        let body = to_ascii_string(&payload).map_err(|e| TransportError::Failed(e.to_string()))?;
        let reply = self.server.handle_json(self.props.clone(), &body).await;
        Ok(TransportReply::Raw(reply))
    }
}
