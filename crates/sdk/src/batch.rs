//! Client-side batches
//!
//! Requests are queued locally, sent as one array, and the responses are
//! matched back to the queue by id. The server may answer in any order;
//! results always come back in enqueue order.

use crate::client::Client;
use crate::error::{Result, SdkError};
use crate::types::BatchResult;
use barrister_core::protocol::{error_code, ErrorObject, Request, Response};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Batch {
    client: Client,
    pending: Vec<Request>,
}

impl Batch {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            pending: Vec::new(),
        }
    }

    /// Queue a call; returns the id it was stamped with.
    pub fn request(&mut self, method: &str, params: Vec<Value>) -> String {
        let request = self.client.next_request(method, params);
        let id = request.id_key();
        self.pending.push(request);
        id
    }

    /// Queue calls through an interface view.
    pub fn proxy(&mut self, interface: &str) -> Result<BatchProxy<'_>> {
        let proxy = self.client.proxy(interface)?;
        Ok(BatchProxy { batch: self, proxy })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Send every queued request in one round trip.
    ///
    /// Requests failing local validation are answered without being sent;
    /// if none remain, no transport call is made. A reply that is not an
    /// array fails the whole batch.
    pub async fn send(mut self) -> Result<Vec<BatchResult>> {
        let mut rejected: HashMap<String, ErrorObject> = HashMap::new();
        let mut outgoing = Vec::with_capacity(self.pending.len());

        for request in &mut self.pending {
            match self.client.prevalidate(request) {
                Ok(()) => outgoing.push(serde_json::to_value(&*request)?),
                Err(err) => {
                    debug!(id = %request.id, method = %request.method, "Dropped from batch by validation");
                    rejected.insert(request.id_key(), err);
                }
            }
        }

        let responses = if outgoing.is_empty() {
            HashMap::new()
        } else {
            let reply = self
                .client
                .exchange(&Value::Null, Value::Array(outgoing))
                .await;
            index_responses(reply)?
        };

        Ok(self
            .pending
            .into_iter()
            .map(|request| {
                let id = request.id_key();
                let outcome = match (rejected.get(&id), responses.get(&id)) {
                    (Some(err), _) => Err(err.clone()),
                    (None, Some(response)) => response.clone().into_outcome(),
                    (None, None) => Err(ErrorObject::new(
                        error_code::INTERNAL_ERROR,
                        format!("No response received for request id: {}", id),
                    )),
                };
                BatchResult {
                    id,
                    method: request.method,
                    params: request.params,
                    outcome,
                }
            })
            .collect())
    }
}

/// Index a batch reply by response id. Later duplicates overwrite earlier ones.
fn index_responses(reply: Value) -> Result<HashMap<String, Response>> {
    let items = match reply {
        Value::Array(items) => items,
        other => {
            let err = Response::from_value(other)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| {
                    ErrorObject::new(
                        error_code::INTERNAL_ERROR,
                        "Batch response was not an array",
                    )
                });
            return Err(SdkError::from(err));
        }
    };

    let mut responses = HashMap::with_capacity(items.len());
    for item in items {
        match Response::from_value(item) {
            Ok(response) => {
                responses.insert(response.id_key(), response);
            }
            Err(err) => warn!(error = %err, "Skipping malformed batch response"),
        }
    }
    Ok(responses)
}

/// Interface view that queues onto a [`Batch`] instead of calling.
#[derive(Debug)]
pub struct BatchProxy<'a> {
    batch: &'a mut Batch,
    proxy: crate::client::Proxy,
}

impl BatchProxy<'_> {
    pub fn functions(&self) -> &[String] {
        self.proxy.functions()
    }

    /// Queue `function`; returns the request id.
    pub fn call(&mut self, function: &str, params: Vec<Value>) -> Result<String> {
        let method = self.proxy.method(function)?;
        Ok(self.batch.request(&method, params))
    }
}
