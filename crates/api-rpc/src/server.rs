//! Barrister JSON-RPC Server
//!
//! Routes `Interface.function` requests to registered handlers, enforcing
//! the contract on the way in and (optionally) on the way out. Batches are
//! dispatched cooperatively and answered in completion order.

use crate::error::{to_error_object, HandlerError};
use crate::filter::{Filter, FilterContext};
use crate::handler::{completion, HandlerFn, InterfaceHandler};
use barrister_core::contract::{Contract, DefaultCoercer};
use barrister_core::protocol::{
    error_code, to_ascii_string, ErrorObject, Props, Request, Response, IDL_METHOD,
};
use barrister_core::ContractError;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fallback body if a reply cannot be encoded
const ENCODE_FAILURE: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Unable to encode response"}}"#;

/// Receives one trace line per request and response.
pub type TraceFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Server Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Check handler results against the declared return types
    pub validate_responses: bool,
    /// Retry failed request params once after coercing them
    pub coerce: bool,
    /// Install the stdout trace hook at construction
    pub trace: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            validate_responses: true,
            coerce: false,
            trace: false,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `BARRISTER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            validate_responses: env_flag("BARRISTER_VALIDATE_RESPONSES")
                .unwrap_or(defaults.validate_responses),
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

/// Trace hook that prints each line to stdout.
pub fn stdout_trace() -> TraceFn {
    Arc::new(|line| println!("{}", line))
}

/// Barrister Server
pub struct Server {
    contract: Arc<Contract>,
    handlers: HashMap<String, InterfaceHandler>,
    filters: Vec<Arc<dyn Filter>>,
    trace: Option<TraceFn>,
    config: ServerConfig,
}

impl Server {
    pub fn new(idl: Value) -> Result<Self, ContractError> {
        Self::with_config(idl, ServerConfig::default())
    }

    pub fn with_config(idl: Value, config: ServerConfig) -> Result<Self, ContractError> {
        let mut contract = Contract::new(idl)?;
        if config.coerce {
            contract = contract.with_coercer(Arc::new(DefaultCoercer));
        }
        let trace = config.trace.then(stdout_trace);

        info!(
            validate_responses = config.validate_responses,
            coerce = config.coerce,
            "Barrister server created"
        );

        Ok(Self {
            contract: Arc::new(contract),
            handlers: HashMap::new(),
            filters: Vec::new(),
            trace,
            config,
        })
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register the implementation for an interface. Replaces any
    /// earlier registration under the same name.
    pub fn add_handler(&mut self, interface: impl Into<String>, handler: InterfaceHandler) {
        let interface = interface.into();
        if self.contract.interface(&interface).is_none() {
            warn!(interface = %interface, "Handler registered for interface not in IDL");
        }
        self.handlers.insert(interface, handler);
    }

    /// Replace the filter chain.
    pub fn set_filters(&mut self, filters: Vec<Arc<dyn Filter>>) {
        self.filters = filters;
    }

    /// Replace the filter chain with a single filter.
    pub fn set_filter(&mut self, filter: impl Filter + 'static) {
        self.filters = vec![Arc::new(filter)];
    }

    pub fn add_filter(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Install a trace hook; `None` installs the stdout hook.
    pub fn enable_trace(&mut self, hook: Option<TraceFn>) {
        self.trace = Some(hook.unwrap_or_else(stdout_trace));
    }

    pub fn disable_trace(&mut self) {
        self.trace = None;
    }

    /// Handle a decoded request or batch. Always yields a reply value: a
    /// single response object, or an array for a non-empty batch.
    pub async fn handle(&self, props: Props, request: Value) -> Value {
        self.emit_trace("Request", &request);

        let reply = match request {
            Value::Array(items) if items.is_empty() => envelope_value(&Response::error(
                Value::Null,
                ErrorObject::new(error_code::INVALID_REQUEST, "Request contains empty batch"),
            )),
            Value::Array(items) => {
                debug!(size = items.len(), "Dispatching batch");
                let mut pending: FuturesUnordered<_> = items
                    .into_iter()
                    .map(|item| self.handle_single(&props, item))
                    .collect();
                let mut responses = Vec::with_capacity(pending.len());
                while let Some(response) = pending.next().await {
                    responses.push(envelope_value(&response));
                }
                Value::Array(responses)
            }
            single => envelope_value(&self.handle_single(&props, single).await),
        };

        self.emit_trace("Response", &reply);
        reply
    }

    /// Handle an encoded request body and return the encoded reply.
    pub async fn handle_json(&self, props: Props, body: &str) -> String {
        let reply = match serde_json::from_str::<Value>(body) {
            Ok(request) => self.handle(props, request).await,
            Err(e) => {
                debug!(error = %e, "Rejected unparsable request body");
                envelope_value(&Response::error(
                    Value::Null,
                    ErrorObject::new(
                        error_code::PARSE_ERROR,
                        format!("Unable to parse JSON: {}", body),
                    ),
                ))
            }
        };

        to_ascii_string(&reply).unwrap_or_else(|e| {
            error!(error = %e, "Failed to encode reply");
            ENCODE_FAILURE.to_string()
        })
    }

    async fn handle_single(&self, props: &Props, raw: Value) -> Response {
        let request = match Request::from_value(raw) {
            Ok(request) => request,
            Err(response) => return response,
        };

        let mut ctx = FilterContext::new(props.clone(), request);
        for filter in &self.filters {
            filter.pre(&mut ctx);
            if ctx.is_rejected() {
                break;
            }
        }
        if let Some(err) = ctx.error.take() {
            warn!(method = %ctx.request.method, code = err.code, "Request rejected by filter");
            return Response::error(ctx.request.id.clone(), err);
        }

        let response = match self.dispatch(&mut ctx.request).await {
            Ok(response) => response,
            Err(rejected) => return rejected,
        };

        ctx.response = Some(response);
        for filter in &self.filters {
            filter.post(&mut ctx);
        }
        let response = match (ctx.error.take(), ctx.response.take()) {
            (Some(err), _) => Response::error(ctx.request.id.clone(), err),
            (None, Some(response)) => response,
            (None, None) => Response::error(
                ctx.request.id.clone(),
                ErrorObject::new(error_code::INTERNAL_ERROR, "Filter discarded the response"),
            ),
        };

        if self.config.validate_responses {
            self.contract.validate_response(&ctx.request, response)
        } else {
            response
        }
    }

    /// Resolve, validate and invoke. `Err` carries a response that must
    /// bypass the post filters.
    async fn dispatch(&self, request: &mut Request) -> Result<Response, Response> {
        if request.method == IDL_METHOD {
            return Ok(Response::success(
                request.id.clone(),
                self.contract.idl().clone(),
            ));
        }

        let entry = self
            .resolve(&request.method)
            .ok_or_else(|| method_not_found(request))?;

        if let Err(err) = self.contract.validate_request(request) {
            debug!(method = %request.method, error = %err, "Invalid request");
            return Err(Response::error(request.id.clone(), err));
        }

        debug!(method = %request.method, "Invoking handler");
        let (done, rx) = completion();
        entry(request.params.clone(), done).await;

        let outcome = match rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(method = %request.method, "Handler dropped its completion signal");
                Err(HandlerError::coded(
                    error_code::INTERNAL_ERROR,
                    format!("Handler for {} did not complete", request.method),
                ))
            }
        };

        Ok(match outcome {
            Ok(result) => Response::success(request.id.clone(), result),
            Err(err) => {
                let err = to_error_object(err);
                debug!(method = %request.method, code = err.code, "Handler returned error");
                Response::error(request.id.clone(), err)
            }
        })
    }

    fn resolve(&self, method: &str) -> Option<HandlerFn> {
        let (interface, function) = method.split_once('.')?;
        self.contract.interface(interface)?;
        self.contract.function(method)?;
        self.handlers.get(interface)?.get(function).cloned()
    }

    fn emit_trace(&self, label: &str, value: &Value) {
        if let Some(trace) = &self.trace {
            let line = to_ascii_string(value).unwrap_or_else(|_| value.to_string());
            trace(&format!("{}: {}", label, line));
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("contract", &self.contract)
            .field("handlers", &self.handlers)
            .field("filters", &self.filters.len())
            .field("trace", &self.trace.is_some())
            .field("config", &self.config)
            .finish()
    }
}

fn method_not_found(request: &Request) -> Response {
    Response::error(
        request.id.clone(),
        ErrorObject::new(
            error_code::METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ),
    )
}

fn envelope_value(response: &Response) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
