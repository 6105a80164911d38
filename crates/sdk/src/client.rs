//! Barrister Client Implementation

use crate::batch::Batch;
use crate::deferred::Deferred;
use crate::error::{Result, SdkError};
use crate::types::ClientOptions;
use barrister_core::contract::{Coercer, Contract, DefaultCoercer};
use barrister_core::port::{IdProvider, RandomIdProvider, Transport};
use barrister_core::protocol::{
    parse_response, to_ascii_string, ErrorObject, Request, Response, IDL_METHOD,
};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Receives one trace line per request and response.
pub type TraceFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Trace hook that prints each line to stdout.
pub fn stdout_trace() -> TraceFn {
    Arc::new(|line| println!("{}", line))
}

/// Barrister Client
///
/// Cheap to clone; clones share the transport and the loaded contract.
///
/// # Example
///
/// ```no_run
/// # use barrister_sdk::Client;
/// # use barrister_core::port::Transport;
/// # use serde_json::json;
/// # use std::sync::Arc;
/// # async fn example(transport: Arc<dyn Transport>) -> barrister_sdk::Result<()> {
/// let client = Client::new(transport);
/// client.load_contract().await?;
///
/// let calc = client.proxy("Calc")?;
/// let sum = calc.call("add", vec![json!(1), json!(2)]).await?;
/// assert_eq!(sum, json!(3));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    contract: Arc<RwLock<Option<Arc<Contract>>>>,
    coercer: Option<Arc<dyn Coercer>>,
    ids: Arc<dyn IdProvider>,
    /// Shared so proxies and batches follow `enable_trace`/`disable_trace`
    trace: Arc<RwLock<Option<TraceFn>>>,
    options: ClientOptions,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_options(transport, ClientOptions::default())
    }

    pub fn with_options(transport: Arc<dyn Transport>, options: ClientOptions) -> Self {
        let coercer: Option<Arc<dyn Coercer>> = if options.coerce {
            Some(Arc::new(DefaultCoercer))
        } else {
            None
        };

        Self {
            transport,
            contract: Arc::new(RwLock::new(None)),
            coercer,
            ids: Arc::new(RandomIdProvider::default()),
            trace: Arc::new(RwLock::new(options.trace.then(stdout_trace))),
            options,
        }
    }

    /// Coercer applied to the contract on the next `load_contract`.
    pub fn with_coercer(mut self, coercer: Arc<dyn Coercer>) -> Self {
        self.coercer = Some(coercer);
        self
    }

    pub fn with_id_provider(mut self, ids: Arc<dyn IdProvider>) -> Self {
        self.ids = ids;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Install a trace hook; `None` installs the stdout hook. Applies to
    /// every clone, proxy and batch of this client.
    pub fn enable_trace(&self, hook: Option<TraceFn>) {
        *self.trace.write().unwrap_or_else(PoisonError::into_inner) =
            Some(hook.unwrap_or_else(stdout_trace));
    }

    pub fn disable_trace(&self) {
        *self.trace.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn trace_hook(&self) -> Option<TraceFn> {
        self.trace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch the IDL from the server and build the contract from it.
    pub async fn load_contract(&self) -> Result<Arc<Contract>> {
        let idl = self.request(IDL_METHOD, Vec::new()).await?;
        let mut contract = Contract::new(idl)?;
        if let Some(coercer) = &self.coercer {
            contract = contract.with_coercer(coercer.clone());
        }

        let contract = Arc::new(contract);
        info!(interfaces = contract.interface_names().count(), "Contract loaded");
        *self
            .contract
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(contract.clone());
        Ok(contract)
    }

    pub fn contract(&self) -> Option<Arc<Contract>> {
        self.contract
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `meta` entries of the loaded IDL
    pub fn meta(&self) -> Result<Map<String, Value>> {
        self.contract()
            .map(|c| c.meta().clone())
            .ok_or(SdkError::ContractNotLoaded)
    }

    pub fn proxy(&self, interface: &str) -> Result<Proxy> {
        let contract = self.contract().ok_or(SdkError::ContractNotLoaded)?;
        let iface = contract
            .interface(interface)
            .ok_or_else(|| SdkError::InterfaceNotFound(interface.to_string()))?;

        Ok(Proxy {
            client: self.clone(),
            interface: iface.name.clone(),
            functions: iface.functions.iter().map(|f| f.name.clone()).collect(),
        })
    }

    /// Call `method` and return its result.
    pub async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let mut request = Request::new(self.ids.generate_id(), method, params);
        self.prevalidate(&mut request)?;

        let response = self.send_one(&request).await?;
        Ok(response.into_outcome()?)
    }

    pub fn batch(&self) -> Batch {
        Batch::new(self.clone())
    }

    pub(crate) fn next_request(&self, method: &str, params: Vec<Value>) -> Request {
        Request::new(self.ids.generate_id(), method, params)
    }

    /// Local check against the loaded contract. Passes when validation is
    /// off or no contract is loaded yet. May coerce params in place.
    pub(crate) fn prevalidate(&self, request: &mut Request) -> std::result::Result<(), ErrorObject> {
        if !self.options.validate_request {
            return Ok(());
        }
        match self.contract() {
            Some(contract) => contract.validate_request(request),
            None => Ok(()),
        }
    }

    async fn send_one(&self, request: &Request) -> Result<Response> {
        let payload = serde_json::to_value(request)?;
        let reply = self.exchange(&request.id, payload).await;
        Ok(Response::from_value(reply).unwrap_or_else(|err| Response::error(request.id.clone(), err)))
    }

    /// Send a payload and normalise whatever comes back into a JSON value.
    pub(crate) async fn exchange(&self, request_id: &Value, payload: Value) -> Value {
        self.emit_trace("Request", &payload);
        debug!(id = %request_id, "Sending request");

        let reply = parse_response(request_id, self.transport.send(payload).await);

        self.emit_trace("Response", &reply);
        reply
    }

    fn emit_trace(&self, label: &str, value: &Value) {
        if let Some(trace) = self.trace_hook() {
            let line = to_ascii_string(value).unwrap_or_else(|_| value.to_string());
            trace(&format!("{}: {}", label, line));
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("contract_loaded", &self.contract().is_some())
            .field("trace", &self.trace_hook().is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Callable view of one interface, created by [`Client::proxy`].
#[derive(Debug, Clone)]
pub struct Proxy {
    client: Client,
    interface: String,
    functions: Vec<String>,
}

impl Proxy {
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Function names in IDL order
    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    pub async fn call(&self, function: &str, params: Vec<Value>) -> Result<Value> {
        let method = self.method(function)?;
        self.client.request(&method, params).await
    }

    /// Call in a background task, delivering the outcome to `callback`.
    /// Must be called within a tokio runtime.
    pub fn call_with<F>(&self, function: &str, params: Vec<Value>, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let proxy = self.clone();
        let function = function.to_string();
        tokio::spawn(async move {
            callback(proxy.call(&function, params).await);
        });
    }

    /// Call in a background task, returning a [`Deferred`] for the outcome.
    /// Must be called within a tokio runtime.
    pub fn invoke(&self, function: &str, params: Vec<Value>) -> Deferred {
        let (deferred, resolver) = Deferred::pending();
        self.call_with(function, params, move |outcome| resolver.settle(outcome));
        deferred
    }

    pub(crate) fn method(&self, function: &str) -> Result<String> {
        if self.functions.iter().any(|f| f == function) {
            Ok(format!("{}.{}", self.interface, function))
        } else {
            Err(SdkError::FunctionNotFound(format!(
                "{}.{}",
                self.interface, function
            )))
        }
    }
}
