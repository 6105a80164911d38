//! Interface Handlers
//!
//! A handler receives the positional params and a one-shot completion
//! signal. Sync functions call the signal inline; async functions resolve
//! it when their future finishes.

use crate::error::HandlerError;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Outcome a handler reports
pub type HandlerResult = Result<Value, HandlerError>;

/// Type-erased handler entry point
pub type HandlerFn = Arc<dyn Fn(Vec<Value>, Completion) -> BoxFuture<'static, ()> + Send + Sync>;

/// Completion signal handed to each handler invocation.
///
/// Consumed on use, so a handler can fire it at most once. Dropping it
/// unfired is reported as an internal error by the server.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<HandlerResult>,
}

impl Completion {
    pub fn complete(self, outcome: HandlerResult) {
        // Receiver is gone only when the dispatching request was dropped
        let _ = self.tx.send(outcome);
    }

    pub fn ok(self, result: Value) {
        self.complete(Ok(result))
    }

    pub fn fail(self, err: impl Into<HandlerError>) {
        self.complete(Err(err.into()))
    }
}

pub(crate) fn completion() -> (Completion, oneshot::Receiver<HandlerResult>) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, rx)
}

/// Functions implementing one IDL interface, keyed by function name.
#[derive(Clone, Default)]
pub struct InterfaceHandler {
    functions: HashMap<String, HandlerFn>,
}

impl InterfaceHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback-style function.
    pub fn function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>, Completion) + Send + Sync + 'static,
    {
        let entry: HandlerFn = Arc::new(move |params, done| {
            f(params, done);
            future::ready(()).boxed()
        });
        self.functions.insert(name.into(), entry);
        self
    }

    /// Register a function whose future yields the outcome.
    pub fn async_function<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let entry: HandlerFn = Arc::new(move |params, done| {
            let fut = f(params);
            async move { done.complete(fut.await) }.boxed()
        });
        self.functions.insert(name.into(), entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HandlerFn> {
        self.functions.get(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for InterfaceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.function_names().collect();
        names.sort_unstable();
        f.debug_struct("InterfaceHandler")
            .field("functions", &names)
            .finish()
    }
}
