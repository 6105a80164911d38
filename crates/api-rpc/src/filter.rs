//! Request Filters
//!
//! Filters run around every dispatched request. `pre` hooks run in
//! registration order before the handler and may reject the request;
//! `post` hooks run in the same order after the handler and may rewrite
//! the response.

use barrister_core::protocol::{ErrorObject, Props, Request, Response};

/// Per-request state shared by the filter chain.
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Caller-supplied properties (auth headers, peer info, ...)
    pub props: Props,
    pub request: Request,
    /// Set once the handler has completed; `None` during `pre`
    pub response: Option<Response>,
    /// Setting this in `pre` skips the handler entirely
    pub error: Option<ErrorObject>,
}

impl FilterContext {
    pub fn new(props: Props, request: Request) -> Self {
        Self {
            props,
            request,
            response: None,
            error: None,
        }
    }

    pub fn reject(&mut self, code: i64, message: impl Into<String>) {
        self.error = Some(ErrorObject::new(code, message));
    }

    pub fn is_rejected(&self) -> bool {
        self.error.is_some()
    }
}

pub trait Filter: Send + Sync {
    fn pre(&self, _ctx: &mut FilterContext) {}

    fn post(&self, _ctx: &mut FilterContext) {}
}
