//! Barrister RPC Server
//!
//! Serves interfaces declared in a Barrister IDL over JSON-RPC 2.0.
//! Transport agnostic: callers feed decoded values or raw bodies to
//! [`Server::handle`] / [`Server::handle_json`].

pub mod error;
pub mod filter;
pub mod handler;
pub mod inproc;
pub mod server;


pub use error::{to_error_object, HandlerError};
pub use filter::{Filter, FilterContext};
pub use handler::{Completion, HandlerFn, HandlerResult, InterfaceHandler};
pub use inproc::InProcessTransport;
pub use server::{stdout_trace, Server, ServerConfig, TraceFn};
