//! Barrister SDK - Rust Client Library
//!
//! Calls services described by a Barrister IDL over any [`Transport`].
//! The contract is fetched from the server once, after which requests are
//! validated locally before they are sent.
//!
//! # Example
//!
//! ```no_run
//! use barrister_sdk::Client;
//! use barrister_core::port::Transport;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! async fn run(transport: Arc<dyn Transport>) -> barrister_sdk::Result<()> {
//!     let client = Client::new(transport);
//!     client.load_contract().await?;
//!
//!     // Several calls in one round trip
//!     let mut batch = client.batch();
//!     batch.request("Calc.add", vec![json!(1), json!(2)]);
//!     batch.request("Calc.add", vec![json!(3), json!(4)]);
//!     for entry in batch.send().await? {
//!         println!("{} -> {:?}", entry.method, entry.outcome);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! [`Transport`]: barrister_core::port::Transport

mod batch;
mod client;
mod deferred;
mod error;
mod types;


pub use batch::{Batch, BatchProxy};
pub use client::{stdout_trace, Client, Proxy, TraceFn};
pub use deferred::{Deferred, DeferredState, Resolver};
pub use error::{Result, SdkError};
pub use types::{BatchResult, ClientOptions};
