//! Shared fixtures: a small catalogue service served in-process

#![allow(dead_code)]

use async_trait::async_trait;
use barrister_api_rpc::{Filter, FilterContext, InProcessTransport, InterfaceHandler, Server};
use barrister_core::port::{Transport, TransportError, TransportReply};
use barrister_sdk::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn spec(name: &str, type_name: &str, is_array: bool, optional: bool) -> Value {
    json!({"name": name, "type": type_name, "is_array": is_array, "optional": optional})
}

pub fn idl() -> Value {
    json!([
        {"type": "enum", "name": "Status", "values": [{"value": "ACTIVE"}, {"value": "RETIRED"}]},
        {"type": "struct", "name": "Entity", "extends": "", "fields": [spec("id", "string", false, false)]},
        {"type": "struct", "name": "Product", "extends": "Entity", "fields": [
            spec("title", "string", false, false),
            spec("price", "float", false, false),
            spec("tags", "string", true, false),
            spec("status", "Status", false, false),
            spec("note", "string", false, true)
        ]},
        {"type": "interface", "name": "Catalog", "functions": [
            {"name": "get", "params": [spec("id", "string", false, false)],
             "returns": spec("", "Product", false, true)},
            {"name": "save", "params": [spec("product", "Product", false, false)],
             "returns": spec("", "Product", false, false)},
            {"name": "count", "params": [], "returns": spec("", "int", false, false)},
            {"name": "broken", "params": [], "returns": spec("", "int", false, false)},
            {"name": "locked", "params": [], "returns": spec("", "bool", false, false)}
        ]},
        {"type": "interface", "name": "Calc", "functions": [
            {"name": "add", "params": [spec("a", "int", false, false), spec("b", "int", false, false)],
             "returns": spec("", "int", false, false)},
            {"name": "slow", "params": [spec("ms", "int", false, false)],
             "returns": spec("", "int", false, false)}
        ]},
        {"type": "interface", "name": "Admin", "functions": [
            {"name": "delete", "params": [spec("id", "string", false, false)],
             "returns": spec("", "bool", false, false)}
        ]},
        {"type": "meta", "barrister_version": "0.1.6", "date_generated": 1700000000000_i64}
    ])
}

pub fn product(id: &str) -> Value {
    json!({
        "id": id,
        "title": "Caf\u{e9} au lait \u{2615}",
        "price": 3.5,
        "tags": ["drink", "hot"],
        "status": "ACTIVE"
    })
}

/// Rejects `Admin.*` unless the caller's props carry `role: admin`.
pub struct AdminOnly;

impl Filter for AdminOnly {
    fn pre(&self, ctx: &mut FilterContext) {
        let admin = ctx.props.get("role").and_then(Value::as_str) == Some("admin");
        if ctx.request.method.starts_with("Admin.") && !admin {
            ctx.reject(403, "Forbidden");
        }
    }
}

pub struct Fixture {
    pub server: Arc<Server>,
    pub deletes: Arc<AtomicUsize>,
}

/// Route `tracing` output through the test harness. `RUST_LOG` picks the
/// level; `BARRISTER_LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("barrister=warn"))
        .unwrap_or_default();
    let json = std::env::var("BARRISTER_LOG_FORMAT").as_deref() == Ok("json");

    // Several tests share one process; only the first install wins
    let _ = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_test_writer())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_test_writer())
            .try_init()
    };
}

pub fn fixture() -> Fixture {
    init_logging();
    let deletes = Arc::new(AtomicUsize::new(0));
    let mut server = Server::new(idl()).expect("valid IDL");

    server.add_handler(
        "Catalog",
        InterfaceHandler::new()
            .function("get", |params, done| match params[0].as_str() {
                Some("missing") => done.ok(Value::Null),
                Some(id) => done.ok(product(id)),
                None => done.fail("id must be a string"),
            })
            .function("save", |params, done| done.ok(params[0].clone()))
            .function("count", |_params, done| done.ok(json!(42)))
            .function("broken", |_params, done| done.ok(json!(1.5)))
            .function("locked", |_params, done| done.fail("permission denied")),
    );
    server.add_handler(
        "Calc",
        InterfaceHandler::new()
            .function("add", |params, done| {
                done.ok(json!(params.iter().filter_map(Value::as_i64).sum::<i64>()))
            })
            .async_function("slow", |params| async move {
                let ms = params[0].as_u64().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(json!(ms))
            }),
    );
    let counter = deletes.clone();
    server.add_handler(
        "Admin",
        InterfaceHandler::new().function("delete", move |_params, done| {
            counter.fetch_add(1, Ordering::SeqCst);
            done.ok(json!(true));
        }),
    );
    server.set_filter(AdminOnly);

    Fixture {
        server: Arc::new(server),
        deletes,
    }
}

/// Counts how many payloads reach the wrapped transport.
pub struct Counting<T> {
    pub inner: T,
    pub sends: AtomicUsize,
}

impl<T> Counting<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            sends: AtomicUsize::new(0),
        }
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Transport> Transport for Counting<T> {
    async fn send(&self, payload: Value) -> Result<TransportReply, TransportError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.inner.send(payload).await
    }
}

pub async fn connected(server: Arc<Server>) -> anyhow::Result<(Client, Arc<Counting<InProcessTransport>>)> {
    let transport = Arc::new(Counting::new(InProcessTransport::new(server)));
    let client = Client::new(transport.clone());
    client.load_contract().await?;
    Ok((client, transport))
}
