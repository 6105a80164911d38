//! Simple example of using the Barrister SDK against an in-process server
//!
//! Run with: cargo run --example simple -p barrister-sdk

use barrister_api_rpc::{InProcessTransport, InterfaceHandler, Server};
use barrister_sdk::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn idl() -> Value {
    let int = |name: &str| json!({"name": name, "type": "int", "is_array": false, "optional": false});
    json!([
        {"type": "interface", "name": "Calc", "functions": [
            {"name": "add", "params": [int("a"), int("b")], "returns": int("")}
        ]}
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().pretty())
        .init();

    let mut server = Server::new(idl())?;
    server.add_handler(
        "Calc",
        InterfaceHandler::new().function("add", |params, done| {
            done.ok(json!(params.iter().filter_map(Value::as_i64).sum::<i64>()))
        }),
    );

    let transport = Arc::new(InProcessTransport::new(Arc::new(server)));
    let client = Client::new(transport);
    client.enable_trace(None);
    client.load_contract().await?;

    // Single call
    let calc = client.proxy("Calc")?;
    let sum = calc.call("add", vec![json!(40), json!(2)]).await?;
    println!("40 + 2 = {}", sum);

    // Batch, with one call rejected locally
    let mut batch = client.batch();
    batch.request("Calc.add", vec![json!(1), json!(2)]);
    batch.request("Calc.add", vec![json!(3), json!("x")]);
    for entry in batch.send().await? {
        match entry.outcome {
            Ok(result) => println!("{} {:?} -> {}", entry.method, entry.params, result),
            Err(err) => println!("{} {:?} failed: {}", entry.method, entry.params, err),
        }
    }

    Ok(())
}
