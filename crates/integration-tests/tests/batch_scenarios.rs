//! Batch behaviour across client and server

mod common;

use barrister_core::protocol::{error_code, Props};
use common::{connected, fixture};
use serde_json::{json, Value};

/// Invalid entries are answered locally; the rest make one round trip
#[tokio::test]
async fn test_mixed_validity_batch() -> anyhow::Result<()> {
    let (client, transport) = connected(fixture().server).await?;

    let mut batch = client.batch();
    let mut calc = batch.proxy("Calc")?;
    calc.call("add", vec![json!(1), json!(2)])?;
    calc.call("add", vec![json!(3), json!("x")])?;
    let results = batch.send().await?;

    assert_eq!(transport.sends(), 2, "IDL fetch plus one batch");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].result(), Some(&json!(3)));
    let err = results[1].error().expect("second entry rejected");
    assert_eq!(err.code, error_code::INVALID_PARAMS);
    assert!(err.message.starts_with("Invalid request param[1]"));
    Ok(())
}

/// Nothing valid to send means no round trip at all
#[tokio::test]
async fn test_fully_invalid_batch_stays_local() -> anyhow::Result<()> {
    let (client, transport) = connected(fixture().server).await?;

    let mut batch = client.batch();
    batch.request("Calc.add", vec![json!(3), json!("x")]);
    batch.request("Calc.nope", vec![]);
    let results = batch.send().await?;

    assert_eq!(transport.sends(), 1);
    assert!(results.iter().all(|r| !r.is_ok()));
    Ok(())
}

/// The server answers slow calls last; the client restores enqueue order
#[tokio::test]
async fn test_completion_order_is_undone_by_correlation() -> anyhow::Result<()> {
    let fixture = fixture();

    let request = |id: &str, ms: u64| {
        json!({"jsonrpc": "2.0", "id": id, "method": "Calc.slow", "params": [ms]})
    };
    let raw = fixture
        .server
        .handle(Props::new(), json!([request("a", 80), request("b", 1), request("c", 40)]))
        .await;
    let server_order: Vec<&str> = raw
        .as_array()
        .expect("batch reply")
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(server_order, vec!["b", "c", "a"]);

    let (client, _) = connected(fixture.server.clone()).await?;
    let mut batch = client.batch();
    for ms in [80, 1, 40] {
        batch.request("Calc.slow", vec![json!(ms)]);
    }
    let results: Vec<Value> = batch
        .send()
        .await?
        .into_iter()
        .map(|r| r.outcome.expect("slow call succeeds"))
        .collect();
    assert_eq!(results, vec![json!(80), json!(1), json!(40)]);
    Ok(())
}

/// Server-side failures stay attached to their own entries
#[tokio::test]
async fn test_server_errors_inside_batch() -> anyhow::Result<()> {
    let (client, _) = connected(fixture().server).await?;

    let mut batch = client.batch();
    batch.request("Catalog.count", vec![]);
    batch.request("Catalog.locked", vec![]);
    batch.request("Admin.delete", vec![json!("p-1")]);
    batch.request("Catalog.broken", vec![]);
    let results = batch.send().await?;

    let summary: Vec<Result<Value, i64>> = results
        .into_iter()
        .map(|r| r.outcome.map_err(|e| e.code))
        .collect();
    assert_eq!(
        summary,
        vec![
            Ok(json!(42)),
            Err(error_code::SERVER_ERROR),
            Err(403),
            Err(error_code::INVALID_RESPONSE),
        ]
    );
    Ok(())
}

/// Raw bodies: empty batch and junk text
#[tokio::test]
async fn test_raw_body_edge_cases() -> anyhow::Result<()> {
    let server = fixture().server;

    let reply: Value = serde_json::from_str(&server.handle_json(Props::new(), "[]").await)?;
    assert!(reply.is_object(), "empty batch yields one envelope, not an array");
    assert_eq!(reply["error"]["code"], error_code::INVALID_REQUEST);

    let reply: Value = serde_json::from_str(&server.handle_json(Props::new(), "[1, {}]").await)?;
    let codes: Vec<i64> = reply
        .as_array()
        .expect("batch reply")
        .iter()
        .filter_map(|r| r["error"]["code"].as_i64())
        .collect();
    assert_eq!(codes, vec![error_code::INVALID_REQUEST, error_code::INVALID_REQUEST]);

    let reply: Value = serde_json::from_str(&server.handle_json(Props::new(), "{\"jsonrpc\":").await)?;
    assert_eq!(reply["error"]["code"], error_code::PARSE_ERROR);
    Ok(())
}

/// An empty client batch makes no round trip
#[tokio::test]
async fn test_empty_client_batch() -> anyhow::Result<()> {
    let (client, transport) = connected(fixture().server).await?;

    let results = client.batch().send().await?;
    assert!(results.is_empty());
    assert_eq!(transport.sends(), 1);
    Ok(())
}
