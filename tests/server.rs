//! Live-socket tests for the demo server.

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use httplog::http::HttpServer;
use httplog::observability::Level;
use httplog::Options;

mod common;

use common::Harness;

/// Wait until the backend has seen `count` records; flushes happen after the body is sent.
async fn wait_for_records(harness: &Harness, count: usize) {
    for _ in 0..50 {
        if harness.records().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_demo_server_over_tcp() {
    let harness = Harness::new(Options {
        name: "demo".into(),
        ..Default::default()
    });
    let logger = harness.httplog.new_logger(None);
    let server = HttpServer::new(&harness.httplog, logger);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let _ = server
            .run_until(listener, async move {
                let _ = stop_rx.await;
            })
            .await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/users/7"))
        .header("authorization", "Bearer secret-token")
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<serde_json::Value>().await.unwrap(), json!({"id": 7}));

    let res = client
        .get(format!("http://{addr}/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "not found");

    let res = client
        .get(format!("http://{addr}/panic"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    wait_for_records(&harness, 3).await;
    let records = harness.records();
    assert_eq!(records.len(), 3);

    let user = records.iter().find(|r| r.message == "200 OK").unwrap();
    assert_eq!(user.field("userID"), Some(&json!(7)));
    assert_eq!(user.field("authorization"), Some(&json!("***")));
    assert!(user
        .field("remoteIP")
        .unwrap()
        .as_str()
        .unwrap()
        .starts_with("127.0.0.1:"));
    assert!(!format!("{records:?}").contains("secret-token"));

    let missing = records
        .iter()
        .find(|r| r.message == "404 Client Error")
        .unwrap();
    assert_eq!(missing.level, Level::Warn);
    assert_eq!(missing.field("responseBody"), Some(&json!("not found")));

    let panicked = records
        .iter()
        .find(|r| r.message.starts_with("500 Server Error"))
        .unwrap();
    assert_eq!(panicked.message, "500 Server Error - handler exploded");
    assert_eq!(panicked.level, Level::Error);

    let _ = stop_tx.send(());
    let _ = handle.await;
}
