// Shared test helpers for seeding a store and observing watch callbacks.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::time::Duration;

use service_config::{MemoryStore, StoreGateway};
use tokio::sync::mpsc;

/// How long a test waits for something the watch loop should do promptly.
#[allow(dead_code)]
pub const WAIT: Duration = Duration::from_secs(5);

/// Descriptor JSON with the given production version and fixed other lines.
#[allow(dead_code)]
pub fn descriptor(pro: i64) -> String {
    format!(
        r#"{{"type":"api","summary":"test service","currentVersion":{{"dev":1,"test":2,"pre":0,"pro":{}}}}}"#,
        pro
    )
}

/// Versioned record JSON wrapping `content`.
#[allow(dead_code)]
pub fn record(content: &str) -> String {
    serde_json::json!({
        "content": content,
        "createTime": "2024-05-01 10:00:00",
        "createUser": "release-bot",
        "updateTime": "2024-05-01 10:05:00",
    })
    .to_string()
}

/// Publishes the record of `service` at `version`.
#[allow(dead_code)]
pub async fn publish_version(store: &MemoryStore, service: &str, version: i64, content: &str) {
    store
        .put(
            &format!("service.config.{}.{}", service, version),
            record(content).as_bytes(),
        )
        .await
        .expect("Failed to publish version");
}

/// Points the production line of `service` at `pro`.
#[allow(dead_code)]
pub async fn set_production_version(store: &MemoryStore, service: &str, pro: i64) {
    store
        .put(
            &format!("service.info.{}", service),
            descriptor(pro).as_bytes(),
        )
        .await
        .expect("Failed to write descriptor");
}

/// Blocks until `count` watch subscriptions are live.
#[allow(dead_code)]
pub async fn wait_for_watchers(store: &MemoryStore, count: usize) {
    tokio::time::timeout(WAIT, async {
        while store.watcher_count().await != count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("watch subscription was not established in time");
}

/// Action that forwards every content to a channel, plus the receiving end.
#[allow(dead_code)]
pub fn recording_action() -> (
    impl FnMut(String) + Send + 'static,
    mpsc::UnboundedReceiver<String>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let action = move |content: String| {
        let _ = tx.send(content);
    };
    (action, rx)
}

/// Next content handed to a recording action.
#[allow(dead_code)]
pub async fn next_content(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("action was not invoked in time")
        .expect("action channel closed")
}

/// Asserts no further content arrives within a short grace period.
#[allow(dead_code)]
pub async fn assert_no_more_content(rx: &mut mpsc::UnboundedReceiver<String>) {
    let extra = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(extra.is_err(), "unexpected extra action call: {:?}", extra);
}
