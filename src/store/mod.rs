//! Store gateway: the key-value capability the configuration core consumes.
//!
//! This module provides:
//! - The `StoreGateway` trait (get, prefix get, watch, put, delete)
//! - `BoundedStore`, a decorator applying a uniform per-call timeout
//! - `MemoryStore`, an in-process gateway with fault injection
//!
//! Gateways are assumed linearizable per key and deliver watch events for a
//! key in commit order.

mod bounded;
mod memory;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error_handling::{ConfigError, Result};

pub use bounded::BoundedStore;
pub use memory::{FaultInjector, MemoryStore};

/// Kind of change delivered on a watch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// Key created or updated
    Put,
    /// Key removed
    Delete,
}

/// A single change of a watched key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// What happened to the key
    pub kind: WatchEventKind,
    /// Key that changed
    pub key: String,
    /// New value (empty for deletes)
    pub value: Vec<u8>,
}

impl WatchEvent {
    /// Creates a put event.
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        WatchEvent {
            kind: WatchEventKind::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a delete event.
    pub fn delete(key: impl Into<String>) -> Self {
        WatchEvent {
            kind: WatchEventKind::Delete,
            key: key.into(),
            value: Vec::new(),
        }
    }
}

/// Stream of changes for one key. Closed (yields `None`) when the gateway
/// drops the subscription; callers re-subscribe.
pub type WatchStream = mpsc::Receiver<WatchEvent>;

/// A stored key and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Key
    pub key: String,
    /// Raw value
    pub value: Vec<u8>,
}

/// Key ordering of prefix reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending by key
    Ascend,
    /// Descending by key
    Descend,
}

/// Capability interface of a watchable key-value store.
///
/// Every call is expected to be time-bounded by the gateway itself (see
/// `BoundedStore`) and to classify its failures as `ConfigError`:
/// `NotFound` for an absent key, `StoreUnavailable` for anything transport
/// related.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Reads one key.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Reads every key starting with `prefix`, sorted by key.
    async fn get_by_prefix(&self, prefix: &str, order: SortOrder) -> Result<Vec<KeyValue>>;

    /// Subscribes to changes of exactly `key`, starting after the current revision.
    async fn watch(&self, key: &str) -> Result<WatchStream>;

    /// Writes one key.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Removes one key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Prefix read in descending key order.
    async fn get_by_prefix_desc(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        self.get_by_prefix(prefix, SortOrder::Descend).await
    }

    /// The entry with the greatest key under `prefix`.
    async fn get_one_by_prefix(&self, prefix: &str) -> Result<KeyValue> {
        self.get_by_prefix(prefix, SortOrder::Descend)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ConfigError::NotFound {
                key: prefix.to_string(),
            })
    }

    /// The greatest key under `prefix`.
    async fn get_one_key_by_prefix(&self, prefix: &str) -> Result<String> {
        self.get_one_by_prefix(prefix).await.map(|kv| kv.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_one_by_prefix_returns_greatest_key() {
        let store = MemoryStore::new();
        store.put("service.config.billing.1", b"a").await.unwrap();
        store.put("service.config.billing.3", b"c").await.unwrap();
        store.put("service.config.billing.2", b"b").await.unwrap();
        store.put("service.config.other.9", b"z").await.unwrap();

        let kv = store
            .get_one_by_prefix("service.config.billing.")
            .await
            .unwrap();
        assert_eq!(kv.key, "service.config.billing.3");
        assert_eq!(kv.value, b"c".to_vec());

        let key = store
            .get_one_key_by_prefix("service.config.billing.")
            .await
            .unwrap();
        assert_eq!(key, "service.config.billing.3");
    }

    #[tokio::test]
    async fn test_get_one_by_prefix_missing_prefix_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_one_by_prefix("service.config.none.").await.unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotFound {
                key: "service.config.none.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_get_by_prefix_desc_orders_descending() {
        let store = MemoryStore::new();
        for key in ["p.a", "p.c", "p.b"] {
            store.put(key, key.as_bytes()).await.unwrap();
        }
        let keys: Vec<String> = store
            .get_by_prefix_desc("p.")
            .await
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["p.c", "p.b", "p.a"]);
    }
}
