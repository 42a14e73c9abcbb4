//! In-process store gateway.
//!
//! Backs the CLI and the test suites. Values live in a `BTreeMap` so prefix
//! reads come out sorted; watchers are bounded channels notified while the
//! write lock is held, which keeps per-key delivery in commit order.
//!
//! Fault injection mirrors what a real cluster does to a client: the whole
//! store can go unavailable, individual reads can fail, subscriptions can be
//! refused and open watch streams can be cut.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock};

use super::{KeyValue, SortOrder, StoreGateway, WatchEvent, WatchStream};
use crate::config::WATCH_CHANNEL_CAPACITY;
use crate::error_handling::{ConfigError, Result};

/// Switches for simulating store failures.
#[derive(Debug, Default)]
pub struct FaultInjector {
    unavailable: AtomicBool,
    fail_gets: AtomicU32,
    reject_watches: AtomicU32,
    latency_ms: AtomicU64,
}

impl FaultInjector {
    /// Makes every call fail with `StoreUnavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fails the next `count` reads with `StoreUnavailable`.
    pub fn fail_gets(&self, count: u32) {
        self.fail_gets.store(count, Ordering::SeqCst);
    }

    /// Refuses the next `count` watch subscriptions.
    pub fn reject_watches(&self, count: u32) {
        self.reject_watches.store(count, Ordering::SeqCst);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::SeqCst)
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms.load(Ordering::SeqCst))
    }

    /// Consumes one unit of a countdown; true when a failure is due.
    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

struct Watcher {
    key: String,
    sender: mpsc::Sender<WatchEvent>,
}

/// In-memory `StoreGateway`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    watchers: Arc<Mutex<Vec<Watcher>>>,
    faults: Arc<FaultInjector>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        MemoryStore {
            data: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// Fault injection controller shared by all clones of this store.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Drops every open watch stream; subscribers see their stream end.
    pub async fn close_watch_streams(&self) {
        let mut watchers = self.watchers.lock().await;
        log::debug!("Closing {} watch stream(s)", watchers.len());
        watchers.clear();
    }

    /// Number of live watch subscriptions.
    pub async fn watcher_count(&self) -> usize {
        let mut watchers = self.watchers.lock().await;
        watchers.retain(|w| !w.sender.is_closed());
        watchers.len()
    }

    async fn admit(&self, key: &str) -> Result<()> {
        let latency = self.faults.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.faults.is_unavailable() {
            return Err(ConfigError::unavailable(key, "store marked unavailable"));
        }
        Ok(())
    }

    /// Delivers `event` to the subscribers of its key. Subscribers that are
    /// gone or too slow to keep up lose their stream.
    async fn notify(&self, event: WatchEvent) {
        let mut watchers = self.watchers.lock().await;
        watchers.retain(|w| {
            if w.key != event.key {
                return !w.sender.is_closed();
            }
            match w.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Watcher of {} lagged behind, closing its stream", w.key);
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.admit(key).await?;
        if FaultInjector::take(&self.faults.fail_gets) {
            return Err(ConfigError::unavailable(key, "injected read failure"));
        }
        self.data
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                key: key.to_string(),
            })
    }

    async fn get_by_prefix(&self, prefix: &str, order: SortOrder) -> Result<Vec<KeyValue>> {
        self.admit(prefix).await?;
        if FaultInjector::take(&self.faults.fail_gets) {
            return Err(ConfigError::unavailable(prefix, "injected read failure"));
        }
        let data = self.data.read().await;
        let mut entries: Vec<KeyValue> = data
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();
        if order == SortOrder::Descend {
            entries.reverse();
        }
        Ok(entries)
    }

    async fn watch(&self, key: &str) -> Result<WatchStream> {
        self.admit(key).await?;
        if FaultInjector::take(&self.faults.reject_watches) {
            return Err(ConfigError::unavailable(key, "injected watch rejection"));
        }
        let (sender, receiver) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        self.watchers.lock().await.push(Watcher {
            key: key.to_string(),
            sender,
        });
        log::debug!("Watch opened on {}", key);
        Ok(receiver)
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.admit(key).await?;
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value.to_vec());
        self.notify(WatchEvent::put(key, value)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.admit(key).await?;
        let mut data = self.data.write().await;
        if data.remove(key).is_some() {
            self.notify(WatchEvent::delete(key)).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("service.info.none").await.unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotFound {
                key: "service.info.none".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put("k", b"v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), b"v1".to_vec());
        store.delete("k").await.unwrap();
        assert!(store.get("k").await.is_err());
        // deleting again is fine
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_prefix_read_is_sorted_and_bounded() {
        let store = MemoryStore::with_entries([
            ("a.2", "x"),
            ("a.1", "y"),
            ("ab", "z"),
            ("b.1", "w"),
        ]);
        let keys: Vec<String> = store
            .get_by_prefix("a.", SortOrder::Ascend)
            .await
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["a.1", "a.2"]);
    }

    #[tokio::test]
    async fn test_watch_receives_puts_and_deletes_for_its_key_only() {
        let store = MemoryStore::new();
        let mut stream = store.watch("service.info.billing").await.unwrap();

        store.put("service.info.other", b"x").await.unwrap();
        store.put("service.info.billing", b"v1").await.unwrap();
        store.delete("service.info.billing").await.unwrap();

        assert_eq!(
            stream.recv().await.unwrap(),
            WatchEvent::put("service.info.billing", "v1")
        );
        assert_eq!(
            stream.recv().await.unwrap(),
            WatchEvent::delete("service.info.billing")
        );
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_watch_streams_ends_subscriptions() {
        let store = MemoryStore::new();
        let mut stream = store.watch("k").await.unwrap();
        assert_eq!(store.watcher_count().await, 1);

        store.close_watch_streams().await;
        assert!(stream.recv().await.is_none());
        assert_eq!(store.watcher_count().await, 0);
    }

    #[tokio::test]
    async fn test_dropped_receivers_are_pruned() {
        let store = MemoryStore::new();
        let stream = store.watch("k").await.unwrap();
        drop(stream);
        assert_eq!(store.watcher_count().await, 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::with_entries([("k", "v")]);
        store.faults().set_unavailable(true);

        assert!(store.get("k").await.unwrap_err().is_transient());
        assert!(store.watch("k").await.unwrap_err().is_transient());
        assert!(store.put("k", b"v").await.unwrap_err().is_transient());

        store.faults().set_unavailable(false);
        assert_eq!(store.get("k").await.unwrap(), b"v".to_vec());
    }

    #[tokio::test]
    async fn test_fail_gets_counts_down() {
        let store = MemoryStore::with_entries([("k", "v")]);
        store.faults().fail_gets(2);

        assert!(store.get("k").await.is_err());
        assert!(store.get("k").await.is_err());
        assert!(store.get("k").await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_watches_counts_down() {
        let store = MemoryStore::new();
        store.faults().reject_watches(1);

        assert!(store.watch("k").await.is_err());
        assert!(store.watch("k").await.is_ok());
    }

    #[tokio::test]
    async fn test_lagging_watcher_loses_its_stream() {
        let store = MemoryStore::new();
        let mut stream = store.watch("k").await.unwrap();

        for i in 0..=WATCH_CHANNEL_CAPACITY {
            store.put("k", i.to_string().as_bytes()).await.unwrap();
        }

        let mut received = 0;
        while stream.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, WATCH_CHANNEL_CAPACITY);
    }
}
