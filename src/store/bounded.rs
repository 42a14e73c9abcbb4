//! Uniform per-call timeout for a store gateway.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::{KeyValue, SortOrder, StoreGateway, WatchStream};
use crate::config::STORE_OP_TIMEOUT;
use crate::error_handling::{ConfigError, Result};

/// Wraps a gateway so that every call fails with `StoreUnavailable` once
/// `timeout` elapses. For `watch` only establishing the subscription is
/// bounded; the stream itself lives as long as the inner gateway keeps it.
pub struct BoundedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: StoreGateway> BoundedStore<S> {
    /// Bounds `inner` by `STORE_OP_TIMEOUT`.
    pub fn new(inner: S) -> Self {
        Self::with_timeout(inner, STORE_OP_TIMEOUT)
    }

    /// Bounds `inner` by a custom timeout.
    pub fn with_timeout(inner: S, timeout: Duration) -> Self {
        BoundedStore { inner, timeout }
    }

    /// The wrapped gateway.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(&self, key: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                log::error!(
                    "Store call on {} exceeded deadline of {:?}",
                    key,
                    self.timeout
                );
                Err(ConfigError::unavailable(
                    key,
                    format!("deadline of {:?} exceeded", self.timeout),
                ))
            }
        }
    }
}

#[async_trait]
impl<S: StoreGateway> StoreGateway for BoundedStore<S> {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.bounded(key, self.inner.get(key)).await
    }

    async fn get_by_prefix(&self, prefix: &str, order: SortOrder) -> Result<Vec<KeyValue>> {
        self.bounded(prefix, self.inner.get_by_prefix(prefix, order))
            .await
    }

    async fn watch(&self, key: &str) -> Result<WatchStream> {
        self.bounded(key, self.inner.watch(key)).await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.bounded(key, self.inner.put(key, value)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bounded(key, self.inner.delete(key)).await
    }
}
