//! Config-center client: the outward interface of the crate.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error_handling::{ConfigError, Result};
use crate::models::VersionedConfigRecord;
use crate::store::StoreGateway;
use crate::watch::{WatchHandle, WatchLoop};

/// Client bound to one store gateway.
///
/// Cheap to clone; clones share the gateway.
///
/// # Example
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
/// use service_config::{BoundedStore, ConfigCenter, MemoryStore};
///
/// #[derive(Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct BillingConfig {
///     limit: u32,
/// }
///
/// # async fn example() {
/// let center = ConfigCenter::new(BoundedStore::new(MemoryStore::new()));
///
/// let mut cfg = BillingConfig::default();
/// let version = center.initialize("billing", "pro", &mut cfg).await;
///
/// let handle = center.spawn_watch("billing", "pro", version, |content| {
///     println!("new configuration: {}", content);
/// });
/// // ...
/// handle.shutdown().await;
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigCenter {
    store: Arc<dyn StoreGateway>,
}

impl ConfigCenter {
    /// Creates a client over `store`.
    pub fn new(store: impl StoreGateway + 'static) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Creates a client over an already shared gateway.
    pub fn from_arc(store: Arc<dyn StoreGateway>) -> Self {
        ConfigCenter { store }
    }

    /// The underlying gateway.
    pub fn store(&self) -> &dyn StoreGateway {
        self.store.as_ref()
    }

    /// Active version of `service_name` in `environment`.
    pub async fn resolve(&self, service_name: &str, environment: &str) -> Result<i64> {
        crate::resolver::resolve(self.store(), service_name, environment).await
    }

    /// Configuration content of `service_name` at `version`.
    pub async fn fetch(&self, service_name: &str, version: i64) -> Result<String> {
        crate::fetcher::fetch(self.store(), service_name, version).await
    }

    /// Full configuration record of `service_name` at `version`.
    pub async fn fetch_record(
        &self,
        service_name: &str,
        version: i64,
    ) -> Result<VersionedConfigRecord> {
        crate::fetcher::fetch_record(self.store(), service_name, version).await
    }

    /// Resolves and fetches in one step, returning `(content, version)`.
    ///
    /// Fails with `VersionUnchanged` when the active version equals
    /// `previous_version`, sparing the fetch. Pass 0 to always fetch.
    pub async fn get_config(
        &self,
        service_name: &str,
        environment: &str,
        previous_version: i64,
    ) -> Result<(String, i64)> {
        let version = self.resolve(service_name, environment).await?;
        if version == previous_version {
            return Err(ConfigError::VersionUnchanged {
                service: service_name.to_string(),
                environment: environment.to_string(),
                version,
            });
        }
        let content = self.fetch(service_name, version).await?;
        Ok((content, version))
    }

    /// Startup merge into `target`; see [`crate::bootstrap::initialize`].
    pub async fn initialize<T>(&self, service_name: &str, environment: &str, target: &mut T) -> i64
    where
        T: Serialize + DeserializeOwned,
    {
        crate::bootstrap::initialize(self.store(), service_name, environment, target).await
    }

    /// Runs the watch loop on the current task until `cancel` fires.
    pub async fn watch<F>(
        &self,
        service_name: &str,
        environment: &str,
        version: i64,
        action: F,
        cancel: CancellationToken,
    ) -> i64
    where
        F: FnMut(String) + Send,
    {
        self.watch_loop(service_name, environment, version)
            .run(action, cancel)
            .await
    }

    /// Starts the watch loop as a background task.
    pub fn spawn_watch<F>(
        &self,
        service_name: &str,
        environment: &str,
        version: i64,
        action: F,
    ) -> WatchHandle
    where
        F: FnMut(String) + Send + 'static,
    {
        WatchHandle::spawn(self.watch_loop(service_name, environment, version), action)
    }

    fn watch_loop(&self, service_name: &str, environment: &str, version: i64) -> WatchLoop {
        WatchLoop::new(Arc::clone(&self.store), service_name, environment, version)
    }
}
