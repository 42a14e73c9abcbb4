//! One-time startup merge of remote configuration into a local object.
//!
//! Failures here never stop a process from booting: whatever the caller's
//! configuration object held before (usually its defaults) stays in place.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error_handling::{ConfigError, Result};
use crate::fetcher::fetch;
use crate::resolver::resolve;
use crate::store::StoreGateway;

/// Deep-merges `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (arrays, scalars,
/// `null`) replaces the base value.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merges string-encoded JSON `content` into `target`.
///
/// `target` is only replaced once the merged value has been decoded back into
/// `T`, so on error it is untouched.
pub fn merge_content<T>(key: &str, content: &str, target: &mut T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let overlay: Value =
        serde_json::from_str(content).map_err(|e| ConfigError::malformed(key, e))?;
    let mut merged = serde_json::to_value(&*target).map_err(|e| ConfigError::malformed(key, e))?;
    merge_json(&mut merged, overlay);
    *target = serde_json::from_value(merged).map_err(|e| ConfigError::malformed(key, e))?;
    Ok(())
}

/// Merges `content` over a fresh copy of `defaults`.
///
/// Used for updates after startup: a newer version that drops a key must not
/// inherit that key from the version it replaces.
pub fn merge_over_defaults<T>(key: &str, defaults: &T, content: &str) -> Result<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    let mut fresh = defaults.clone();
    merge_content(key, content, &mut fresh)?;
    Ok(fresh)
}

/// Resolves, fetches and merges the configuration of `service_name` into
/// `target`, returning the version applied or 0 when nothing was applied.
///
/// Every failure is logged and swallowed; `target` then keeps the state it had
/// before the call.
///
/// # Example
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
/// use service_config::{initialize, MemoryStore};
///
/// #[derive(Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct BillingConfig {
///     limit: u32,
/// }
///
/// # async fn example(store: MemoryStore) {
/// let mut cfg = BillingConfig::default();
/// let version = initialize(&store, "billing", "pro", &mut cfg).await;
/// # }
/// ```
pub async fn initialize<T>(
    store: &dyn StoreGateway,
    service_name: &str,
    environment: &str,
    target: &mut T,
) -> i64
where
    T: Serialize + DeserializeOwned,
{
    match try_initialize(store, service_name, environment, target).await {
        Ok(version) => {
            log::info!(
                "[{}/{}] merged configuration from config center, version v{}",
                service_name,
                environment,
                version
            );
            version
        }
        Err(e) => {
            log::error!(
                "[{}/{}] failed to merge configuration from config center, keeping local defaults: {}",
                service_name,
                environment,
                e
            );
            0
        }
    }
}

async fn try_initialize<T>(
    store: &dyn StoreGateway,
    service_name: &str,
    environment: &str,
    target: &mut T,
) -> Result<i64>
where
    T: Serialize + DeserializeOwned,
{
    let version = resolve(store, service_name, environment).await?;
    let content = fetch(store, service_name, version).await?;
    let key = crate::config::service_config_key(service_name, version);
    merge_content(&key, &content, target)?;
    Ok(version)
}
