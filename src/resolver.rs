//! Version resolution: which configuration version is active for a service
//! in a deployment environment.

use crate::config::service_info_key;
use crate::error_handling::{ConfigError, Result};
use crate::models::ServiceDescriptor;
use crate::store::StoreGateway;

/// Decodes a descriptor value and selects the version for `environment`.
///
/// Unknown environment tags select the production line. A zero version is
/// returned as-is; deciding what "unpublished" means is up to the caller.
pub fn descriptor_version(key: &str, raw: &[u8], environment: &str) -> Result<i64> {
    let descriptor: ServiceDescriptor =
        serde_json::from_slice(raw).map_err(|e| ConfigError::malformed(key, e))?;
    Ok(descriptor.version_for(environment))
}

/// Resolves the active configuration version of `service_name` in `environment`.
///
/// # Errors
///
/// - `NotFound` if the descriptor key is absent
/// - `MalformedRecord` if the descriptor does not decode
/// - `NoPublishedVersion` if the selected version is zero
/// - `StoreUnavailable` if the store cannot be reached
pub async fn resolve(
    store: &dyn StoreGateway,
    service_name: &str,
    environment: &str,
) -> Result<i64> {
    let key = service_info_key(service_name);
    let raw = store.get(&key).await?;
    let version = descriptor_version(&key, &raw, environment)?;

    if version == 0 {
        return Err(ConfigError::NoPublishedVersion {
            service: service_name.to_string(),
            environment: environment.to_string(),
        });
    }

    log::debug!(
        "[{}/{}] resolved configuration version v{}",
        service_name,
        environment,
        version
    );
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const DESCRIPTOR: &str =
        r#"{"type":"api","summary":"billing","currentVersion":{"dev":1,"test":2,"pre":0,"pro":5}}"#;

    fn store() -> MemoryStore {
        MemoryStore::with_entries([("service.info.billing", DESCRIPTOR)])
    }

    #[tokio::test]
    async fn test_resolve_known_environments() {
        let store = store();
        assert_eq!(resolve(&store, "billing", "dev").await.unwrap(), 1);
        assert_eq!(resolve(&store, "billing", "test").await.unwrap(), 2);
        assert_eq!(resolve(&store, "billing", "pro").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_resolve_unknown_environment_uses_production() {
        let store = store();
        for env in ["prod", "PRE", "", "qa"] {
            assert_eq!(resolve(&store, "billing", env).await.unwrap(), 5, "env {:?}", env);
        }
    }

    #[tokio::test]
    async fn test_resolve_zero_version_is_unpublished() {
        let err = resolve(&store(), "billing", "pre").await.unwrap_err();
        assert_eq!(
            err,
            ConfigError::NoPublishedVersion {
                service: "billing".to_string(),
                environment: "pre".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_descriptor() {
        let err = resolve(&store(), "orders", "pro").await.unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotFound {
                key: "service.info.orders".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_malformed_descriptor() {
        let store = MemoryStore::with_entries([("service.info.billing", "not json")]);
        let err = resolve(&store, "billing", "pro").await.unwrap_err();
        assert!(matches!(err, ConfigError::MalformedRecord { ref key, .. } if key == "service.info.billing"));
    }

    #[tokio::test]
    async fn test_resolve_store_unavailable() {
        let store = store();
        store.faults().set_unavailable(true);
        let err = resolve(&store, "billing", "pro").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_descriptor_version_returns_zero_without_failing() {
        let raw = br#"{"currentVersion":{}}"#;
        assert_eq!(descriptor_version("k", raw, "pro").unwrap(), 0);
    }
}
