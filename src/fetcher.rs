//! Versioned configuration fetching.

use crate::config::service_config_key;
use crate::error_handling::{ConfigError, Result};
use crate::models::VersionedConfigRecord;
use crate::store::StoreGateway;

/// Reads the full record of `service_name` at `version`, provenance included.
///
/// # Errors
///
/// - `VersionNotFound` (naming service and version) if nothing is published
///   at the derived key; the value is never decoded in that case
/// - `MalformedRecord` if the stored value does not decode
/// - `StoreUnavailable` if the store cannot be reached
pub async fn fetch_record(
    store: &dyn StoreGateway,
    service_name: &str,
    version: i64,
) -> Result<VersionedConfigRecord> {
    let key = service_config_key(service_name, version);
    let raw = store.get(&key).await.map_err(|e| match e {
        ConfigError::NotFound { .. } => ConfigError::VersionNotFound {
            service: service_name.to_string(),
            version,
        },
        other => other,
    })?;

    serde_json::from_slice(&raw).map_err(|e| ConfigError::malformed(key, e))
}

/// Reads the configuration content of `service_name` at `version`.
pub async fn fetch(store: &dyn StoreGateway, service_name: &str, version: i64) -> Result<String> {
    fetch_record(store, service_name, version)
        .await
        .map(|record| record.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_fetch_returns_content_only() {
        let store = MemoryStore::with_entries([(
            "service.config.billing.5",
            r#"{"content":"{\"limit\":100}","createUser":"ops"}"#,
        )]);
        assert_eq!(fetch(&store, "billing", 5).await.unwrap(), r#"{"limit":100}"#);
    }

    #[tokio::test]
    async fn test_fetch_record_keeps_provenance() {
        let store = MemoryStore::with_entries([(
            "service.config.billing.5",
            r#"{"content":"{}","createTime":"t0","createUser":"ops","updateTime":"t1"}"#,
        )]);
        let record = fetch_record(&store, "billing", 5).await.unwrap();
        assert_eq!(record.create_time, "t0");
        assert_eq!(record.create_user, "ops");
        assert_eq!(record.update_time, "t1");
    }

    #[tokio::test]
    async fn test_fetch_missing_version_names_service_and_version() {
        let store = MemoryStore::new();
        let err = fetch(&store, "billing", 9).await.unwrap_err();
        assert_eq!(
            err,
            ConfigError::VersionNotFound {
                service: "billing".to_string(),
                version: 9,
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("billing") && msg.contains('9'));
    }

    #[tokio::test]
    async fn test_fetch_malformed_record() {
        let store = MemoryStore::with_entries([("service.config.billing.5", "{\"content\":")]);
        let err = fetch(&store, "billing", 5).await.unwrap_err();
        assert!(matches!(err, ConfigError::MalformedRecord { ref key, .. } if key == "service.config.billing.5"));
    }

    #[tokio::test]
    async fn test_fetch_unavailable_is_not_reported_as_missing() {
        let store = MemoryStore::new();
        store.faults().fail_gets(1);
        let err = fetch(&store, "billing", 5).await.unwrap_err();
        assert!(err.is_transient());
    }
}
