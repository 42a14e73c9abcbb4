//! Store seeding from a JSON file.

use std::path::Path;

use serde_json::Value;

use crate::error_handling::InitializationError;
use crate::store::{MemoryStore, SortOrder, StoreGateway};

/// Builds a `MemoryStore` from a JSON object mapping keys to values.
///
/// String values are stored verbatim; any other JSON value is stored as its
/// compact serialization, so descriptors and records can be written either
/// inline or pre-encoded:
///
/// ```json
/// {
///   "service.info.billing": {"type": "api", "currentVersion": {"pro": 5}},
///   "service.config.billing.5": "{\"content\":\"{\\\"limit\\\":100}\"}"
/// }
/// ```
pub async fn load_seed(path: &Path) -> Result<MemoryStore, InitializationError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let entries = parse_seed(&raw)?;
    log::info!("Loaded {} key(s) from {}", entries.len(), path.display());
    Ok(MemoryStore::with_entries(entries))
}

/// Re-reads the seed file and publishes its differences into `store`.
///
/// Changed or new keys are put, keys no longer present are deleted, unchanged
/// keys are left alone so watchers only see real changes. Returns the number
/// of keys written or deleted.
pub async fn sync_seed(store: &dyn StoreGateway, path: &Path) -> Result<usize, InitializationError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let entries = parse_seed(&raw)?;
    let existing = store
        .get_by_prefix("", SortOrder::Ascend)
        .await?;
    let mut changed = 0;

    for kv in &existing {
        if !entries.iter().any(|(key, _)| *key == kv.key) {
            store.delete(&kv.key).await?;
            changed += 1;
        }
    }
    for (key, value) in &entries {
        let same = existing
            .iter()
            .any(|kv| kv.key == *key && kv.value == *value);
        if !same {
            store.put(key, value).await?;
            changed += 1;
        }
    }

    if changed > 0 {
        log::info!("Published {} change(s) from {}", changed, path.display());
    }
    Ok(changed)
}

fn parse_seed(raw: &str) -> Result<Vec<(String, Vec<u8>)>, InitializationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| InitializationError::SeedFormatError(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(InitializationError::SeedFormatError(
            "top-level value must be an object of key -> value".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let bytes = match value {
                Value::String(s) => s.into_bytes(),
                other => other.to_string().into_bytes(),
            };
            (key, bytes)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_seed_keeps_strings_verbatim() {
        let entries = parse_seed(r#"{"a": "raw text", "b": {"x": 1}}"#).unwrap();
        assert_eq!(entries[0], ("a".to_string(), b"raw text".to_vec()));
        assert_eq!(entries[1], ("b".to_string(), br#"{"x":1}"#.to_vec()));
    }

    #[test]
    fn test_parse_seed_rejects_non_object() {
        assert!(matches!(
            parse_seed("[1, 2]"),
            Err(InitializationError::SeedFormatError(_))
        ));
        assert!(matches!(
            parse_seed("not json"),
            Err(InitializationError::SeedFormatError(_))
        ));
    }

    #[tokio::test]
    async fn test_load_seed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"service.info.billing": {{"currentVersion": {{"pro": 5}}}}}}"#
        )
        .unwrap();

        let store = load_seed(file.path()).await.unwrap();
        let raw = store.get("service.info.billing").await.unwrap();
        assert_eq!(raw, br#"{"currentVersion":{"pro":5}}"#.to_vec());
    }

    #[tokio::test]
    async fn test_sync_seed_publishes_only_differences() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"a": "1", "b": "2"}}"#).unwrap();
        let store = load_seed(file.path()).await.unwrap();
        let mut stream = store.watch("b").await.unwrap();

        let file = rewrite(file, r#"{"a": "1", "c": "3"}"#);
        assert_eq!(sync_seed(&store, file.path()).await.unwrap(), 2);

        assert_eq!(store.get("a").await.unwrap(), b"1".to_vec());
        assert_eq!(store.get("c").await.unwrap(), b"3".to_vec());
        assert!(store.get("b").await.is_err());
        assert_eq!(
            stream.recv().await.unwrap().kind,
            crate::store::WatchEventKind::Delete
        );

        assert_eq!(sync_seed(&store, file.path()).await.unwrap(), 0);
    }

    fn rewrite(file: tempfile::NamedTempFile, content: &str) -> tempfile::NamedTempFile {
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_seed_missing_file() {
        let result = load_seed(Path::new("/definitely/not/here.json")).await;
        assert!(matches!(result, Err(InitializationError::SeedIoError(_))));
    }
}
