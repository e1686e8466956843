//! In-process key-value namespace.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Error, KvStore, encode_item};

/// A [`KvStore`] held entirely in memory.
///
/// Values are stored already serialized so the quota check and the
/// round-trip through JSON behave like the persistent backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
    quota_bytes_per_item: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects items larger than `max_bytes`.
    pub fn with_quota(max_bytes: usize) -> Self {
        Self { items: RwLock::default(), quota_bytes_per_item: Some(max_bytes) }
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let items = self.items.read().await;
        match items.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        let json = encode_item(key, &value, self.quota_bytes_per_item)?;
        self.items.write().await.insert(key.to_string(), json);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", json!(["a", "b"])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(["a", "b"])));
        assert_eq!(store.len().await, 1);

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_quota_rejects_large_items() {
        let store = MemoryStore::with_quota(16);
        store.set("k", json!("short")).await.unwrap();

        let err = store.set("k", json!("x".repeat(32))).await.unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
        assert_eq!(store.get("k").await.unwrap(), Some(json!("short")));
    }
}
