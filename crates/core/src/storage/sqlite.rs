//! SQLite-backed key-value namespaces.

use async_trait::async_trait;
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::{CacheDb, Error, KvStore, encode_item};

/// One named namespace inside a [`CacheDb`].
///
/// Namespaces share the `kv_store` table and never see each other's keys.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: CacheDb,
    namespace: String,
    quota_bytes_per_item: Option<usize>,
}

impl SqliteStore {
    pub fn new(db: CacheDb, namespace: impl Into<String>) -> Self {
        Self { db, namespace: namespace.into(), quota_bytes_per_item: None }
    }

    /// Reject items larger than `max_bytes` (key plus serialized value).
    pub fn with_quota(mut self, max_bytes: Option<usize>) -> Self {
        self.quota_bytes_per_item = max_bytes;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Keys currently stored in this namespace, sorted.
    #[cfg(test)]
    pub(crate) async fn keys(&self) -> Result<Vec<String>, Error> {
        let namespace = self.namespace.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM kv_store WHERE namespace = ?1 ORDER BY key")?;
                let keys = stmt
                    .query_map(params![namespace], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let namespace = self.namespace.clone();
        let key = key.to_string();
        let json = self
            .db
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value_json FROM kv_store WHERE namespace = ?1 AND key = ?2",
                    params![namespace, key],
                    |row| row.get(0),
                );

                match result {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        let json = encode_item(key, &value, self.quota_bytes_per_item)?;
        let namespace = self.namespace.clone();
        let key = key.to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_store (namespace, key, value_json, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(namespace, key) DO UPDATE SET
                        value_json = excluded.value_json,
                        updated_at = excluded.updated_at",
                    params![namespace, key, json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let namespace = self.namespace.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM kv_store WHERE namespace = ?1 AND key = ?2", params![namespace, key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let local = db.namespace("local");

        assert!(local.get("analysisHistory").await.unwrap().is_none());

        local.set("analysisHistory", json!([{"id": "1"}])).await.unwrap();
        local.set("analysisHistory", json!([{"id": "2"}])).await.unwrap();

        assert_eq!(local.get("analysisHistory").await.unwrap(), Some(json!([{"id": "2"}])));
        assert_eq!(local.keys().await.unwrap(), vec!["analysisHistory".to_string()]);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let local = db.namespace("local");
        let synced = db.namespace("sync");

        local.set("shared", json!("local")).await.unwrap();
        synced.set("shared", json!("sync")).await.unwrap();
        assert_eq!(local.get("shared").await.unwrap(), Some(json!("local")));

        synced.remove("shared").await.unwrap();
        assert!(synced.get("shared").await.unwrap().is_none());
        assert_eq!(local.get("shared").await.unwrap(), Some(json!("local")));
    }

    #[tokio::test]
    async fn test_quota_enforced() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let synced = db.namespace("sync").with_quota(Some(10));

        let err = synced.set("meta", json!("x".repeat(20))).await.unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
        assert!(synced.get("meta").await.unwrap().is_none());
    }
}
