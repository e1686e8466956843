//! Asynchronous key-value namespaces backing the history store.
//!
//! The history store talks to two namespaces ("local" for full entries and
//! "synced" for the small meta projection) through the [`KvStore`] trait.
//! Two backends are provided:
//!
//! - [`MemoryStore`]: an in-process map, for tests and ephemeral servers
//! - [`SqliteStore`]: a namespace inside the SQLite [`CacheDb`], using
//!   tokio-rusqlite with WAL mode and versioned migrations
//!
//! Both can enforce a per-item byte quota, matching the item-size limit of
//! the browser's synced storage area.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// An asynchronous string-keyed store of JSON values.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), Error>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Serialize `value` and check it against an optional per-item quota.
///
/// The quota counts the key plus the serialized value, like the browser's
/// `QUOTA_BYTES_PER_ITEM`.
pub(crate) fn encode_item(key: &str, value: &Value, quota: Option<usize>) -> Result<String, Error> {
    let json = serde_json::to_string(value)?;
    if let Some(max) = quota {
        let size = key.len() + json.len();
        if size > max {
            return Err(Error::QuotaExceeded { key: key.to_string(), size, max });
        }
    }
    Ok(json)
}
