//! The SQLite database behind the persistent key-value namespaces.
//!
//! One file holds every namespace. Opening it switches on WAL mode and brings
//! the schema up to date.

use super::migrations;
use super::sqlite::SqliteStore;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Handle to the history database.
///
/// Queries run on tokio-rusqlite's background thread. Clones share the
/// connection, so every [`SqliteStore`] handed out by [`CacheDb::namespace`]
/// writes to the same file.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// A private in-memory database, gone when the last clone drops.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;
        let version = migrations::schema_version(&conn).await?;
        tracing::debug!(schema_version = version, "database ready");

        Ok(Self { conn })
    }

    /// A key-value namespace stored in this database.
    pub fn namespace(&self, name: impl Into<String>) -> SqliteStore {
        SqliteStore::new(self.clone(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_open_file() {
        let path = std::env::temp_dir().join(format!("pagelens-test-{}.sqlite", uuid::Uuid::new_v4().simple()));
        let db = CacheDb::open(&path).await.unwrap();
        drop(db);

        // Reopening runs migrations again without error.
        let db = CacheDb::open(&path).await.unwrap();
        assert_eq!(migrations::schema_version(&db.conn).await.unwrap(), 1);
        drop(db);

        let _ = std::fs::remove_file(&path);
    }
}
