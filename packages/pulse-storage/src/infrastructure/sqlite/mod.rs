//! SQLite cache store
//!
//! One database file per cache directory (`{cache_dir}/cache.sqlite3`).
//! Entries survive process restarts for as long as the directory is reused.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::domain::{CacheEntry, CacheStore};
use crate::error::{Result, StorageError};
use crate::fingerprint::Fingerprint;

/// Database file name inside the cache directory
pub const DB_FILE_NAME: &str = "cache.sqlite3";

/// SQLite-backed `CacheStore`
pub struct SqliteCacheStore {
    location: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteCacheStore {
    /// Open (creating if needed) the store under `cache_dir`
    pub fn open(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir)?;

        let location = cache_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&location)?;
        // Concurrent analyzers on one directory wait instead of failing.
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self {
            location,
            conn: Mutex::new(Some(conn)),
        };
        store.init_schema()?;
        debug!("Opened SQLite cache store at {}", store.location.display());
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            location: PathBuf::from(":memory:"),
            conn: Mutex::new(Some(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn init_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS cache_entries (
                    fingerprint TEXT PRIMARY KEY,
                    process_id TEXT NOT NULL,
                    payload BLOB NOT NULL,
                    created_at INTEGER NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| StorageError::closed(self.location.display().to_string()))?;
        f(conn)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.location.display())
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        let row = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT process_id, payload, created_at FROM cache_entries WHERE fingerprint = ?1",
                    params![fingerprint.to_hex()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Vec<u8>>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((process_id, payload, created_ms)) = row else {
            return Ok(None);
        };

        let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms).ok_or_else(|| {
            StorageError::serialization(format!("Invalid created_at timestamp: {}", created_ms))
        })?;

        Ok(Some(CacheEntry {
            fingerprint: *fingerprint,
            process_id,
            payload,
            created_at,
        }))
    }

    async fn put(&self, entry: &CacheEntry) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cache_entries (fingerprint, process_id, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(fingerprint) DO UPDATE SET
                    process_id = excluded.process_id,
                    payload = excluded.payload,
                    created_at = excluded.created_at",
                params![
                    entry.fingerprint.to_hex(),
                    &entry.process_id,
                    &entry.payload,
                    entry.created_at.timestamp_millis()
                ],
            )?;
            Ok(())
        })
    }

    async fn clear(&self) -> Result<usize> {
        let removed = self.with_conn(|conn| Ok(conn.execute("DELETE FROM cache_entries", [])?))?;
        debug!("Cleared {} entries from {}", removed, self.describe());
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, err)| StorageError::from(err))?;
            debug!("Closed {}", self.describe());
        }
        Ok(())
    }
}
