//! In-memory cache store
//!
//! Same contract as the SQLite store without durability. Useful for tests and
//! for callers that want per-process memoization only.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{CacheEntry, CacheStore};
use crate::error::{Result, StorageError};
use crate::fingerprint::Fingerprint;

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<Fingerprint, CacheEntry>,
    closed: AtomicBool,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::closed("memory"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        self.ensure_open()?;
        Ok(self.entries.get(fingerprint).map(|e| e.value().clone()))
    }

    async fn put(&self, entry: &CacheEntry) -> Result<()> {
        self.ensure_open()?;
        self.entries.insert(entry.fingerprint, entry.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        self.ensure_open()?;
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.entries.len())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
        Ok(())
    }
}
