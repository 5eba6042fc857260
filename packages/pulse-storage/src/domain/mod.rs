//! Domain layer for the result cache
//!
//! # Domain Models
//!
//! - `CacheEntry`: one serialized process result, addressed by fingerprint
//!
//! # Port Trait
//!
//! - `CacheStore`: durable key/value store of cache entries
//!
//! Writes are idempotent upserts: one fingerprint always maps to the same
//! bytes, so concurrent writers pointed at the same location need no
//! cross-process locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::Result;

// ═══════════════════════════════════════════════════════════════════════════
// Domain Models
// ═══════════════════════════════════════════════════════════════════════════

/// Serialized result of one process run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content address of the run
    pub fingerprint: Fingerprint,

    /// Process that produced the payload (diagnostics only)
    pub process_id: String,

    /// Serialized result bytes (JSON)
    pub payload: Vec<u8>,

    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, process_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            fingerprint,
            process_id: process_id.into(),
            payload,
            created_at: Utc::now(),
        }
    }

    /// Encode `value` as the entry payload
    pub fn from_value<T: Serialize>(
        fingerprint: Fingerprint,
        process_id: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        Ok(Self::new(fingerprint, process_id, serde_json::to_vec(value)?))
    }

    /// Decode the payload
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Fingerprint of the payload bytes (used as a dependency input)
    pub fn payload_fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.payload)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Port Trait
// ═══════════════════════════════════════════════════════════════════════════

/// Persistent fingerprint → result store
///
/// Every method fails with `ErrorKind::Closed` once `close()` has been called.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name and location, for logs
    fn describe(&self) -> String;

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry for `entry.fingerprint`
    async fn put(&self, entry: &CacheEntry) -> Result<()>;

    /// Remove every entry; returns how many were removed
    async fn clear(&self) -> Result<usize>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Release the underlying handle. Idempotent.
    async fn close(&self) -> Result<()>;
}
