//! Batching configuration
//!
//! The remote similarity endpoint rejects requests above a fixed item count.
//! These limits are passed explicitly to every chunking/stitching call so
//! tests (and callers with different plans) can vary them freely.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default remote item limit per request
pub const DEFAULT_MAX_ITEMS: usize = 200;

/// Default sub-chunk size used once a set has to be split
pub const DEFAULT_HALF_CHUNK: usize = DEFAULT_MAX_ITEMS / 2;

/// Limits for the Chunker, Body Builder and Stitcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Maximum combined items per remote request (MAX)
    pub max_items: usize,

    /// Chunk size once a list exceeds the limit (HALF, 1..=max_items)
    pub half_chunk: usize,

    /// Maximum bodies in flight at once
    pub max_concurrency: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            half_chunk: DEFAULT_HALF_CHUNK,
            max_concurrency: (num_cpus::get() * 3 / 4).max(1),
        }
    }
}

impl BatchingConfig {
    pub fn new(max_items: usize, half_chunk: usize) -> Result<Self> {
        let config = Self {
            max_items,
            half_chunk,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.half_chunk == 0 {
            return Err(CoreError::InvalidBatching(
                "half_chunk must be at least 1".to_string(),
            ));
        }
        if self.half_chunk > self.max_items {
            return Err(CoreError::InvalidBatching(format!(
                "half_chunk ({}) must not exceed max_items ({})",
                self.half_chunk, self.max_items
            )));
        }
        if self.max_concurrency == 0 {
            return Err(CoreError::InvalidBatching(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.half_chunk * 2 > self.max_items {
            // Two full chunks in one body would exceed the remote limit.
            warn!(
                max_items = self.max_items,
                half_chunk = self.half_chunk,
                "half_chunk is more than half of max_items; paired chunks may exceed the remote limit"
            );
        }
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
