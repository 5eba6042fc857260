//! Analyzer configuration
//!
//! YAML schema (v1):
//!
//! ```yaml
//! version: 1
//! use_cache: true
//! cache_dir: .pulse_cache
//! fast: false
//! batching:
//!   max_items: 200
//!   half_chunk: 100
//!   max_concurrency: 8
//! ```
//!
//! Every field except `version` is optional.

use crate::error::{AnalysisError, Result};
use pulse_core::BatchingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported YAML schema version
pub const CONFIG_VERSION: u32 = 1;

/// Default cache location, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = ".pulse_cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Reuse results stored under the same fingerprint
    pub use_cache: bool,

    /// Directory holding the persistent cache
    pub cache_dir: PathBuf,

    /// Default `fast` flag for processes that don't set their own
    pub fast: bool,

    pub batching: BatchingConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            fast: false,
            batching: BatchingConfig::default(),
        }
    }
}

/// On-disk form: the config plus its schema version
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFileV1 {
    version: u32,
    #[serde(flatten)]
    config: AnalyzerConfig,
}

impl AnalyzerConfig {
    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn with_batching(mut self, batching: BatchingConfig) -> Self {
        self.batching = batching;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.batching.validate()?;
        if self.use_cache && self.cache_dir.as_os_str().is_empty() {
            return Err(AnalysisError::config("cache_dir must not be empty when use_cache is set"));
        }
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;
        if file.version != CONFIG_VERSION {
            return Err(AnalysisError::UnsupportedVersion {
                found: file.version,
                supported: CONFIG_VERSION,
            });
        }
        file.config.validate()?;
        Ok(file.config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        let file = ConfigFileV1 {
            version: CONFIG_VERSION,
            config: self.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}
