//! Process abstraction
//!
//! A process is one named analysis step. It declares the ids it depends on
//! and the part of its configuration that identifies its result; the engine
//! takes care of ordering, dependency injection and caching.

use crate::error::{AnalysisError, Result};
use crate::results::{
    AnalysisResult, ClusterResult, SentimentAnalysis, ThemeAllocationResult, ThemeGenerationResult,
};
use async_trait::async_trait;
use pulse_core::{BatchingConfig, CoreApi};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique process identifier; results are exposed under this name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProcessId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ProcessId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One analysis step.
///
/// `public_config` is the identity contract: every field that can change the
/// result must appear in it, and transient state (counters, handles) must
/// not. Two processes with equal ids, configs, datasets and dependency
/// results share one cache entry.
#[async_trait]
pub trait Process: Send + Sync {
    fn id(&self) -> ProcessId;

    /// Ids whose results must be in the context before `run`
    fn dependencies(&self) -> Vec<ProcessId> {
        Vec::new()
    }

    /// Identity-relevant configuration
    fn public_config(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Own `fast` override; `None` inherits the analyzer's flag
    fn fast(&self) -> Option<bool> {
        None
    }

    /// Reject invalid configuration. Called for every process in the graph
    /// when the analyzer is built, before any remote call.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn run(&self, ctx: &ProcessContext<'_>) -> Result<ProcessOutput>;
}

/// Everything a running process may read
pub struct ProcessContext<'a> {
    dataset: &'a [String],
    fast: bool,
    batching: &'a BatchingConfig,
    client: Option<&'a dyn CoreApi>,
    results: &'a AnalysisResult,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        dataset: &'a [String],
        fast: bool,
        batching: &'a BatchingConfig,
        client: Option<&'a dyn CoreApi>,
        results: &'a AnalysisResult,
    ) -> Self {
        Self {
            dataset,
            fast,
            batching,
            client,
            results,
        }
    }

    pub fn dataset(&self) -> &'a [String] {
        self.dataset
    }

    /// Effective `fast` flag for this process
    pub fn fast(&self) -> bool {
        self.fast
    }

    pub fn batching(&self) -> &'a BatchingConfig {
        self.batching
    }

    /// Remote boundary; processes that call the service fail without one
    pub fn client(&self) -> Result<&'a dyn CoreApi> {
        self.client.ok_or_else(|| {
            AnalysisError::configuration("this process requires a remote client")
        })
    }

    /// Results of the processes that completed in earlier phases
    pub fn results(&self) -> &'a AnalysisResult {
        self.results
    }
}

/// Output of one process, as stored in the result bundle and the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ProcessOutput {
    ThemeGeneration(ThemeGenerationResult),
    Sentiment(SentimentAnalysis),
    ThemeAllocation(ThemeAllocationResult),
    Cluster(ClusterResult),
    Custom(serde_json::Value),
}

impl ProcessOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessOutput::ThemeGeneration(_) => "theme_generation",
            ProcessOutput::Sentiment(_) => "sentiment",
            ProcessOutput::ThemeAllocation(_) => "theme_allocation",
            ProcessOutput::Cluster(_) => "cluster",
            ProcessOutput::Custom(_) => "custom",
        }
    }

    /// Wrap any serializable value as a custom output
    pub fn custom<T: Serialize>(value: &T) -> Result<Self> {
        Ok(ProcessOutput::Custom(serde_json::to_value(value)?))
    }
}
