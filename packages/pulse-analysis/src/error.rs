use crate::process::ProcessId;
use pulse_core::{CoreError, FailureStage};
use pulse_storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("DAG cycle detected among processes: {0}")]
    DagCycleDetected(String),

    #[error("No result for process '{0}'")]
    AttributeNotFound(ProcessId),

    #[error("Process '{process}' produced a {found} result, expected {expected}")]
    UnexpectedOutput {
        process: ProcessId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Process '{process}' failed: {source}")]
    ProcessFailed {
        process: ProcessId,
        #[source]
        source: Box<AnalysisError>,
    },

    #[error("Analyzer is closed")]
    Closed,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config file error: {0}")]
    Config(String),

    #[error("Unsupported configuration version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn configuration<E: std::fmt::Display>(e: E) -> Self {
        Self::Configuration(e.to_string())
    }

    pub fn serialization<E: std::fmt::Display>(e: E) -> Self {
        Self::Serialization(e.to_string())
    }

    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    pub fn process_failed(process: ProcessId, source: AnalysisError) -> Self {
        Self::ProcessFailed {
            process,
            source: Box::new(source),
        }
    }

    /// Stage that failed. A failed process reports the stage of its cause,
    /// so a remote error inside a process still reads as `remote_call`.
    pub fn stage(&self) -> FailureStage {
        match self {
            AnalysisError::Configuration(_) | AnalysisError::DagCycleDetected(_) => {
                FailureStage::DependencyResolution
            }
            AnalysisError::AttributeNotFound(_)
            | AnalysisError::UnexpectedOutput { .. }
            | AnalysisError::Other(_) => FailureStage::Process,
            AnalysisError::ProcessFailed { source, .. } => source.stage(),
            AnalysisError::Closed
            | AnalysisError::Config(_)
            | AnalysisError::UnsupportedVersion { .. } => FailureStage::Lifecycle,
            AnalysisError::Core(e) => e.stage(),
            AnalysisError::Storage(_) | AnalysisError::Serialization(_) => FailureStage::Cache,
        }
    }

    /// Id of the failing process, if the error came from one
    pub fn process(&self) -> Option<&ProcessId> {
        match self {
            AnalysisError::ProcessFailed { process, .. } => Some(process),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::serialization(err)
    }
}

impl From<serde_yaml::Error> for AnalysisError {
    fn from(err: serde_yaml::Error) -> Self {
        AnalysisError::config(err)
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::config(err)
    }
}
