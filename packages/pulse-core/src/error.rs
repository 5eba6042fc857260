use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Shape mismatch ({context}): expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("Invalid batching configuration: {0}")]
    InvalidBatching(String),

    #[error("Remote call failed ({operation}): {message}")]
    RemoteCall { operation: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn remote<E: std::fmt::Display>(operation: impl Into<String>, e: E) -> Self {
        Self::RemoteCall {
            operation: operation.into(),
            message: e.to_string(),
        }
    }

    pub fn serialization<E: std::fmt::Display>(e: E) -> Self {
        Self::Serialization(e.to_string())
    }

    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    /// Stage of the similarity/pipeline flow this error belongs to
    pub fn stage(&self) -> FailureStage {
        match self {
            CoreError::ShapeMismatch { .. } => FailureStage::Stitching,
            CoreError::InvalidBatching(_) | CoreError::Config(_) => FailureStage::Partitioning,
            CoreError::RemoteCall { .. } | CoreError::Serialization(_) => FailureStage::RemoteCall,
        }
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::config(err)
    }
}

/// Stage that failed, reported to callers alongside the error itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FailureStage {
    /// Chunk planning / batching configuration
    Partitioning,
    /// The remote boundary (or decoding its payload)
    RemoteCall,
    /// Reassembly of block results
    Stitching,
    /// Process graph resolution
    DependencyResolution,
    /// Cache store reads/writes
    Cache,
    /// A process's own computation
    Process,
    /// Engine used after close, or similar misuse
    Lifecycle,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Partitioning => "partitioning",
            FailureStage::RemoteCall => "remote_call",
            FailureStage::Stitching => "stitching",
            FailureStage::DependencyResolution => "dependency_resolution",
            FailureStage::Cache => "cache",
            FailureStage::Process => "process",
            FailureStage::Lifecycle => "lifecycle",
        }
    }
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_stage_mapping() {
        assert_eq!(
            CoreError::shape_mismatch("block 0", "2x2", "2x3").stage(),
            FailureStage::Stitching
        );
        assert_eq!(
            CoreError::remote("compare_similarity", "503").stage(),
            FailureStage::RemoteCall
        );
        assert_eq!(
            CoreError::InvalidBatching("half_chunk = 0".into()).stage(),
            FailureStage::Partitioning
        );
    }

    #[test]
    fn test_yaml_error_is_config() {
        let err: CoreError = serde_yaml::from_str::<u32>("[").unwrap_err().into();
        assert!(matches!(err, CoreError::Config(_)));
        assert_eq!(err.stage(), FailureStage::Partitioning);
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = CoreError::shape_mismatch("block count", 6, 5);
        let msg = err.to_string();
        assert!(msg.contains("block count"));
        assert!(msg.contains("expected 6"));
        assert!(msg.contains("found 5"));
    }

    #[test]
    fn test_failure_stage_display() {
        assert_eq!(FailureStage::DependencyResolution.to_string(), "dependency_resolution");
        assert_eq!(FailureStage::Cache.as_str(), "cache");
    }
}
