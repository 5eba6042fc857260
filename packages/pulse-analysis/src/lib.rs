/*
 * Pulse Analysis - dependency-resolving analysis pipeline
 *
 * Runs named analysis processes over one dataset in dependency order,
 * injecting default-configured prerequisites and reusing results stored
 * under a content fingerprint.
 *
 * Architecture:
 * - Process trait + built-in variants (process, processes)
 * - Default constructors for injection (registry)
 * - Process graph with Kahn phases (dag)
 * - Engine with persistent cache (analyzer)
 * - Typed result bundle (results)
 * - One-call helpers (starters)
 * - Steps over named sources (workflow)
 */

// Public modules
pub mod analyzer;
pub mod config;
pub mod dag;
pub mod error;
pub mod logging;
pub mod process;
pub mod processes;
pub mod registry;
pub mod results;
pub mod starters;
pub mod workflow;

// Re-exports
pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use config::{AnalyzerConfig, CONFIG_VERSION, DEFAULT_CACHE_DIR};
pub use dag::{ProcessGraph, ProcessNode};
pub use error::{AnalysisError, Result};
pub use logging::init_tracing;
pub use process::{Process, ProcessContext, ProcessId, ProcessOutput};
pub use processes::{ClusterProcess, SentimentProcess, ThemeAllocation, ThemeGeneration};
pub use registry::{ProcessFactory, ProcessRegistry};
pub use results::{
    AnalysisResult, ClusterResult, SentimentAnalysis, ThemeAllocationResult,
    ThemeGenerationResult,
};
pub use workflow::Workflow;
