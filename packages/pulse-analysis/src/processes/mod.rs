//! Built-in processes
//!
//! Each one wraps a single remote operation. Caller-defined processes
//! implement the same `Process` trait and return `ProcessOutput::Custom`.

mod cluster;
mod sentiment;
mod theme_allocation;
mod theme_generation;

pub use cluster::ClusterProcess;
pub use sentiment::SentimentProcess;
pub use theme_allocation::ThemeAllocation;
pub use theme_generation::ThemeGeneration;

pub const THEME_GENERATION: &str = "theme_generation";
pub const SENTIMENT: &str = "sentiment";
pub const THEME_ALLOCATION: &str = "theme_allocation";
pub const CLUSTER: &str = "cluster";
