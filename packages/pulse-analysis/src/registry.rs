//! Default constructors for injectable processes
//!
//! The graph consults the registry only for dependency ids that no explicit
//! process provides.

use crate::process::{Process, ProcessId};
use crate::processes::{
    ClusterProcess, SentimentProcess, ThemeAllocation, ThemeGeneration, CLUSTER, SENTIMENT,
    THEME_ALLOCATION, THEME_GENERATION,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a default-configured process
pub type ProcessFactory = Arc<dyn Fn() -> Arc<dyn Process> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ProcessRegistry {
    factories: HashMap<ProcessId, ProcessFactory>,
}

impl ProcessRegistry {
    /// Empty registry; nothing can be injected
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in variant at its default configuration
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(THEME_GENERATION, || Arc::new(ThemeGeneration::default()));
        registry.register(SENTIMENT, || Arc::new(SentimentProcess::default()));
        registry.register(THEME_ALLOCATION, || Arc::new(ThemeAllocation::default()));
        registry.register(CLUSTER, || Arc::new(ClusterProcess::default()));
        registry
    }

    /// Register (or replace) the default constructor for `id`
    pub fn register<F>(&mut self, id: impl Into<ProcessId>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Process> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn create(&self, id: &str) -> Option<Arc<dyn Process>> {
        self.factories.get(id).map(|factory| factory())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&ProcessId> {
        let mut ids: Vec<_> = self.factories.keys().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
