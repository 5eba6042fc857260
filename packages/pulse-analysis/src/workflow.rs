//! Workflows over named sources
//!
//! A workflow declares text sources by name and the steps reading them.
//! Steps over the same source share one [`Analyzer`], so a prerequisite such
//! as generated themes is computed once per source. All step outputs are
//! merged into a single [`AnalysisResult`] keyed by process id.

use crate::analyzer::Analyzer;
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::process::{Process, ProcessId};
use crate::processes::{ClusterProcess, SentimentProcess, ThemeAllocation, ThemeGeneration};
use crate::results::AnalysisResult;
use pulse_core::CoreApi;
use pulse_storage::{CacheStore, SqliteCacheStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
enum StepKind {
    ThemeGeneration { min_themes: usize, max_themes: usize },
    Sentiment,
    ThemeAllocation { themes_from: Option<String> },
    Cluster,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    inputs: String,
    kind: StepKind,
}

/// Builder of analysis steps over named text sources
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    sources: BTreeMap<String, Vec<String>>,
    steps: Vec<Step>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the source `name`
    pub fn source<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        self.sources
            .insert(name.into(), items.into_iter().map(Into::into).collect());
        self
    }

    pub fn theme_generation(self, inputs: &str, min_themes: usize, max_themes: usize) -> Self {
        self.step(
            inputs,
            StepKind::ThemeGeneration {
                min_themes,
                max_themes,
            },
        )
    }

    pub fn sentiment(self, inputs: &str) -> Self {
        self.step(inputs, StepKind::Sentiment)
    }

    /// Allocate `inputs` to the themes listed in source `themes_from`, or to
    /// themes generated from `inputs` when `themes_from` is `None`
    pub fn theme_allocation(self, inputs: &str, themes_from: Option<&str>) -> Self {
        self.step(
            inputs,
            StepKind::ThemeAllocation {
                themes_from: themes_from.map(str::to_string),
            },
        )
    }

    pub fn cluster(self, inputs: &str) -> Self {
        self.step(inputs, StepKind::Cluster)
    }

    fn step(mut self, inputs: &str, kind: StepKind) -> Self {
        self.steps.push(Step {
            inputs: inputs.to_string(),
            kind,
        });
        self
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn items(&self, name: &str) -> Result<&[String]> {
        self.sources
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::configuration(format!("unknown source '{}'", name)))
    }

    fn process_for(&self, step: &Step) -> Result<Arc<dyn Process>> {
        let process: Arc<dyn Process> = match &step.kind {
            StepKind::ThemeGeneration {
                min_themes,
                max_themes,
            } => Arc::new(ThemeGeneration::new(*min_themes, *max_themes)),
            StepKind::Sentiment => Arc::new(SentimentProcess::new()),
            StepKind::ThemeAllocation { themes_from: None } => Arc::new(ThemeAllocation::default()),
            StepKind::ThemeAllocation {
                themes_from: Some(name),
            } => Arc::new(ThemeAllocation::with_themes(self.items(name)?.iter().cloned())),
            StepKind::Cluster => Arc::new(ClusterProcess::new()),
        };
        Ok(process)
    }

    /// Build one analyzer per input source, then run them in source order.
    ///
    /// Unknown sources, invalid step settings and a process id produced by
    /// two sources are all rejected before any remote call.
    pub async fn run(
        &self,
        client: Arc<dyn CoreApi>,
        config: AnalyzerConfig,
    ) -> Result<AnalysisResult> {
        let mut by_source: BTreeMap<&str, Vec<Arc<dyn Process>>> = BTreeMap::new();
        for step in &self.steps {
            self.items(&step.inputs)?;
            by_source
                .entry(step.inputs.as_str())
                .or_default()
                .push(self.process_for(step)?);
        }

        config.validate()?;
        let store: Option<Arc<dyn CacheStore>> = if config.use_cache {
            Some(Arc::new(SqliteCacheStore::open(&config.cache_dir)?))
        } else {
            None
        };

        let mut analyzers = Vec::with_capacity(by_source.len());
        let mut producers: BTreeMap<ProcessId, &str> = BTreeMap::new();
        for (name, processes) in by_source {
            let mut builder = Analyzer::builder(self.items(name)?.iter().cloned())
                .client(client.clone())
                .config(config.clone());
            if let Some(store) = &store {
                builder = builder.cache_store(store.clone());
            }
            for process in processes {
                builder = builder.process_shared(process);
            }
            let analyzer = builder.build()?;

            for node in analyzer.graph().phases().flatten() {
                if let Some(other) = producers.insert(node.id().clone(), name) {
                    return Err(AnalysisError::configuration(format!(
                        "'{}' is produced by both source '{}' and source '{}'",
                        node.id(),
                        other,
                        name
                    )));
                }
            }
            analyzers.push((name, analyzer));
        }

        info!(
            "Workflow: {} steps over {} sources",
            self.steps.len(),
            analyzers.len()
        );

        // The analyzers share one store, so none is closed before all have run
        let mut merged = AnalysisResult::new();
        let mut failure = None;
        for (name, analyzer) in &analyzers {
            info!("Workflow source '{}': {} texts", name, analyzer.dataset().len());
            let result = match analyzer.run().await {
                Ok(result) => result,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };

            let hits: Vec<ProcessId> = result.cache_hits().cloned().collect();
            for (id, output) in result.into_outputs() {
                let from_cache = hits.contains(&id);
                merged.insert(id, output, from_cache);
            }
        }

        for (_, analyzer) in &analyzers {
            analyzer.close().await?;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(merged),
        }
    }
}
