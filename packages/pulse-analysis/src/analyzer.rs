//! Analyzer engine
//!
//! Resolves the process graph once at build time, then executes it phase by
//! phase on every `run()`. Processes inside a phase run concurrently, bounded
//! by the batching concurrency limit; each one is looked up in the cache by
//! fingerprint before it is run.

use crate::config::AnalyzerConfig;
use crate::dag::{ProcessGraph, ProcessNode};
use crate::error::{AnalysisError, Result};
use crate::process::{Process, ProcessContext, ProcessId, ProcessOutput};
use crate::registry::ProcessRegistry;
use crate::results::AnalysisResult;
use futures::stream::{self, StreamExt};
use pulse_core::CoreApi;
use pulse_storage::{CacheEntry, CacheStore, Fingerprint, FingerprintBuilder, SqliteCacheStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Configures and builds an [`Analyzer`]
pub struct AnalyzerBuilder {
    dataset: Vec<String>,
    processes: Vec<Arc<dyn Process>>,
    client: Option<Arc<dyn CoreApi>>,
    config: AnalyzerConfig,
    cache_store: Option<Arc<dyn CacheStore>>,
    registry: ProcessRegistry,
}

impl AnalyzerBuilder {
    fn new(dataset: Vec<String>) -> Self {
        Self {
            dataset,
            processes: Vec::new(),
            client: None,
            config: AnalyzerConfig::default(),
            cache_store: None,
            registry: ProcessRegistry::with_builtins(),
        }
    }

    pub fn process(self, process: impl Process + 'static) -> Self {
        self.process_shared(Arc::new(process))
    }

    /// Add a process the caller keeps a handle to
    pub fn process_shared(mut self, process: Arc<dyn Process>) -> Self {
        self.processes.push(process);
        self
    }

    pub fn client(mut self, client: Arc<dyn CoreApi>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this store instead of opening SQLite at `config.cache_dir`
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Replace the default constructors used for dependency injection
    pub fn registry(mut self, registry: ProcessRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Result<Analyzer> {
        self.config.validate()?;
        let graph = ProcessGraph::resolve(self.processes, &self.registry)?;
        for node in graph.phases().flatten() {
            node.process()
                .validate()
                .map_err(|e| AnalysisError::process_failed(node.id().clone(), e))?;
        }

        let cache: Option<Arc<dyn CacheStore>> = if self.config.use_cache {
            Some(match self.cache_store {
                Some(store) => store,
                None => Arc::new(SqliteCacheStore::open(&self.config.cache_dir)?),
            })
        } else {
            None
        };

        let injected = graph.injected();
        if !injected.is_empty() {
            debug!(
                "Injected default processes: {}",
                injected
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        info!(
            "Analyzer ready: {} texts, {} processes, cache: {}",
            self.dataset.len(),
            graph.len(),
            cache
                .as_ref()
                .map(|store| store.describe())
                .unwrap_or_else(|| "disabled".to_string())
        );
        info!("Execution plan:\n{}", graph.execution_plan());

        Ok(Analyzer {
            dataset_fingerprint: Fingerprint::of_texts(&self.dataset),
            dataset: self.dataset,
            graph,
            client: self.client,
            config: self.config,
            cache,
            closed: AtomicBool::new(false),
        })
    }
}

/// Dependency-resolving, caching pipeline over one dataset
pub struct Analyzer {
    dataset: Vec<String>,
    dataset_fingerprint: Fingerprint,
    graph: ProcessGraph,
    client: Option<Arc<dyn CoreApi>>,
    config: AnalyzerConfig,
    cache: Option<Arc<dyn CacheStore>>,
    closed: AtomicBool,
}

/// Process that missed the cache, ready to run
struct Pending<'g> {
    node: &'g ProcessNode,
    fast: bool,
    fingerprint: Fingerprint,
}

impl Analyzer {
    pub fn builder<S: Into<String>>(dataset: impl IntoIterator<Item = S>) -> AnalyzerBuilder {
        AnalyzerBuilder::new(dataset.into_iter().map(Into::into).collect())
    }

    pub fn dataset(&self) -> &[String] {
        &self.dataset
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(AnalysisError::Closed);
        }
        Ok(())
    }

    /// Execute every process, reusing cached results where fingerprints match.
    ///
    /// The first failing process aborts the run: processes still running in
    /// its phase are dropped and later phases never start. Nothing is cached
    /// for the failed process.
    pub async fn run(&self) -> Result<AnalysisResult> {
        self.ensure_open()?;

        let mut result = AnalysisResult::new();
        // Fingerprints of each completed process's serialized output
        let mut outputs: HashMap<ProcessId, Fingerprint> = HashMap::new();
        let phase_count = self.graph.phase_count();

        for (phase_no, phase) in self.graph.phases().enumerate() {
            let phase_len = phase.len();
            let mut pending = Vec::new();

            for node in phase {
                let fast = node.process().fast().unwrap_or(self.config.fast);
                let fingerprint = self.fingerprint(node, fast, &outputs)?;

                match self.lookup(node, &fingerprint).await? {
                    Some((output, payload)) => {
                        info!("[{}] cache hit ({})", node.id(), fingerprint.short());
                        outputs.insert(node.id().clone(), payload);
                        result.insert(node.id().clone(), output, true);
                    }
                    None => pending.push(Pending {
                        node,
                        fast,
                        fingerprint,
                    }),
                }
            }

            info!(
                "Phase {}/{}: {} cached, {} to run",
                phase_no + 1,
                phase_count,
                phase_len - pending.len(),
                pending.len()
            );

            let completed = self.execute(pending, &result).await?;
            for (id, output, payload) in completed {
                outputs.insert(id.clone(), payload);
                result.insert(id, output, false);
            }
        }

        Ok(result)
    }

    /// Run one phase's cache misses concurrently, at most
    /// `batching.max_concurrency` processes at a time
    async fn execute(
        &self,
        pending: Vec<Pending<'_>>,
        results: &AnalysisResult,
    ) -> Result<Vec<(ProcessId, ProcessOutput, Fingerprint)>> {
        let limit = self.config.batching.max_concurrency.max(1);
        // Stream indices rather than borrowed tasks so the run future stays Send
        let tasks = &pending;
        let mut running = stream::iter(0..pending.len())
            .map(|index| async move {
                let task = &tasks[index];
                let ctx = ProcessContext::new(
                    &self.dataset,
                    task.fast,
                    &self.config.batching,
                    self.client.as_deref(),
                    results,
                );
                debug!("[{}] running (fast={})", task.node.id(), task.fast);
                let output = task
                    .node
                    .process()
                    .run(&ctx)
                    .await
                    .map_err(|e| AnalysisError::process_failed(task.node.id().clone(), e))?;
                Ok::<_, AnalysisError>((index, output))
            })
            .buffer_unordered(limit);

        let mut completed = Vec::new();
        while let Some(outcome) = running.next().await {
            let (task, output) = match outcome {
                Ok((index, output)) => (&pending[index], output),
                Err(e) => {
                    error!("{}", e);
                    return Err(e);
                }
            };

            let payload = serde_json::to_vec(&output)?;
            let payload_fingerprint = Fingerprint::compute(&payload);
            if let Some(cache) = &self.cache {
                let entry = CacheEntry::new(task.fingerprint, task.node.id().as_str(), payload);
                cache.put(&entry).await?;
                debug!("[{}] stored ({})", task.node.id(), task.fingerprint.short());
            }
            info!("[{}] completed", task.node.id());
            completed.push((task.node.id().clone(), output, payload_fingerprint));
        }

        Ok(completed)
    }

    fn fingerprint(
        &self,
        node: &ProcessNode,
        fast: bool,
        outputs: &HashMap<ProcessId, Fingerprint>,
    ) -> Result<Fingerprint> {
        let mut builder = FingerprintBuilder::new(node.id().as_str())
            .dataset(self.dataset_fingerprint)
            .config(&node.process().public_config())?
            .fast(fast);

        for dep in node.dependencies() {
            let output = outputs
                .get(dep)
                .ok_or_else(|| AnalysisError::AttributeNotFound(dep.clone()))?;
            builder = builder.dependency(dep.as_str(), *output);
        }

        Ok(builder.finish())
    }

    /// Cached output and its payload fingerprint. An entry that no longer
    /// decodes is treated as a miss and overwritten by the next store.
    async fn lookup(
        &self,
        node: &ProcessNode,
        fingerprint: &Fingerprint,
    ) -> Result<Option<(ProcessOutput, Fingerprint)>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(entry) = cache.get(fingerprint).await? else {
            debug!("[{}] cache miss ({})", node.id(), fingerprint.short());
            return Ok(None);
        };

        match entry.decode::<ProcessOutput>() {
            Ok(output) => Ok(Some((output, entry.payload_fingerprint()))),
            Err(e) => {
                warn!("[{}] discarding undecodable cache entry: {}", node.id(), e);
                Ok(None)
            }
        }
    }

    /// Remove every persisted result; returns how many entries were removed
    pub async fn clear_cache(&self) -> Result<usize> {
        self.ensure_open()?;
        let Some(cache) = &self.cache else {
            return Ok(0);
        };
        let removed = cache.clear().await?;
        info!("Cleared {} cache entries from {}", removed, cache.describe());
        Ok(removed)
    }

    /// Release the cache handle. Further calls fail with `Closed`.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(cache) = &self.cache {
            cache.close().await?;
        }
        info!("Analyzer closed");
        Ok(())
    }
}
