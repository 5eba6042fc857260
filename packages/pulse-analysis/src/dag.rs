//! Process dependency graph
//!
//! Nodes live in a petgraph arena; edges run from a dependency to its
//! dependent. Resolution injects default-configured processes for missing
//! dependencies, then groups the nodes into Kahn phases: every process in a
//! phase depends only on processes of earlier phases.

use crate::error::{AnalysisError, Result};
use crate::process::{Process, ProcessId};
use crate::registry::ProcessRegistry;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A resolved process with its declared dependencies
#[derive(Clone)]
pub struct ProcessNode {
    id: ProcessId,
    process: Arc<dyn Process>,
    dependencies: Vec<ProcessId>,
    injected: bool,
}

impl ProcessNode {
    fn new(process: Arc<dyn Process>, injected: bool) -> Self {
        Self {
            id: process.id(),
            dependencies: process.dependencies(),
            process,
            injected,
        }
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn process(&self) -> &Arc<dyn Process> {
        &self.process
    }

    pub fn dependencies(&self) -> &[ProcessId] {
        &self.dependencies
    }

    /// True when the node was built from the registry, not listed by the caller
    pub fn is_injected(&self) -> bool {
        self.injected
    }
}

impl std::fmt::Debug for ProcessNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessNode")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("injected", &self.injected)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ProcessGraph {
    graph: DiGraph<ProcessNode, ()>,
    index: HashMap<ProcessId, NodeIndex>,
    phases: Vec<Vec<NodeIndex>>,
}

impl ProcessGraph {
    /// Resolve the explicit processes plus their transitive dependencies
    pub fn resolve(explicit: Vec<Arc<dyn Process>>, registry: &ProcessRegistry) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for process in explicit {
            let node = ProcessNode::new(process, false);
            if index.contains_key(&node.id) {
                return Err(AnalysisError::configuration(format!(
                    "process '{}' is listed more than once",
                    node.id
                )));
            }
            let id = node.id.clone();
            index.insert(id, graph.add_node(node));
        }

        // Inject missing dependencies transitively
        let mut pending: Vec<NodeIndex> = graph.node_indices().collect();
        let mut edges = Vec::new();
        while let Some(node_idx) = pending.pop() {
            let dependencies = graph[node_idx].dependencies.clone();
            for dep in dependencies {
                let dep_idx = match index.get(&dep) {
                    Some(&idx) => idx,
                    None => {
                        let process = registry.create(dep.as_str()).ok_or_else(|| {
                            AnalysisError::configuration(format!(
                                "process '{}' depends on '{}', which is neither listed nor registered",
                                graph[node_idx].id, dep
                            ))
                        })?;
                        let node = ProcessNode::new(process, true);
                        if node.id != dep {
                            return Err(AnalysisError::configuration(format!(
                                "registry entry '{}' builds a process with id '{}'",
                                dep, node.id
                            )));
                        }
                        let idx = graph.add_node(node);
                        index.insert(dep, idx);
                        pending.push(idx);
                        idx
                    }
                };
                edges.push((dep_idx, node_idx));
            }
        }
        for (from, to) in edges {
            graph.update_edge(from, to, ());
        }

        let phases = Self::phases_of(&graph)?;
        Ok(Self {
            graph,
            index,
            phases,
        })
    }

    /// Kahn levels, each sorted by id
    fn phases_of(graph: &DiGraph<ProcessNode, ()>) -> Result<Vec<Vec<NodeIndex>>> {
        let mut in_degree: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|idx| {
                let degree = graph.neighbors_directed(idx, Direction::Incoming).count();
                (idx, degree)
            })
            .collect();

        let mut phases = Vec::new();
        while !in_degree.is_empty() {
            let mut ready: Vec<NodeIndex> = in_degree
                .iter()
                .filter(|(_, &degree)| degree == 0)
                .map(|(&idx, _)| idx)
                .collect();

            if ready.is_empty() {
                let remaining: BTreeSet<&str> =
                    in_degree.keys().map(|&idx| graph[idx].id.as_str()).collect();
                return Err(AnalysisError::DagCycleDetected(
                    remaining.into_iter().collect::<Vec<_>>().join(", "),
                ));
            }
            ready.sort_by(|a, b| graph[*a].id.cmp(&graph[*b].id));

            for &idx in &ready {
                in_degree.remove(&idx);
                for dependent in graph.neighbors_directed(idx, Direction::Outgoing) {
                    if let Some(degree) = in_degree.get_mut(&dependent) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
            phases.push(ready);
        }

        Ok(phases)
    }

    /// Nodes grouped by phase, in execution order
    pub fn phases(&self) -> impl Iterator<Item = Vec<&ProcessNode>> + '_ {
        self.phases
            .iter()
            .map(|phase| phase.iter().map(|&idx| &self.graph[idx]).collect())
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn node(&self, id: &str) -> Option<&ProcessNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Ids of the processes the caller did not list
    pub fn injected(&self) -> Vec<&ProcessId> {
        let mut ids: Vec<_> = self
            .graph
            .node_weights()
            .filter(|node| node.injected)
            .map(|node| &node.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Execution plan as text (for logging)
    pub fn execution_plan(&self) -> String {
        self.phases()
            .enumerate()
            .map(|(i, phase)| {
                let names: Vec<&str> = phase.iter().map(|node| node.id.as_str()).collect();
                if names.len() > 1 {
                    format!("Phase {}: {} (parallel)", i + 1, names.join(" ∥ "))
                } else {
                    format!("Phase {}: {}", i + 1, names.join(""))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessContext, ProcessOutput};
    use crate::processes::{SentimentProcess, ThemeAllocation, ThemeGeneration};
    use async_trait::async_trait;

    struct Step {
        id: &'static str,
        deps: Vec<&'static str>,
    }

    fn step(id: &'static str, deps: &[&'static str]) -> Arc<dyn Process> {
        Arc::new(Step {
            id,
            deps: deps.to_vec(),
        })
    }

    #[async_trait]
    impl Process for Step {
        fn id(&self) -> ProcessId {
            ProcessId::from(self.id)
        }

        fn dependencies(&self) -> Vec<ProcessId> {
            self.deps.iter().map(|d| ProcessId::from(*d)).collect()
        }

        async fn run(&self, _ctx: &ProcessContext<'_>) -> Result<ProcessOutput> {
            Ok(ProcessOutput::Custom(serde_json::json!(self.id)))
        }
    }

    fn phase_ids(graph: &ProcessGraph) -> Vec<Vec<String>> {
        graph
            .phases()
            .map(|phase| phase.iter().map(|n| n.id().to_string()).collect())
            .collect()
    }

    #[test]
    fn test_injects_default_theme_generation() {
        let graph = ProcessGraph::resolve(
            vec![Arc::new(ThemeAllocation::default())],
            &ProcessRegistry::with_builtins(),
        )
        .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.injected(), vec![&ProcessId::from("theme_generation")]);
        assert_eq!(
            phase_ids(&graph),
            vec![vec!["theme_generation"], vec!["theme_allocation"]]
        );
        assert!(graph.node("theme_generation").unwrap().is_injected());
    }

    #[test]
    fn test_explicit_dependency_wins_over_default() {
        let graph = ProcessGraph::resolve(
            vec![
                Arc::new(ThemeAllocation::default()),
                Arc::new(ThemeGeneration::new(3, 7)),
            ],
            &ProcessRegistry::with_builtins(),
        )
        .unwrap();

        assert!(graph.injected().is_empty());
        let node = graph.node("theme_generation").unwrap();
        assert_eq!(node.process().public_config()["min_themes"], 3);
    }

    #[test]
    fn test_parallel_phase_is_sorted() {
        let graph = ProcessGraph::resolve(
            vec![
                step("c", &["a"]),
                step("b", &[]),
                step("a", &[]),
                step("d", &["b", "c"]),
            ],
            &ProcessRegistry::new(),
        )
        .unwrap();

        assert_eq!(
            phase_ids(&graph),
            vec![vec!["a", "b"], vec!["c"], vec!["d"]]
        );
        assert_eq!(
            graph.execution_plan(),
            "Phase 1: a ∥ b (parallel)\nPhase 2: c\nPhase 3: d"
        );
    }

    #[test]
    fn test_transitive_injection() {
        let mut registry = ProcessRegistry::new();
        registry.register("base", || step("base", &[]));
        registry.register("mid", || step("mid", &["base"]));

        let graph = ProcessGraph::resolve(vec![step("top", &["mid"])], &registry).unwrap();
        assert_eq!(phase_ids(&graph), vec![vec!["base"], vec!["mid"], vec!["top"]]);
        assert_eq!(graph.injected().len(), 2);
    }

    #[test]
    fn test_unknown_dependency() {
        let err = ProcessGraph::resolve(vec![step("top", &["ghost"])], &ProcessRegistry::new())
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert!(message.contains("ghost") && message.contains("top"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = ProcessGraph::resolve(
            vec![
                Arc::new(SentimentProcess::new()),
                Arc::new(SentimentProcess::new().with_fast(true)),
            ],
            &ProcessRegistry::with_builtins(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn test_cycle_detected() {
        let err = ProcessGraph::resolve(
            vec![step("a", &["b"]), step("b", &["a"]), step("c", &[])],
            &ProcessRegistry::new(),
        )
        .unwrap_err();
        match err {
            AnalysisError::DagCycleDetected(ids) => assert_eq!(ids, "a, b"),
            other => panic!("unexpected error: {other}"),
        }

        let err = ProcessGraph::resolve(vec![step("self", &["self"])], &ProcessRegistry::new())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DagCycleDetected(_)));
    }

    #[test]
    fn test_empty_graph() {
        let graph = ProcessGraph::resolve(Vec::new(), &ProcessRegistry::with_builtins()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.phase_count(), 0);
        assert_eq!(graph.execution_plan(), "");
    }
}
