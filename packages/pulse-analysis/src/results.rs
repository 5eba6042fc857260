//! Result bundle and typed results of the built-in processes

use crate::error::{AnalysisError, Result};
use crate::process::{ProcessId, ProcessOutput};
use crate::processes::{CLUSTER, SENTIMENT, THEME_ALLOCATION, THEME_GENERATION};
use hdbscan::{Hdbscan, HdbscanHyperParams};
use ndarray::Array2;
use pulse_core::{CoreError, SentimentResult, Theme};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ═══════════════════════════════════════════════════════════════════════════
// Result Bundle
// ═══════════════════════════════════════════════════════════════════════════

/// Outputs of one `Analyzer::run`, addressed by process id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    outputs: BTreeMap<ProcessId, ProcessOutput>,
    cache_hits: BTreeSet<ProcessId>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: ProcessId, output: ProcessOutput, from_cache: bool) {
        if from_cache {
            self.cache_hits.insert(id.clone());
        }
        self.outputs.insert(id, output);
    }

    pub fn get(&self, id: &str) -> Result<&ProcessOutput> {
        self.outputs
            .get(id)
            .ok_or_else(|| AnalysisError::AttributeNotFound(ProcessId::from(id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.outputs.contains_key(id)
    }

    /// Ids with a result, in id order
    pub fn ids(&self) -> impl Iterator<Item = &ProcessId> {
        self.outputs.keys()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Ids whose output was served from the cache in this run
    pub fn cache_hits(&self) -> impl Iterator<Item = &ProcessId> {
        self.cache_hits.iter()
    }

    pub fn from_cache(&self, id: &str) -> bool {
        self.cache_hits.contains(id)
    }

    pub fn theme_generation(&self) -> Result<&ThemeGenerationResult> {
        self.typed(THEME_GENERATION, "theme_generation", |output| match output {
            ProcessOutput::ThemeGeneration(result) => Some(result),
            _ => None,
        })
    }

    pub fn sentiment(&self) -> Result<&SentimentAnalysis> {
        self.typed(SENTIMENT, "sentiment", |output| match output {
            ProcessOutput::Sentiment(result) => Some(result),
            _ => None,
        })
    }

    pub fn theme_allocation(&self) -> Result<&ThemeAllocationResult> {
        self.typed(THEME_ALLOCATION, "theme_allocation", |output| match output {
            ProcessOutput::ThemeAllocation(result) => Some(result),
            _ => None,
        })
    }

    pub fn cluster(&self) -> Result<&ClusterResult> {
        self.typed(CLUSTER, "cluster", |output| match output {
            ProcessOutput::Cluster(result) => Some(result),
            _ => None,
        })
    }

    /// Output of a caller-defined process
    pub fn custom(&self, id: &str) -> Result<&serde_json::Value> {
        self.typed(id, "custom", |output| match output {
            ProcessOutput::Custom(value) => Some(value),
            _ => None,
        })
    }

    pub fn into_outputs(self) -> BTreeMap<ProcessId, ProcessOutput> {
        self.outputs
    }

    fn typed<'a, T>(
        &'a self,
        id: &str,
        expected: &'static str,
        pick: impl FnOnce(&'a ProcessOutput) -> Option<&'a T>,
    ) -> Result<&'a T> {
        let output = self.get(id)?;
        pick(output).ok_or_else(|| AnalysisError::UnexpectedOutput {
            process: ProcessId::from(id),
            expected,
            found: output.kind(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Theme Generation
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeGenerationResult {
    pub texts: Vec<String>,
    pub themes: Vec<Theme>,
}

impl ThemeGenerationResult {
    /// Full labels, in generation order
    pub fn labels(&self) -> Vec<String> {
        self.themes.iter().map(|t| t.label.clone()).collect()
    }

    pub fn short_labels(&self) -> Vec<String> {
        self.themes.iter().map(|t| t.short_label.clone()).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Sentiment
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub texts: Vec<String>,
    pub sentiments: Vec<SentimentResult>,
}

impl SentimentAnalysis {
    /// Count per sentiment label
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.sentiments {
            *counts.entry(result.sentiment.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// `(text, sentiment)` pairs in input order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SentimentResult)> {
        self.texts.iter().map(String::as_str).zip(self.sentiments.iter())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Theme Allocation
// ═══════════════════════════════════════════════════════════════════════════

/// Text × theme similarity with assignment helpers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeAllocationResult {
    pub texts: Vec<String>,
    pub themes: Vec<String>,
    /// `(texts.len(), themes.len())`
    pub similarity: Array2<f64>,
    pub single_label: bool,
    pub threshold: f64,
}

impl ThemeAllocationResult {
    pub fn new(
        texts: Vec<String>,
        themes: Vec<String>,
        similarity: Array2<f64>,
        single_label: bool,
        threshold: f64,
    ) -> Result<Self> {
        let expected = (texts.len(), themes.len());
        if similarity.dim() != expected {
            return Err(CoreError::shape_mismatch(
                "allocation similarity",
                format!("{:?}", expected),
                format!("{:?}", similarity.dim()),
            )
            .into());
        }
        Ok(Self {
            texts,
            themes,
            similarity,
            single_label,
            threshold,
        })
    }

    /// Index of the best-scoring theme per text (first on ties)
    pub fn assignments(&self) -> Vec<Option<usize>> {
        self.similarity
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold(None, |best: Option<(usize, f64)>, (j, &score)| match best {
                        Some((_, top)) if top >= score => best,
                        _ => Some((j, score)),
                    })
                    .map(|(j, _)| j)
            })
            .collect()
    }

    /// Best theme per text if its score reaches the configured threshold
    pub fn assign_single(&self) -> Vec<Option<&str>> {
        self.assign_single_at(self.threshold)
    }

    pub fn assign_single_at(&self, threshold: f64) -> Vec<Option<&str>> {
        self.assignments()
            .into_iter()
            .enumerate()
            .map(|(i, best)| {
                best.filter(|&j| self.similarity[[i, j]] >= threshold)
                    .map(|j| self.themes[j].as_str())
            })
            .collect()
    }

    /// Top `k` themes per text by descending score; the threshold is ignored
    pub fn assign_multi(&self, k: usize) -> Vec<Vec<&str>> {
        (0..self.texts.len())
            .map(|i| {
                self.ranked(i)
                    .into_iter()
                    .take(k)
                    .map(|j| self.themes[j].as_str())
                    .collect()
            })
            .collect()
    }

    /// Labels per text honoring `single_label`: at most one theme, or
    /// every theme at or above the threshold in descending score
    pub fn assign(&self) -> Vec<Vec<&str>> {
        if self.single_label {
            return self
                .assign_single()
                .into_iter()
                .map(|theme| theme.into_iter().collect())
                .collect();
        }
        (0..self.texts.len())
            .map(|i| {
                self.ranked(i)
                    .into_iter()
                    .filter(|&j| self.similarity[[i, j]] >= self.threshold)
                    .map(|j| self.themes[j].as_str())
                    .collect()
            })
            .collect()
    }

    fn ranked(&self, row: usize) -> Vec<usize> {
        let scores = self.similarity.row(row);
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Cluster
// ═══════════════════════════════════════════════════════════════════════════

/// Symmetric text × text similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub texts: Vec<String>,
    pub matrix: Array2<f64>,
}

impl ClusterResult {
    /// Closest other text to `index`, with its score
    pub fn most_similar(&self, index: usize) -> Option<(usize, f64)> {
        if index >= self.matrix.nrows() {
            return None;
        }
        self.matrix
            .row(index)
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .fold(None, |best: Option<(usize, f64)>, (j, &score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((j, score)),
            })
    }

    /// HDBSCAN over the similarity rows, each row a text's feature vector.
    ///
    /// Returns a cluster label per text; `None` marks noise. Fewer texts
    /// than `min_cluster_size` (or than two) are all noise.
    pub fn clusters(&self, min_cluster_size: usize) -> Result<Vec<Option<usize>>> {
        let n = self.matrix.nrows();
        let min_cluster_size = min_cluster_size.max(2);
        if n < min_cluster_size {
            return Ok(vec![None; n]);
        }

        let data: Vec<Vec<f64>> = self.matrix.rows().into_iter().map(|row| row.to_vec()).collect();
        let params = HdbscanHyperParams::builder()
            .min_cluster_size(min_cluster_size)
            .min_samples(min_cluster_size)
            .build();
        let labels = Hdbscan::new(&data, params)
            .cluster()
            .map_err(|e| AnalysisError::Other(anyhow::anyhow!("clustering failed: {}", e)))?;

        Ok(labels
            .into_iter()
            .map(|label| usize::try_from(label).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_allocation_assign_single_and_multi() {
        let result = ThemeAllocationResult::new(
            strings(&["d1", "d2"]),
            strings(&["A", "B", "C"]),
            array![[0.1, 0.8, 0.3], [0.5, 0.2, 0.7]],
            true,
            0.6,
        )
        .unwrap();

        assert_eq!(result.assign_single(), vec![Some("B"), Some("C")]);

        let multi = result.assign_multi(2);
        assert_eq!(multi[0], vec!["B", "C"]);
        assert_eq!(multi[1], vec!["C", "A"]);
    }

    #[test]
    fn test_allocation_threshold_filters() {
        let result = ThemeAllocationResult::new(
            strings(&["doc1", "doc2", "doc3"]),
            strings(&["Alpha", "Beta"]),
            array![[0.7, 0.2], [0.3, 0.6], [0.8, 0.6]],
            true,
            0.5,
        )
        .unwrap();

        assert_eq!(result.assignments(), vec![Some(0), Some(1), Some(0)]);
        assert_eq!(
            result.assign_single(),
            vec![Some("Alpha"), Some("Beta"), Some("Alpha")]
        );
        assert_eq!(result.assign_single_at(0.75), vec![None, None, Some("Alpha")]);
    }

    #[test]
    fn test_allocation_multi_label_assign() {
        let result = ThemeAllocationResult::new(
            strings(&["t"]),
            strings(&["A", "B", "C"]),
            array![[0.55, 0.9, 0.1]],
            false,
            0.5,
        )
        .unwrap();
        assert_eq!(result.assign(), vec![vec!["B", "A"]]);
    }

    #[test]
    fn test_allocation_shape_checked() {
        let err = ThemeAllocationResult::new(
            strings(&["a", "b"]),
            strings(&["A"]),
            Array2::zeros((2, 2)),
            true,
            0.5,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Core(CoreError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_allocation_without_themes() {
        let result =
            ThemeAllocationResult::new(strings(&["a"]), vec![], Array2::zeros((1, 0)), true, 0.5)
                .unwrap();
        assert_eq!(result.assign_single(), vec![None]);
        assert_eq!(result.assign_multi(3), vec![Vec::<&str>::new()]);
    }

    #[test]
    fn test_sentiment_summary() {
        let sentiments = ["positive", "negative", "positive"]
            .iter()
            .map(|s| SentimentResult {
                sentiment: s.to_string(),
                confidence: 0.5,
            })
            .collect();
        let result = SentimentAnalysis {
            texts: strings(&["I love it", "I hate it", "Love"]),
            sentiments,
        };

        let summary = result.summary();
        assert_eq!(summary.get("positive"), Some(&2));
        assert_eq!(summary.get("negative"), Some(&1));
        assert_eq!(result.iter().count(), 3);
    }

    #[test]
    fn test_cluster_helpers() {
        let result = ClusterResult {
            texts: strings(&["a", "b", "c"]),
            matrix: array![[1.0, 0.1, 0.2], [0.1, 1.0, 0.3], [0.2, 0.3, 1.0]],
        };

        assert_eq!(result.most_similar(0), Some((2, 0.2)));
        assert_eq!(result.most_similar(9), None);
        // Too few texts to form a cluster of five
        assert_eq!(result.clusters(5).unwrap(), vec![None, None, None]);
    }

    #[test]
    fn test_clusters_group_close_texts() {
        let result = ClusterResult {
            texts: strings(&["a", "b", "c", "d", "e", "f"]),
            matrix: array![
                [1.0, 0.95, 0.9, 0.1, 0.1, 0.1],
                [0.95, 1.0, 0.92, 0.1, 0.1, 0.1],
                [0.9, 0.92, 1.0, 0.1, 0.1, 0.1],
                [0.1, 0.1, 0.1, 1.0, 0.93, 0.9],
                [0.1, 0.1, 0.1, 0.93, 1.0, 0.95],
                [0.1, 0.1, 0.1, 0.9, 0.95, 1.0]
            ],
        };

        let labels = result.clusters(2).unwrap();
        assert_eq!(labels.len(), 6);
        assert!(labels.iter().all(Option::is_some));
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_clusters_empty() {
        let result = ClusterResult {
            texts: Vec::new(),
            matrix: Array2::zeros((0, 0)),
        };
        assert_eq!(result.clusters(2).unwrap(), Vec::<Option<usize>>::new());
    }

    #[test]
    fn test_bundle_missing_and_wrong_kind() {
        let mut bundle = AnalysisResult::new();
        assert!(matches!(
            bundle.theme_generation(),
            Err(AnalysisError::AttributeNotFound(_))
        ));

        bundle.insert(
            ProcessId::from(THEME_GENERATION),
            ProcessOutput::Custom(serde_json::json!(1)),
            true,
        );
        assert!(matches!(
            bundle.theme_generation(),
            Err(AnalysisError::UnexpectedOutput { found: "custom", .. })
        ));
        assert_eq!(bundle.custom(THEME_GENERATION).unwrap(), &serde_json::json!(1));
        assert!(bundle.from_cache(THEME_GENERATION));
        assert_eq!(bundle.ids().count(), 1);
    }
}
