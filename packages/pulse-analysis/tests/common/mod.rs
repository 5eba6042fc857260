//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pulse_analysis::{AnalysisError, Process, ProcessContext, ProcessId, ProcessOutput};
use pulse_core::{
    CoreApi, EmbeddingDocument, EmbeddingsResponse, SentimentResponse, SentimentResult,
    SimilarityBody, SimilarityResponse, Theme, ThemesResponse,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts `run` calls and answers `result_<n>` for the n-th call.
///
/// The counter is shared through an `Arc` and is not part of the public
/// config, so it never changes the fingerprint.
pub struct CountingProcess {
    pub id: &'static str,
    pub deps: Vec<&'static str>,
    pub label: String,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl CountingProcess {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            deps: Vec::new(),
            label: "default".to_string(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn depends_on(mut self, deps: &[&'static str]) -> Self {
        self.deps = deps.to_vec();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Process for CountingProcess {
    fn id(&self) -> ProcessId {
        ProcessId::from(self.id)
    }

    fn dependencies(&self) -> Vec<ProcessId> {
        self.deps.iter().map(|d| ProcessId::from(*d)).collect()
    }

    fn public_config(&self) -> serde_json::Value {
        json!({ "label": self.label })
    }

    async fn run(&self, ctx: &ProcessContext<'_>) -> pulse_analysis::Result<ProcessOutput> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(AnalysisError::Other(anyhow::anyhow!("{} exploded", self.id)));
        }

        let mut inputs = Vec::new();
        for dep in &self.deps {
            inputs.push(ctx.results().custom(dep)?.clone());
        }
        if inputs.is_empty() {
            Ok(ProcessOutput::Custom(json!(format!("result_{n}"))))
        } else {
            Ok(ProcessOutput::Custom(json!({
                "value": format!("result_{n}"),
                "inputs": inputs,
            })))
        }
    }
}

/// Records how many instances are inside `run` at once
pub struct GaugedProcess {
    pub id: String,
    pub in_flight: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl GaugedProcess {
    pub fn new(id: String, in_flight: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Self {
        Self { id, in_flight, peak }
    }
}

#[async_trait]
impl Process for GaugedProcess {
    fn id(&self) -> ProcessId {
        ProcessId::from(self.id.as_str())
    }

    async fn run(&self, _ctx: &ProcessContext<'_>) -> pulse_analysis::Result<ProcessOutput> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ProcessOutput::Custom(json!(self.id)))
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn reviews() -> Vec<String> {
    [
        "Had a blast! The rollercoasters were thrilling.",
        "Food was overpriced and bland.",
        "Staff were friendly and helpful.",
        "Rides were closed all afternoon.",
        "Fantastic rides! Would come again.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Deterministic remote service.
///
/// Similarity is 1.0 when a text mentions the other item's first word
/// (case-insensitive), 0.1 otherwise; identical strings score 1.0.
#[derive(Default)]
pub struct MockCore {
    pub similarity_calls: AtomicUsize,
    pub theme_calls: AtomicUsize,
    pub sentiment_calls: AtomicUsize,
    pub embedding_calls: AtomicUsize,
}

pub fn mock_sim(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let key = |s: &str| {
        s.split_whitespace()
            .next()
            .unwrap_or("")
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase()
    };
    let (la, lb) = (a.to_lowercase(), b.to_lowercase());
    if (!key(b).is_empty() && la.contains(&key(b))) || (!key(a).is_empty() && lb.contains(&key(a)))
    {
        1.0
    } else {
        0.1
    }
}

#[async_trait]
impl CoreApi for MockCore {
    async fn compare_similarity(
        &self,
        body: &SimilarityBody<String>,
        _fast: bool,
    ) -> pulse_core::Result<SimilarityResponse> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        let (rows, cols): (&[String], &[String]) = match body {
            SimilarityBody::SelfSet { set, .. } => (set, set),
            SimilarityBody::Cross { set_a, set_b, .. } => (set_a, set_b),
        };
        Ok(SimilarityResponse::from_matrix(
            rows.iter()
                .map(|a| cols.iter().map(|b| mock_sim(a, b)).collect())
                .collect(),
        ))
    }

    async fn generate_themes(
        &self,
        _texts: &[String],
        _min_themes: usize,
        _max_themes: usize,
        _fast: bool,
    ) -> pulse_core::Result<ThemesResponse> {
        self.theme_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ThemesResponse {
            themes: vec![
                Theme::from_label("Rides"),
                Theme::from_label("Food"),
                Theme::from_label("Staff"),
            ],
            request_id: None,
        })
    }

    async fn analyze_sentiment(
        &self,
        texts: &[String],
        _fast: bool,
    ) -> pulse_core::Result<SentimentResponse> {
        self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SentimentResponse {
            results: texts
                .iter()
                .map(|t| SentimentResult {
                    sentiment: if t.contains('!') { "positive" } else { "negative" }.to_string(),
                    confidence: 0.8,
                })
                .collect(),
            request_id: None,
        })
    }

    /// Vector is `[word count, '!' count]`
    async fn create_embeddings(
        &self,
        texts: &[String],
        _fast: bool,
    ) -> pulse_core::Result<EmbeddingsResponse> {
        self.embedding_calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingsResponse {
            embeddings: texts
                .iter()
                .map(|t| EmbeddingDocument {
                    id: None,
                    text: t.clone(),
                    vector: vec![
                        t.split_whitespace().count() as f64,
                        t.matches('!').count() as f64,
                    ],
                })
                .collect(),
            request_id: None,
        })
    }
}
