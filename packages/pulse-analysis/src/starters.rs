//! One-call analyses
//!
//! Each starter builds an uncached [`Analyzer`] around a single built-in
//! process, runs it once and returns the typed result. `embeddings` has no
//! process and calls the client directly.

use crate::analyzer::{Analyzer, AnalyzerBuilder};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::processes::{ClusterProcess, SentimentProcess, ThemeAllocation};
use crate::results::{AnalysisResult, ClusterResult, SentimentAnalysis, ThemeAllocationResult};
use ndarray::Array2;
use pulse_core::CoreApi;
use std::sync::Arc;

async fn run_once(
    texts: &[String],
    client: Arc<dyn CoreApi>,
    configure: impl FnOnce(AnalyzerBuilder) -> AnalyzerBuilder,
) -> Result<AnalysisResult> {
    let builder = Analyzer::builder(texts.iter().cloned())
        .client(client)
        .config(AnalyzerConfig::uncached());
    let analyzer = configure(builder).build()?;
    let result = analyzer.run().await;
    analyzer.close().await?;
    result
}

/// Allocate `texts` to `themes`, generating the themes first when none are given
pub async fn theme_allocation(
    texts: &[String],
    themes: Option<Vec<String>>,
    client: Arc<dyn CoreApi>,
) -> Result<ThemeAllocationResult> {
    let process = match themes {
        Some(themes) => ThemeAllocation::with_themes(themes),
        None => ThemeAllocation::default(),
    };
    let result = run_once(texts, client, |b| b.process(process)).await?;
    result.theme_allocation().cloned()
}

pub async fn sentiment_analysis(
    texts: &[String],
    client: Arc<dyn CoreApi>,
) -> Result<SentimentAnalysis> {
    let result = run_once(texts, client, |b| b.process(SentimentProcess::new())).await?;
    result.sentiment().cloned()
}

pub async fn cluster_analysis(texts: &[String], client: Arc<dyn CoreApi>) -> Result<ClusterResult> {
    let result = run_once(texts, client, |b| b.process(ClusterProcess::new())).await?;
    result.cluster().cloned()
}

/// Embedding matrix, one row per text
pub async fn embeddings(texts: &[String], client: Arc<dyn CoreApi>) -> Result<Array2<f64>> {
    let response = client.create_embeddings(texts, false).await?;
    Ok(response.into_matrix(texts.len())?)
}
