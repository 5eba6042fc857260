//! Remote boundary (port trait)
//!
//! Transport, authentication and retry policy live behind this trait. The
//! batching and pipeline layers only ever see `CoreApi`, and treat any error
//! it returns as a `CoreError::RemoteCall`.

use crate::batching::SimilarityBody;
use crate::error::Result;
use crate::models::{EmbeddingsResponse, SentimentResponse, SimilarityResponse, ThemesResponse};
use async_trait::async_trait;

#[async_trait]
pub trait CoreApi: Send + Sync {
    /// Compare one body's items; the block must match `body.shape()`
    async fn compare_similarity(
        &self,
        body: &SimilarityBody<String>,
        fast: bool,
    ) -> Result<SimilarityResponse>;

    /// Generate between `min_themes` and `max_themes` themes for `texts`
    async fn generate_themes(
        &self,
        texts: &[String],
        min_themes: usize,
        max_themes: usize,
        fast: bool,
    ) -> Result<ThemesResponse>;

    /// One sentiment classification per text, in input order
    async fn analyze_sentiment(&self, texts: &[String], fast: bool) -> Result<SentimentResponse>;

    /// One embedding document per text, in input order
    async fn create_embeddings(&self, texts: &[String], fast: bool) -> Result<EmbeddingsResponse>;
}
