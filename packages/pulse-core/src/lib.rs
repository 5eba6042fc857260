/*
 * Pulse Core - batch partitioning and stitching
 *
 * The remote similarity endpoint accepts a bounded number of items per
 * request. This crate splits oversized requests into compliant bodies,
 * fans them out, and reassembles one logically complete matrix.
 *
 * Architecture:
 * - Chunker / Body Builder / Stitcher (batching)
 * - Batched similarity operation (similarity)
 * - Remote boundary port (client)
 * - Wire models (models)
 */

pub mod batching;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod similarity;

// Re-exports
pub use batching::{
    make_cross_bodies, make_self_bodies, make_self_chunks, plan_bodies, stitch_blocks,
    SimilarityBody, SimilarityMode,
};
pub use client::CoreApi;
pub use config::{BatchingConfig, DEFAULT_HALF_CHUNK, DEFAULT_MAX_ITEMS};
pub use error::{CoreError, FailureStage, Result};
pub use models::{
    EmbeddingDocument, EmbeddingsResponse, SentimentResponse, SentimentResult,
    SimilarityResponse, Theme, ThemesResponse,
};
pub use similarity::{compare_similarity, SimilarityMatrix, SimilarityOptions};
