//! Batched similarity operation
//!
//! Plans bodies, fans them out to the remote boundary with bounded
//! concurrency, and stitches the block results back together. Callers get
//! one full matrix and never see the per-request item limit.

use crate::batching::{plan_bodies, stitch_blocks, SimilarityMode};
use crate::client::CoreApi;
use crate::config::BatchingConfig;
use crate::error::{CoreError, Result};
use futures::stream::{self, StreamExt};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-call options forwarded to every body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimilarityOptions {
    /// Ask the service for row-major flattened blocks
    pub flatten: bool,
    /// Use the service's fast model
    pub fast: bool,
}

/// Fully assembled similarity result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    pub mode: SimilarityMode,
    pub matrix: Array2<f64>,
    pub flatten: bool,
}

impl SimilarityMatrix {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.dim()
    }

    /// Row-major values of the full matrix
    pub fn flattened(&self) -> Vec<f64> {
        self.matrix.iter().copied().collect()
    }

    pub fn into_matrix(self) -> Array2<f64> {
        self.matrix
    }
}

/// Similarity of `set_a` against itself (`set_b == None`) or against `set_b`.
///
/// The mode is decided once: no `set_b`, or a `set_b` equal to `set_a`,
/// takes the symmetric self path. Any body failure aborts the whole
/// operation and drops the bodies still in flight.
pub async fn compare_similarity(
    client: &dyn CoreApi,
    config: &BatchingConfig,
    set_a: &[String],
    set_b: Option<&[String]>,
    options: SimilarityOptions,
) -> Result<SimilarityMatrix> {
    config.validate()?;

    let full_b = set_b.unwrap_or(set_a);
    let mode = match set_b {
        None => SimilarityMode::SelfSimilarity,
        Some(b) => SimilarityMode::detect(set_a, b),
    };

    if set_a.is_empty() || full_b.is_empty() {
        debug!("compare_similarity: empty input, skipping remote calls");
        return Ok(SimilarityMatrix {
            mode,
            matrix: Array2::zeros((set_a.len(), full_b.len())),
            flatten: options.flatten,
        });
    }

    let start = Instant::now();
    let bodies = plan_bodies(mode, set_a, full_b, config, options.flatten);

    info!(
        "compare_similarity: {} mode, {}x{} items -> {} bodies (max_items={}, half_chunk={}, concurrency={})",
        mode.as_str(),
        set_a.len(),
        full_b.len(),
        bodies.len(),
        config.max_items,
        config.half_chunk,
        config.max_concurrency
    );

    let mut blocks: Vec<Option<Array2<f64>>> = vec![None; bodies.len()];

    // Index-based so the per-body futures borrow `bodies` with one concrete
    // lifetime and the whole call stays Send.
    let bodies_ref = &bodies;
    let mut in_flight = stream::iter(0..bodies.len())
        .map(|index| async move {
            let body = &bodies_ref[index];
            let (rows, cols) = body.shape();
            let response = client
                .compare_similarity(body, options.fast)
                .await
                .map_err(|e| tag_body(e, index))?;
            let block = response.into_block(rows, cols)?;
            Ok::<_, CoreError>((index, block))
        })
        .buffer_unordered(config.max_concurrency);

    // Completion order is arbitrary; blocks are slotted by body index.
    while let Some(result) = in_flight.next().await {
        match result {
            Ok((index, block)) => blocks[index] = Some(block),
            Err(e) => {
                warn!("compare_similarity: aborting after body failure: {}", e);
                return Err(e);
            }
        }
    }
    drop(in_flight);

    let blocks = blocks
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            block.ok_or_else(|| CoreError::shape_mismatch(format!("block {}", index), "a result", "none"))
        })
        .collect::<Result<Vec<_>>>()?;

    let matrix = stitch_blocks(&blocks, set_a, full_b, mode, config)?;

    info!(
        "compare_similarity: stitched {}x{} matrix in {}ms",
        matrix.nrows(),
        matrix.ncols(),
        start.elapsed().as_millis()
    );

    Ok(SimilarityMatrix {
        mode,
        matrix,
        flatten: options.flatten,
    })
}

fn tag_body(err: CoreError, index: usize) -> CoreError {
    match err {
        CoreError::RemoteCall { operation, message } => CoreError::RemoteCall {
            operation: format!("{} (body {})", operation, index),
            message,
        },
        other => other,
    }
}
