//! Reassembly of block results into one full similarity matrix

use crate::batching::chunker::{block_coords, plan_chunks, ChunkOffsets, SimilarityMode};
use crate::config::BatchingConfig;
use crate::error::{CoreError, Result};
use ndarray::{s, Array2};

/// Stitch block results (in body enumeration order) into a
/// `(len(full_a), len(full_b))` matrix.
///
/// Self mode places each off-diagonal block twice (direct and transposed)
/// and diagonal blocks once. Any count or shape disagreement with the chunk
/// plan fails; nothing is truncated or padded.
pub fn stitch_blocks<T>(
    blocks: &[Array2<f64>],
    full_a: &[T],
    full_b: &[T],
    mode: SimilarityMode,
    config: &BatchingConfig,
) -> Result<Array2<f64>> {
    if mode == SimilarityMode::SelfSimilarity && full_a.len() != full_b.len() {
        return Err(CoreError::shape_mismatch(
            "self-similarity input lengths",
            full_a.len(),
            full_b.len(),
        ));
    }

    let (chunks_a, chunks_b) = plan_chunks(mode, full_a, full_b, config);
    let rows = ChunkOffsets::new(&chunks_a);
    let cols = ChunkOffsets::new(&chunks_b);
    let coords = block_coords(mode, chunks_a.len(), chunks_b.len());

    if blocks.len() != coords.len() {
        return Err(CoreError::shape_mismatch(
            "block count",
            coords.len(),
            blocks.len(),
        ));
    }

    let mut matrix = Array2::<f64>::zeros((full_a.len(), full_b.len()));

    for (index, (&(i, j), block)) in coords.iter().zip(blocks).enumerate() {
        let row_span = rows.span(i);
        let col_span = cols.span(j);
        let expected = (row_span.len(), col_span.len());
        if block.dim() != expected {
            return Err(CoreError::shape_mismatch(
                format!("block {} at chunk pair ({}, {})", index, i, j),
                format!("{}x{}", expected.0, expected.1),
                format!("{}x{}", block.nrows(), block.ncols()),
            ));
        }

        matrix
            .slice_mut(s![row_span.clone(), col_span.clone()])
            .assign(block);

        if mode == SimilarityMode::SelfSimilarity && i != j {
            matrix
                .slice_mut(s![col_span, row_span])
                .assign(&block.t());
        }
    }

    Ok(matrix)
}
