//! Chunk planning for item-limited requests
//!
//! Chunks are borrowed contiguous slices of the caller's list, so a plan
//! never copies items and always partitions the source without gaps or
//! overlaps.

use crate::config::BatchingConfig;
use std::ops::Range;

/// Whether a similarity operation compares one set with itself or two sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SimilarityMode {
    /// One list against itself; the matrix is symmetric
    SelfSimilarity,
    /// Two distinct lists; no symmetry assumed
    Cross,
}

impl SimilarityMode {
    /// Self mode iff both sides denote the same list (identity or content)
    pub fn detect<T: PartialEq>(set_a: &[T], set_b: &[T]) -> Self {
        if std::ptr::eq(set_a, set_b) || set_a == set_b {
            SimilarityMode::SelfSimilarity
        } else {
            SimilarityMode::Cross
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMode::SelfSimilarity => "self",
            SimilarityMode::Cross => "cross",
        }
    }
}

/// Split one list for self-similarity.
///
/// Lists within `max_items` stay whole; longer lists become consecutive
/// `half_chunk`-sized slices with a shorter (never empty) remainder.
pub fn make_self_chunks<'a, T>(items: &'a [T], config: &BatchingConfig) -> Vec<&'a [T]> {
    if items.len() <= config.max_items {
        vec![items]
    } else {
        items.chunks(config.half_chunk).collect()
    }
}

/// Split one side of a cross-similarity request once the pair is over the limit.
///
/// A side of at most `half_chunk` items stays whole.
pub fn make_cross_chunks<'a, T>(items: &'a [T], config: &BatchingConfig) -> Vec<&'a [T]> {
    if items.len() <= config.half_chunk {
        vec![items]
    } else {
        items.chunks(config.half_chunk).collect()
    }
}

/// Chunks for both sides of an operation, as the Body Builder and the
/// Stitcher must both see them.
pub fn plan_chunks<'a, T>(
    mode: SimilarityMode,
    set_a: &'a [T],
    set_b: &'a [T],
    config: &BatchingConfig,
) -> (Vec<&'a [T]>, Vec<&'a [T]>) {
    match mode {
        SimilarityMode::SelfSimilarity => {
            let chunks = make_self_chunks(set_a, config);
            (chunks.clone(), chunks)
        }
        SimilarityMode::Cross => {
            if set_a.len() + set_b.len() <= config.max_items {
                (vec![set_a], vec![set_b])
            } else {
                (
                    make_cross_chunks(set_a, config),
                    make_cross_chunks(set_b, config),
                )
            }
        }
    }
}

/// Enumeration order of chunk pairs (row chunk, column chunk).
///
/// Self mode walks the upper triangle including the diagonal; cross mode
/// walks the full grid row by row. Bodies and blocks share this order.
pub fn block_coords(mode: SimilarityMode, chunks_a: usize, chunks_b: usize) -> Vec<(usize, usize)> {
    match mode {
        SimilarityMode::SelfSimilarity => (0..chunks_a)
            .flat_map(|i| (i..chunks_a).map(move |j| (i, j)))
            .collect(),
        SimilarityMode::Cross => (0..chunks_a)
            .flat_map(|i| (0..chunks_b).map(move |j| (i, j)))
            .collect(),
    }
}

/// Cumulative offsets of a chunk list, mapping each chunk to its span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOffsets {
    offsets: Vec<usize>,
}

impl ChunkOffsets {
    pub fn new<T>(chunks: &[&[T]]) -> Self {
        let mut offsets = Vec::with_capacity(chunks.len() + 1);
        offsets.push(0);
        for chunk in chunks {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + chunk.len());
        }
        Self { offsets }
    }

    pub fn span(&self, index: usize) -> Range<usize> {
        self.offsets[index]..self.offsets[index + 1]
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }
}
