//! Partitioning and stitching properties over arbitrary list sizes and limits

use ndarray::Array2;
use proptest::prelude::*;
use pulse_core::batching::{
    block_coords, make_cross_chunks, make_self_chunks, plan_bodies, plan_chunks, SimilarityMode,
};
use pulse_core::{make_cross_bodies, stitch_blocks, BatchingConfig, SimilarityBody};

fn limits() -> impl Strategy<Value = BatchingConfig> {
    (1usize..12).prop_flat_map(|max_items| {
        (Just(max_items), 1usize..=max_items)
            .prop_map(|(max_items, half_chunk)| BatchingConfig::new(max_items, half_chunk).unwrap())
    })
}

fn chunk_count(len: usize, config: &BatchingConfig) -> usize {
    if len <= config.half_chunk {
        1
    } else {
        (len + config.half_chunk - 1) / config.half_chunk
    }
}

/// Symmetric synthetic similarity over global indices
fn sim(i: usize, j: usize) -> f64 {
    1.0 / (1.0 + (i as f64 - j as f64).abs()) + (i + j) as f64 * 1e-3
}

/// Blocks the remote endpoint would return, computed from global offsets
fn synth_blocks(
    mode: SimilarityMode,
    a: &[usize],
    b: &[usize],
    config: &BatchingConfig,
    f: impl Fn(usize, usize) -> f64,
) -> Vec<Array2<f64>> {
    let (chunks_a, chunks_b) = plan_chunks(mode, a, b, config);
    block_coords(mode, chunks_a.len(), chunks_b.len())
        .into_iter()
        .map(|(i, j)| {
            let (ra, cb) = (chunks_a[i], chunks_b[j]);
            Array2::from_shape_fn((ra.len(), cb.len()), |(r, c)| f(ra[r], cb[c]))
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_self_chunks_within_limit_is_single(config in limits(), extra in 0usize..12) {
        let len = extra.min(config.max_items);
        let items: Vec<usize> = (0..len).collect();
        let chunks = make_self_chunks(&items, &config);
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0], &items[..]);
    }

    #[test]
    fn prop_self_chunks_over_limit_partition(config in limits(), extra in 1usize..30) {
        let items: Vec<usize> = (0..config.max_items + extra).collect();
        let chunks = make_self_chunks(&items, &config);

        let expected = (items.len() + config.half_chunk - 1) / config.half_chunk;
        prop_assert_eq!(chunks.len(), expected);
        for chunk in &chunks[..chunks.len() - 1] {
            prop_assert_eq!(chunk.len(), config.half_chunk);
        }
        let last = chunks[chunks.len() - 1];
        prop_assert!(!last.is_empty() && last.len() <= config.half_chunk);

        let rejoined: Vec<usize> = chunks.concat();
        prop_assert_eq!(rejoined, items);
    }

    #[test]
    fn prop_cross_bodies_count(config in limits(), la in 0usize..25, lb in 0usize..25, flatten in any::<bool>()) {
        let a: Vec<usize> = (0..la).collect();
        let b: Vec<usize> = (100..100 + lb).collect();
        let bodies = make_cross_bodies(&a, &b, &config, flatten);

        if la + lb <= config.max_items {
            prop_assert_eq!(bodies.len(), 1);
            prop_assert_eq!(
                &bodies[0],
                &SimilarityBody::Cross { set_a: a.clone(), set_b: b.clone(), flatten }
            );
        } else {
            prop_assert_eq!(bodies.len(), chunk_count(la, &config) * chunk_count(lb, &config));
            prop_assert_eq!(make_cross_chunks(&a, &config).len(), chunk_count(la, &config));
        }
        prop_assert!(bodies.iter().all(|body| body.flatten() == flatten));
    }

    #[test]
    fn prop_stitch_self_reconstructs(config in limits(), len in 0usize..30) {
        let items: Vec<usize> = (0..len).collect();
        let mode = SimilarityMode::SelfSimilarity;
        let blocks = synth_blocks(mode, &items, &items, &config, sim);
        prop_assert_eq!(blocks.len(), plan_bodies(mode, &items, &items, &config, false).len());

        let matrix = stitch_blocks(&blocks, &items, &items, mode, &config).unwrap();
        let expected = Array2::from_shape_fn((len, len), |(r, c)| sim(r, c));
        prop_assert_eq!(&matrix, &expected);
        prop_assert_eq!(&matrix, &matrix.t());
    }

    #[test]
    fn prop_stitch_cross_reconstructs(config in limits(), la in 0usize..25, lb in 0usize..25) {
        let a: Vec<usize> = (0..la).collect();
        let b: Vec<usize> = (0..lb).collect();
        let mode = SimilarityMode::Cross;
        // Asymmetric on purpose: cross blocks are never mirrored
        let f = |i: usize, j: usize| (i * 100 + j) as f64;
        let blocks = synth_blocks(mode, &a, &b, &config, f);

        let matrix = stitch_blocks(&blocks, &a, &b, mode, &config).unwrap();
        let expected = Array2::from_shape_fn((la, lb), |(r, c)| f(r, c));
        prop_assert_eq!(matrix, expected);
    }
}

#[test]
fn test_scenario_self_six_items() {
    let config = BatchingConfig::new(5, 2).unwrap();
    let items: Vec<usize> = (0..6).collect();

    let chunks = make_self_chunks(&items, &config);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.len() == 2));

    let coords = block_coords(SimilarityMode::SelfSimilarity, 3, 3);
    assert_eq!(coords, vec![(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)]);

    let mode = SimilarityMode::SelfSimilarity;
    let blocks = synth_blocks(mode, &items, &items, &config, sim);
    assert_eq!(blocks.len(), 6);
    let matrix = stitch_blocks(&blocks, &items, &items, mode, &config).unwrap();
    assert_eq!(matrix.dim(), (6, 6));
    assert_eq!(matrix, matrix.t());
}

#[test]
fn test_scenario_cross_six_by_six() {
    let config = BatchingConfig::new(5, 2).unwrap();
    let a: Vec<usize> = (0..6).collect();
    let b: Vec<usize> = (6..12).collect();

    let bodies = make_cross_bodies(&a, &b, &config, false);
    assert_eq!(bodies.len(), 9);

    let mode = SimilarityMode::Cross;
    let blocks = synth_blocks(mode, &a, &b, &config, |i, j| (i * 100 + j) as f64);
    let matrix = stitch_blocks(&blocks, &a, &b, mode, &config).unwrap();
    assert_eq!(matrix.dim(), (6, 6));
    assert_eq!(matrix[[0, 0]], 6.0);
    assert_eq!(matrix[[5, 5]], 511.0);
}
