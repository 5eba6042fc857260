//! Request bodies for the similarity endpoint

use crate::batching::chunker::{block_coords, plan_chunks, SimilarityMode};
use crate::config::BatchingConfig;
use serde::{Deserialize, Serialize};

/// One unit of remote similarity work.
///
/// Serializes to `{set_a, set_b, flatten}` or `{set, flatten}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimilarityBody<T> {
    Cross {
        set_a: Vec<T>,
        set_b: Vec<T>,
        flatten: bool,
    },
    SelfSet {
        set: Vec<T>,
        flatten: bool,
    },
}

impl<T> SimilarityBody<T> {
    /// Shape of the block result this body must produce
    pub fn shape(&self) -> (usize, usize) {
        match self {
            SimilarityBody::Cross { set_a, set_b, .. } => (set_a.len(), set_b.len()),
            SimilarityBody::SelfSet { set, .. } => (set.len(), set.len()),
        }
    }

    /// Items sent to the remote endpoint
    pub fn item_count(&self) -> usize {
        match self {
            SimilarityBody::Cross { set_a, set_b, .. } => set_a.len() + set_b.len(),
            SimilarityBody::SelfSet { set, .. } => set.len(),
        }
    }

    pub fn flatten(&self) -> bool {
        match self {
            SimilarityBody::Cross { flatten, .. } | SimilarityBody::SelfSet { flatten, .. } => {
                *flatten
            }
        }
    }
}

/// Bodies for self-similarity, one per upper-triangle chunk pair.
///
/// Diagonal pairs become `{set}` bodies; off-diagonal pairs are sent as
/// cross bodies and mirrored later by the Stitcher.
pub fn make_self_bodies<T: Clone>(
    items: &[T],
    config: &BatchingConfig,
    flatten: bool,
) -> Vec<SimilarityBody<T>> {
    plan_bodies(SimilarityMode::SelfSimilarity, items, items, config, flatten)
}

/// Bodies for cross-similarity.
///
/// A pair that fits within `max_items` is sent unsplit; otherwise each side
/// is chunked independently and the cartesian product is emitted.
pub fn make_cross_bodies<T: Clone>(
    set_a: &[T],
    set_b: &[T],
    config: &BatchingConfig,
    flatten: bool,
) -> Vec<SimilarityBody<T>> {
    plan_bodies(SimilarityMode::Cross, set_a, set_b, config, flatten)
}

/// Bodies in block enumeration order for either mode
pub fn plan_bodies<T: Clone>(
    mode: SimilarityMode,
    set_a: &[T],
    set_b: &[T],
    config: &BatchingConfig,
    flatten: bool,
) -> Vec<SimilarityBody<T>> {
    let (chunks_a, chunks_b) = plan_chunks(mode, set_a, set_b, config);

    block_coords(mode, chunks_a.len(), chunks_b.len())
        .into_iter()
        .map(|(i, j)| match mode {
            SimilarityMode::SelfSimilarity if i == j => SimilarityBody::SelfSet {
                set: chunks_a[i].to_vec(),
                flatten,
            },
            _ => SimilarityBody::Cross {
                set_a: chunks_a[i].to_vec(),
                set_b: chunks_b[j].to_vec(),
                flatten,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_items: usize, half_chunk: usize) -> BatchingConfig {
        BatchingConfig::new(max_items, half_chunk).unwrap()
    }

    #[test]
    fn test_make_cross_bodies_combined() {
        let set_a: Vec<u32> = (0..3).collect();
        let set_b: Vec<u32> = (0..4).collect();
        let bodies = make_cross_bodies(&set_a, &set_b, &BatchingConfig::default(), true);
        assert_eq!(
            bodies,
            vec![SimilarityBody::Cross {
                set_a: set_a.clone(),
                set_b: set_b.clone(),
                flatten: true
            }]
        );
    }

    #[test]
    fn test_make_cross_bodies_small_a() {
        let set_a: Vec<u32> = (0..2).collect();
        let set_b: Vec<u32> = (0..7).collect();
        let bodies = make_cross_bodies(&set_a, &set_b, &config(5, 2), false);
        assert_eq!(bodies.len(), 4);
        for body in &bodies {
            match body {
                SimilarityBody::Cross { set_a: a, flatten, .. } => {
                    assert_eq!(a, &set_a);
                    assert!(!flatten);
                }
                other => panic!("unexpected body {:?}", other),
            }
        }
    }

    #[test]
    fn test_make_cross_bodies_small_b() {
        let set_a: Vec<u32> = (0..4).collect();
        let set_b: Vec<u32> = (0..2).collect();
        let bodies = make_cross_bodies(&set_a, &set_b, &config(5, 2), true);
        assert_eq!(bodies.len(), 2);
        for body in &bodies {
            assert!(body.flatten());
            if let SimilarityBody::Cross { set_b: b, .. } = body {
                assert_eq!(b, &set_b);
            }
        }
    }

    #[test]
    fn test_make_cross_bodies_both_large() {
        let set_a: Vec<u32> = (0..7).collect();
        let set_b: Vec<u32> = (0..7).collect();
        let bodies = make_cross_bodies(&set_a, &set_b, &config(5, 2), false);
        assert_eq!(bodies.len(), 16);
        assert!(bodies.iter().all(|b| b.item_count() <= 5));
    }

    #[test]
    fn test_make_self_bodies_unsplit() {
        let items = vec!["a", "b", "c"];
        let bodies = make_self_bodies(&items, &config(5, 2), false);
        assert_eq!(
            bodies,
            vec![SimilarityBody::SelfSet {
                set: items.clone(),
                flatten: false
            }]
        );
    }

    #[test]
    fn test_make_self_bodies_upper_triangle_only() {
        let items: Vec<u32> = (0..6).collect();
        let bodies = make_self_bodies(&items, &config(5, 2), false);
        assert_eq!(bodies.len(), 6);

        // (0,0) diagonal then (0,1) off-diagonal
        assert_eq!(
            bodies[0],
            SimilarityBody::SelfSet {
                set: vec![0, 1],
                flatten: false
            }
        );
        assert_eq!(
            bodies[1],
            SimilarityBody::Cross {
                set_a: vec![0, 1],
                set_b: vec![2, 3],
                flatten: false
            }
        );
        // No lower-triangle body such as (1,0)
        assert!(!bodies.iter().any(|b| matches!(
            b,
            SimilarityBody::Cross { set_a, set_b, .. } if set_a == &vec![2, 3] && set_b == &vec![0, 1]
        )));
    }

    #[test]
    fn test_body_serialization_shape() {
        let body = SimilarityBody::Cross {
            set_a: vec!["x".to_string()],
            set_b: vec!["y".to_string()],
            flatten: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["set_a"][0], "x");
        assert_eq!(json["set_b"][0], "y");
        assert_eq!(json["flatten"], true);

        let body: SimilarityBody<String> = SimilarityBody::SelfSet {
            set: vec!["x".to_string()],
            flatten: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["set"][0], "x");
        assert!(json.get("set_a").is_none());
    }
}
