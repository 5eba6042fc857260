//! Batching layer: hides the remote per-request item limit
//!
//! - `chunker`: chunk plans and block enumeration order
//! - `body`: request payloads per chunk pair
//! - `stitch`: reassembly of block results into the full matrix
//!
//! Body Builder and Stitcher both derive their chunk pairs from
//! `chunker::block_coords`, so block `k` always belongs to body `k`.

pub mod body;
pub mod chunker;
pub mod stitch;

pub use body::{make_cross_bodies, make_self_bodies, plan_bodies, SimilarityBody};
pub use chunker::{
    block_coords, make_cross_chunks, make_self_chunks, plan_chunks, ChunkOffsets, SimilarityMode,
};
pub use stitch::stitch_blocks;
