//! # Voxel World
//!
//! This module contains the data side of the engine: the spatial types used to
//! address chunks and blocks, the chunk storage itself, the world that owns every
//! chunk, and the occlusion sampler that bakes per-face shading values.
//!
//! ## Architecture
//!
//! * **Coordinates**: integer chunk and block addresses plus conversions between them
//! * **Block**: the per-block attributes (`visible`, per-face `occlusion`)
//! * **Chunk**: a 16x16x16 block store, its mesh lifecycle state and GPU handles
//! * **World**: the map from chunk coordinate to chunk and its neighbour lookups
//! * **Occlusion**: golden-spiral ray sampling across chunk boundaries
//!
//! ## Thread Safety
//!
//! Chunks are only ever mutated on the main thread. Background mesh builds work on
//! `Arc` snapshots of block stores, and edits use copy-on-write, so a worker never
//! sees a half-applied edit and no locks are needed.

pub mod block;
pub mod chunk;
pub mod coords;
pub mod occlusion;
pub mod world;
