//! Rendering side of the voxel engine.
//!
//! This module turns block data into GPU-ready geometry and decides what is worth
//! drawing. It does not own a graphics API: uploads leave through
//! [`MeshSink`](crate::engine_state::buffer_state::MeshSink).
//!
//! - `meshing`: face-culled chunk meshes
//! - `chunk_buffers`: per-chunk buffer handles and back-side culling
//! - `frustum`: view volume extraction and box classification
//! - `tasks`: background mesh builds

pub mod chunk_buffers;
pub mod frustum;
pub mod meshing;
pub mod tasks;
mod vertex;

pub use vertex::Vertex;
