//! Mesh data for voxel rendering.
//!
//! # Architecture
//! - [`Mesh`]: the six per-direction sides of a chunk mesh
//! - [`MeshSide`]: vertices, indices and occlusion for one direction
//! - [`Face`]: a single block face with its corners in winding order

mod face;
mod mesh;

pub use face::Face;
pub use mesh::*;
