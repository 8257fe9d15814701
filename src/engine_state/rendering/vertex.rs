//! Vertex data structures for voxel rendering.
//!
//! This module defines the vertex format uploaded to the vertex buffers of a chunk
//! mesh. Occlusion values travel in a parallel buffer so renderers that ignore
//! shading can skip it.

use cgmath::Point3;

/// A vertex of a chunk mesh.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes), chunk-local
///
/// Total size: 12 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Chunk-local position
    pub position: [f32; 3],
}

impl Vertex {
    /// Creates a vertex at an integer corner of the chunk grid.
    pub fn new(pos: Point3<i32>) -> Self {
        Vertex {
            position: [pos.x as f32, pos.y as f32, pos.z as f32],
        }
    }
}
