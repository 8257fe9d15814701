//! Mesh data structures for voxel rendering.
//!
//! A chunk mesh is split into six sides, one per face direction, so renderers can
//! skip a whole direction when the camera cannot see it. Each side holds plain
//! vertex, index and occlusion arrays and never touches a graphics API.

use crate::engine_state::{rendering::Vertex, voxels::block::block_side::BlockSide};

use super::face::Face;

/// Geometry of all faces of a chunk that point in one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSide {
    /// The vertex data for this mesh side, four per face
    pub vertices: Vec<Vertex>,
    /// The index data for this mesh side, six per face
    pub indices: Vec<u32>,
    /// One occlusion value per vertex
    pub occlusion: Vec<f32>,
    /// Which block side this mesh represents
    pub side: BlockSide,
}

impl MeshSide {
    /// Creates a new, empty `MeshSide` for the specified block side.
    pub fn new(side: BlockSide) -> Self {
        MeshSide {
            vertices: Vec::new(),
            indices: Vec::new(),
            occlusion: Vec::new(),
            side,
        }
    }

    /// Appends one quad, flat-shaded with `occlusion`.
    pub fn push_face(&mut self, face: &Face, occlusion: f32) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(face.corners.iter().map(|corner| Vertex::new(*corner)));
        self.occlusion.extend([occlusion; 4]);
        self.indices.extend(Face::indices(base));
    }

    /// Number of quads on this side.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// `true` if this side has no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Represents a complete mesh for a voxel chunk with all six sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Array of mesh sides, indexed by `BlockSide` storage index.
    pub sides: [MeshSide; 6],
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Creates a new, empty mesh with all sides initialized.
    pub fn new() -> Self {
        Mesh {
            sides: BlockSide::all().map(MeshSide::new),
        }
    }

    /// The side facing `side`.
    pub fn side(&self, side: BlockSide) -> &MeshSide {
        &self.sides[side.index()]
    }

    /// Appends a face to the side it belongs to.
    pub fn push_face(&mut self, face: &Face, occlusion: f32) {
        self.sides[face.block_side.index()].push_face(face, occlusion);
    }

    /// Total number of quads.
    pub fn face_count(&self) -> usize {
        self.sides.iter().map(MeshSide::face_count).sum()
    }

    /// Total number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.face_count() * 2
    }

    /// Number of vertices for each side, in `BlockSide` order.
    pub fn vertex_lens(&self) -> [usize; 6] {
        self.sides.each_ref().map(|side| side.vertices.len())
    }

    /// Number of indices for each side, in `BlockSide` order.
    pub fn index_lens(&self) -> [usize; 6] {
        self.sides.each_ref().map(|side| side.indices.len())
    }
}
