//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the geometry attached
//! to each direction: neighbour offsets, outward normals and face centres.

use cgmath::{Vector3, Zero};

/// Represents the six possible faces of a voxel block.
///
/// The discriminants are the storage index used everywhere a per-direction
/// array appears (occlusion values, mesh sides, neighbour lists).
///
/// The order is: [FRONT, BACK, LEFT, RIGHT, TOP, BOTTOM]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The left face (facing negative X)
    LEFT = 2,

    /// The right face (facing positive X)
    RIGHT = 3,

    /// The top face (facing positive Y)
    TOP = 4,

    /// The bottom face (facing negative Y)
    BOTTOM = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in storage order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::TOP,
            BlockSide::BOTTOM,
        ]
    }

    /// Storage index of this side.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The side facing the opposite way.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::BOTTOM => BlockSide::TOP,
        }
    }

    /// Integer step to the neighbouring cell (or chunk) through this side.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
        }
    }

    /// Outward unit normal of this side.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }

    /// Offset from a block's minimum corner to the centre of this face.
    pub fn face_center(self) -> Vector3<f32> {
        match self {
            BlockSide::FRONT => Vector3::new(0.5, 0.5, 1.0),
            BlockSide::BACK => Vector3::new(0.5, 0.5, 0.0),
            BlockSide::LEFT => Vector3::new(0.0, 0.5, 0.5),
            BlockSide::RIGHT => Vector3::new(1.0, 0.5, 0.5),
            BlockSide::TOP => Vector3::new(0.5, 1.0, 0.5),
            BlockSide::BOTTOM => Vector3::new(0.5, 0.0, 0.5),
        }
    }

    /// Offset from a box's minimum corner to a point on the plane this side lies on,
    /// for a box of edge length `size`.
    pub fn plane_anchor(self, size: f32) -> Vector3<f32> {
        match self {
            BlockSide::FRONT => Vector3::new(0.0, 0.0, size),
            BlockSide::RIGHT => Vector3::new(size, 0.0, 0.0),
            BlockSide::TOP => Vector3::new(0.0, size, 0.0),
            BlockSide::BACK | BlockSide::LEFT | BlockSide::BOTTOM => Vector3::zero(),
        }
    }
}
