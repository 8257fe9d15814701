use cgmath::Point3;

use crate::engine_state::voxels::{block::block_side::BlockSide, coords::BlockCoord};

/// A single one-block quad on the surface of a chunk.
///
/// Corners are stored counter-clockwise as seen from outside the block, so the
/// triangles `a,b,c` and `c,d,a` face along the side's outward normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// The four corners, in winding order
    pub corners: [Point3<i32>; 4],
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face of block `block` on `block_side`.
    pub fn new(block: BlockCoord, block_side: BlockSide) -> Self {
        let (x, y, z) = (block.x, block.y, block.z);
        let p = Point3::new;
        let corners = match block_side {
            BlockSide::FRONT => [
                p(x, y, z + 1),
                p(x + 1, y, z + 1),
                p(x + 1, y + 1, z + 1),
                p(x, y + 1, z + 1),
            ],
            BlockSide::BACK => [
                p(x + 1, y + 1, z),
                p(x + 1, y, z),
                p(x, y, z),
                p(x, y + 1, z),
            ],
            BlockSide::LEFT => [
                p(x, y, z),
                p(x, y, z + 1),
                p(x, y + 1, z + 1),
                p(x, y + 1, z),
            ],
            BlockSide::RIGHT => [
                p(x + 1, y + 1, z + 1),
                p(x + 1, y, z + 1),
                p(x + 1, y, z),
                p(x + 1, y + 1, z),
            ],
            BlockSide::TOP => [
                p(x + 1, y + 1, z + 1),
                p(x + 1, y + 1, z),
                p(x, y + 1, z),
                p(x, y + 1, z + 1),
            ],
            BlockSide::BOTTOM => [
                p(x, y, z),
                p(x + 1, y, z),
                p(x + 1, y, z + 1),
                p(x, y, z + 1),
            ],
        };
        Face {
            corners,
            block_side,
        }
    }

    /// Index pattern for one quad whose first vertex sits at `base`.
    pub fn indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 2, base + 2, base + 3, base]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn to_f32(p: Point3<i32>) -> Vector3<f32> {
        Vector3::new(p.x as f32, p.y as f32, p.z as f32)
    }

    #[test]
    fn winding_matches_outward_normal() {
        for side in BlockSide::all() {
            let face = Face::new(Point3::new(2, 3, 4), side);
            let [a, b, c, _] = face.corners.map(to_f32);
            let normal = (b - a).cross(c - a).normalize();
            assert!(
                (normal - side.normal()).magnitude() < 1e-6,
                "{side:?} winds towards {normal:?}"
            );
        }
    }

    #[test]
    fn corners_lie_on_the_face_plane() {
        for side in BlockSide::all() {
            let face = Face::new(Point3::new(0, 0, 0), side);
            let anchor = side.plane_anchor(1.0);
            for corner in face.corners {
                let offset = to_f32(corner) - anchor;
                assert_eq!(offset.dot(side.normal()), 0.0);
            }
        }
    }
}
