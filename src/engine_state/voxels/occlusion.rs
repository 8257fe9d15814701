//! # Occlusion Sampler
//!
//! Bakes a directional ambient-occlusion factor for a block face by marching a
//! fixed set of rays out of the face and counting how many escape the world.
//!
//! ## Algorithm
//!
//! 1. The ray set is generated once on a golden-section spiral over the unit sphere.
//! 2. For a face, only rays in the face's hemisphere are cast, starting at the face centre.
//! 3. Each ray advances in fixed sub-voxel steps. Leaving the world bounds counts as
//!    one open ray. Entering a solid cell (in whichever chunk owns the step) ends the
//!    ray with no contribution. Cells of missing chunks are open air.
//! 4. The open count is divided by `num_rays / 2` and clamped to `[0, 1]`.
//!
//! The divisor is half the full ray count because only one hemisphere is cast.
//! The spiral does not split exactly in half along every axis, so the clamp keeps
//! the result in range.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Point3, Vector3};

use super::block::block_side::BlockSide;
use super::coords::{split_world_block, to_world_block, world_block_at, BlockCoord, ChunkCoord};
use super::world::WorldSnapshot;

/// Default number of sample rays per block.
pub const DEFAULT_NUM_RAYS: usize = 16;
/// Default march step along a sample ray, in blocks.
pub const DEFAULT_RAY_STEP: f32 = 0.2;

/// Casts golden-spiral rays to compute per-face occlusion values.
#[derive(Clone, Debug)]
pub struct OcclusionSampler {
    rays: Vec<Vector3<f32>>,
    step: f32,
}

impl Default for OcclusionSampler {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_RAYS, DEFAULT_RAY_STEP)
    }
}

impl OcclusionSampler {
    /// Creates a sampler with `num_rays` spiral rays marched in `step` increments.
    pub fn new(num_rays: usize, step: f32) -> Self {
        Self {
            rays: golden_spiral(num_rays),
            step,
        }
    }

    /// Occlusion factor for one face of a block.
    ///
    /// # Arguments
    /// * `world` - Snapshot the rays are marched through
    /// * `chunk` - Chunk owning the block
    /// * `block` - Local coordinate of the block
    /// * `side` - Face being sampled
    ///
    /// # Returns
    /// A value in `[0, 1]`: `0` when every ray hits solid geometry, `1` when the
    /// whole hemisphere is open to the world edge.
    pub fn sample_face(
        &self,
        world: &WorldSnapshot,
        chunk: ChunkCoord,
        block: BlockCoord,
        side: BlockSide,
    ) -> f32 {
        let bounds = world.bounds();
        let origin_block = to_world_block(chunk, block);
        let origin = Point3::new(
            origin_block.x as f32,
            origin_block.y as f32,
            origin_block.z as f32,
        ) + side.face_center();
        let normal = side.normal();

        let extent = bounds.max - bounds.min;
        let max_steps = (extent.magnitude() / self.step).ceil() as usize + 2;

        let mut open = 0.0;
        for ray in self.rays.iter().filter(|ray| ray.dot(normal) >= 0.0) {
            let step = *ray * self.step;
            let mut position = origin;
            let mut last_block = origin_block;

            for _ in 0..max_steps {
                if !bounds.contains(position) {
                    open += 1.0;
                    break;
                }

                let current = world_block_at(position);
                if current != last_block {
                    let (owner, local) = split_world_block(current);
                    if world.store(owner).is_some_and(|store| store.is_solid(local)) {
                        break;
                    }
                    last_block = current;
                }

                position += step;
            }
        }

        let divisor = (self.rays.len() / 2).max(1) as f32;
        (open / divisor).clamp(0.0, 1.0)
    }

    /// Occlusion factors for all six faces of a block.
    pub fn sample_block(
        &self,
        world: &WorldSnapshot,
        chunk: ChunkCoord,
        block: BlockCoord,
    ) -> [f32; 6] {
        BlockSide::all().map(|side| self.sample_face(world, chunk, block, side))
    }
}

/// `n` unit vectors spread over the sphere on a golden-section spiral.
pub fn golden_spiral(n: usize) -> Vec<Vector3<f32>> {
    let increment = PI * (3.0 - 5.0_f32.sqrt());
    let offset = 2.0 / n as f32;

    (0..n)
        .map(|t| {
            let y = t as f32 * offset - 1.0 + offset / 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let phi = t as f32 * increment;
            Vector3::new(phi.cos() * r, y, phi.sin() * r)
        })
        .collect()
}
