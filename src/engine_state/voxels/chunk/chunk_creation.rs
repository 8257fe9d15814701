//! # Chunk Creation Module
//!
//! Procedural generators that decide which cells of a new chunk are solid.
//!
//! The world does not care which generator filled a chunk: anything that
//! implements [`BlockPredicate`] can be used, including plain closures.
//! The built-in shapes are cube, pyramid, inverted pyramid, sphere, wire cube
//! and a Perlin-noise terrain.

use noise::{NoiseFn, Perlin};
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::coords::{to_world_block, BlockCoord, ChunkCoord, CHUNK_BASE};

use super::block_store::BlockStore;

/// Threshold above which Perlin noise is considered solid for terrain generation.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which Perlin noise is considered solid for terrain generation.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.05;

/// Decides solidity for a cell of a chunk being generated.
pub trait BlockPredicate {
    /// `true` if the local cell `block` of chunk `chunk` should be solid.
    fn is_solid(&self, chunk: ChunkCoord, block: BlockCoord) -> bool;

    /// Fills a fresh block store for `chunk`.
    fn generate(&self, chunk: ChunkCoord) -> BlockStore {
        BlockStore::from_fn(|block| self.is_solid(chunk, block))
    }
}

impl<F> BlockPredicate for F
where
    F: Fn(ChunkCoord, BlockCoord) -> bool,
{
    fn is_solid(&self, chunk: ChunkCoord, block: BlockCoord) -> bool {
        self(chunk, block)
    }
}

/// The fixed shapes a chunk can be filled with.
///
/// The `FromPrimitive` derive lets the random generator pick a shape from an integer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum ChunkShape {
    /// Every cell solid.
    Cube,
    /// A stepped pyramid standing on the chunk floor.
    Pyramid,
    /// The pyramid hanging from the chunk ceiling.
    InvertedPyramid,
    /// A ball filling the chunk.
    Sphere,
    /// Only the twelve edges of the chunk cube.
    WireCube,
}

/// Number of [`ChunkShape`] variants.
pub const NUM_CHUNK_SHAPES: u8 = 5;

impl ChunkShape {
    /// Picks a shape uniformly at random.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        num::FromPrimitive::from_u8(rng.u8(0..NUM_CHUNK_SHAPES)).unwrap_or(ChunkShape::Cube)
    }
}

impl BlockPredicate for ChunkShape {
    fn is_solid(&self, _chunk: ChunkCoord, block: BlockCoord) -> bool {
        let last = CHUNK_BASE - 1;
        match self {
            ChunkShape::Cube => true,
            ChunkShape::Pyramid => in_pyramid_layer(block.y, block),
            ChunkShape::InvertedPyramid => in_pyramid_layer(last - block.y, block),
            ChunkShape::Sphere => {
                let center = (CHUNK_BASE as f32 - 1.0) / 2.0;
                let radius = CHUNK_BASE as f32 / 2.0;
                let dx = block.x as f32 - center;
                let dy = block.y as f32 - center;
                let dz = block.z as f32 - center;
                dx * dx + dy * dy + dz * dz <= radius * radius
            }
            ChunkShape::WireCube => {
                let on_edge = |v: i32| v == 0 || v == last;
                [block.x, block.y, block.z]
                    .into_iter()
                    .filter(|v| on_edge(*v))
                    .count()
                    >= 2
            }
        }
    }
}

/// Pyramid layer `layer` (0 at the base) covers x and z in `layer..N-layer`.
fn in_pyramid_layer(layer: i32, block: BlockCoord) -> bool {
    (0..CHUNK_BASE / 2).contains(&layer)
        && (layer..CHUNK_BASE - layer).contains(&block.x)
        && (layer..CHUNK_BASE - layer).contains(&block.z)
}

/// Perlin-noise terrain sampled in world space, so neighbouring chunks join up.
pub struct PerlinTerrain {
    perlin: Perlin,
}

impl PerlinTerrain {
    /// Creates a terrain generator for the given seed.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl BlockPredicate for PerlinTerrain {
    fn is_solid(&self, chunk: ChunkCoord, block: BlockCoord) -> bool {
        let world = to_world_block(chunk, block);
        let sample = self.perlin.get([
            world.x as f64 * PERLIN_SCALE_FACTOR,
            world.y as f64 * PERLIN_SCALE_FACTOR,
            world.z as f64 * PERLIN_SCALE_FACTOR,
        ]);
        !(PERLIN_NEGATIVE_THRESHOLD..=PERLIN_POSITIVE_THRESHOLD).contains(&sample)
    }
}

/// How the world fills its chunks at startup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// A random [`ChunkShape`] per chunk.
    Random,
    /// Every chunk a full cube.
    Cube,
    /// Every chunk a pyramid.
    Pyramid,
    /// Every chunk an inverted pyramid.
    InvertedPyramid,
    /// Every chunk a sphere.
    Sphere,
    /// Every chunk a wire cube.
    WireCube,
    /// World-space Perlin terrain.
    Perlin,
}

impl GenerationMethod {
    /// The fixed shape this method uses, if any.
    pub fn fixed_shape(self) -> Option<ChunkShape> {
        match self {
            GenerationMethod::Cube => Some(ChunkShape::Cube),
            GenerationMethod::Pyramid => Some(ChunkShape::Pyramid),
            GenerationMethod::InvertedPyramid => Some(ChunkShape::InvertedPyramid),
            GenerationMethod::Sphere => Some(ChunkShape::Sphere),
            GenerationMethod::WireCube => Some(ChunkShape::WireCube),
            GenerationMethod::Random | GenerationMethod::Perlin => None,
        }
    }
}
