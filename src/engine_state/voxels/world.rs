//! # World Module
//!
//! This module provides the `World` struct which owns every chunk of the session
//! and resolves axis-aligned neighbour lookups.
//!
//! ## Architecture
//!
//! The world is a sparse map from chunk coordinate to [`Chunk`]. Chunks are
//! generated once at startup and never destroyed. A missing entry is a normal
//! state: it marks the world edge and is treated as open air by meshing and
//! occlusion.
//!
//! Background mesh builds never touch the `World` itself. They receive a
//! [`WorldSnapshot`]: a map of `Arc` block stores that is cheap to clone and
//! immutable for the worker's lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::{Array, Point3, Vector3};
use log::info;

use super::block::block_side::BlockSide;
use super::chunk::block_store::BlockStore;
use super::chunk::chunk_creation::{BlockPredicate, ChunkShape, GenerationMethod, PerlinTerrain};
use super::chunk::Chunk;
use super::coords::{chunk_origin, split_world_block, BlockCoord, ChunkCoord, CHUNK_BASE};

/// Represents a voxel world composed of multiple chunks.
#[derive(Debug, Default)]
pub struct World {
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        World {
            chunks: HashMap::new(),
        }
    }

    /// Generates a `size³` grid of chunks at coordinates `0..size` on each axis.
    ///
    /// # Arguments
    /// * `size` - Number of chunks per axis
    /// * `method` - Which generator fills the chunks
    /// * `seed` - Seed for random shape selection and noise
    pub fn generate(size: i32, method: GenerationMethod, seed: u64) -> Self {
        let mut world = World::new();
        let mut rng = fastrand::Rng::with_seed(seed);
        let terrain = PerlinTerrain::new(seed as u32);

        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    let position = Point3::new(x, y, z);
                    let blocks = match (method, method.fixed_shape()) {
                        (_, Some(shape)) => shape.generate(position),
                        (GenerationMethod::Perlin, None) => terrain.generate(position),
                        _ => ChunkShape::random(&mut rng).generate(position),
                    };
                    world.insert_chunk(position, blocks);
                }
            }
        }

        info!(
            "Generated world: {} chunks, {} solid blocks ({:?})",
            world.len(),
            world.chunks.values().map(|c| c.blocks().len()).sum::<usize>(),
            method
        );
        world
    }

    /// Generates every coordinate in `positions` with a custom predicate.
    pub fn generate_with<P: BlockPredicate>(
        positions: impl IntoIterator<Item = ChunkCoord>,
        predicate: &P,
    ) -> Self {
        let mut world = World::new();
        for position in positions {
            world.insert_chunk(position, predicate.generate(position));
        }
        world
    }

    /// Adds a chunk built from `blocks`, replacing any chunk already at `position`.
    pub fn insert_chunk(&mut self, position: ChunkCoord, blocks: BlockStore) {
        self.chunks.insert(position, Chunk::new(position, blocks));
    }

    /// Looks up a chunk.
    pub fn get(&self, position: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    /// Looks up a chunk for modification.
    pub fn get_mut(&mut self, position: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&position)
    }

    /// The six axis-aligned neighbours of `position`, in [`BlockSide`] order.
    /// Missing neighbours are `None`.
    pub fn neighbors(&self, position: ChunkCoord) -> [Option<&Chunk>; 6] {
        BlockSide::all().map(|side| self.get(position + side.offset()))
    }

    /// `true` if the world-block cell is solid. Cells in missing chunks are air.
    pub fn is_solid_world_block(&self, world_block: BlockCoord) -> bool {
        let (chunk, local) = split_world_block(world_block);
        self.get(chunk).is_some_and(|c| c.blocks().is_solid(local))
    }

    /// Iterates over all chunks.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Iterates mutably over all chunks.
    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    /// Number of chunks in the world.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// `true` if the world has no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The world-space box spanning every chunk, or `None` for an empty world.
    pub fn bounds(&self) -> Option<WorldBounds> {
        WorldBounds::enclosing(self.chunks.keys().copied())
    }

    /// Captures the current block stores of every chunk for a background reader.
    pub fn snapshot(&self) -> WorldSnapshot {
        let stores: HashMap<ChunkCoord, Arc<BlockStore>> = self
            .chunks
            .iter()
            .map(|(position, chunk)| (*position, chunk.shared_blocks()))
            .collect();
        let bounds = WorldBounds::enclosing(stores.keys().copied()).unwrap_or_default();
        WorldSnapshot { stores, bounds }
    }
}

/// Axis-aligned world-space box. Points with `min <= p < max` on every axis are inside.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldBounds {
    /// Minimum corner.
    pub min: Point3<f32>,
    /// Maximum corner (exclusive).
    pub max: Point3<f32>,
}

impl Default for WorldBounds {
    fn default() -> Self {
        let origin = Point3::new(0.0, 0.0, 0.0);
        Self {
            min: origin,
            max: origin,
        }
    }
}

impl WorldBounds {
    /// The box covering all chunks at `positions`.
    pub fn enclosing(positions: impl IntoIterator<Item = ChunkCoord>) -> Option<Self> {
        let mut positions = positions.into_iter();
        let first = positions.next()?;
        let (lo, hi) = positions.fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        });
        Some(Self {
            min: chunk_origin(lo),
            max: chunk_origin(hi) + Vector3::from_value(CHUNK_BASE as f32),
        })
    }

    /// `true` if `point` lies inside the box.
    pub fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x < self.max.x
            && point.y < self.max.y
            && point.z < self.max.z
    }
}

/// Immutable view of every chunk's blocks, handed to background mesh builds.
#[derive(Clone, Debug, Default)]
pub struct WorldSnapshot {
    stores: HashMap<ChunkCoord, Arc<BlockStore>>,
    bounds: WorldBounds,
}

impl WorldSnapshot {
    /// Block store of one chunk.
    pub fn store(&self, position: ChunkCoord) -> Option<&BlockStore> {
        self.stores.get(&position).map(|store| store.as_ref())
    }

    /// Block stores of the six neighbours of `position`, in [`BlockSide`] order.
    pub fn neighbor_stores(&self, position: ChunkCoord) -> [Option<&BlockStore>; 6] {
        BlockSide::all().map(|side| self.store(position + side.offset()))
    }

    /// The world-space box spanning every chunk in the snapshot.
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_fills_a_cube_of_chunks() {
        let world = World::generate(2, GenerationMethod::Cube, 0);
        assert_eq!(world.len(), 8);
        assert!(world.get(Point3::new(1, 1, 1)).is_some());
        assert!(world.get(Point3::new(2, 0, 0)).is_none());
        assert!(world.chunks().all(|c| c.blocks().len() == 4096));
    }

    #[test]
    fn random_generation_is_seeded() {
        let a = World::generate(2, GenerationMethod::Random, 42);
        let b = World::generate(2, GenerationMethod::Random, 42);
        for chunk in a.chunks() {
            let other = b.get(chunk.position).unwrap();
            assert!(chunk.blocks().same_solidity(other.blocks()));
        }
    }

    #[test]
    fn neighbors_follow_side_order() {
        let world = World::generate(2, GenerationMethod::Cube, 0);
        let neighbors = world.neighbors(Point3::new(0, 0, 0));
        assert_eq!(neighbors[BlockSide::FRONT.index()].unwrap().position, Point3::new(0, 0, 1));
        assert!(neighbors[BlockSide::BACK.index()].is_none());
        assert!(neighbors[BlockSide::LEFT.index()].is_none());
        assert_eq!(neighbors[BlockSide::RIGHT.index()].unwrap().position, Point3::new(1, 0, 0));
        assert_eq!(neighbors[BlockSide::TOP.index()].unwrap().position, Point3::new(0, 1, 0));
        assert!(neighbors[BlockSide::BOTTOM.index()].is_none());
    }

    #[test]
    fn bounds_cover_all_chunks() {
        let world = World::generate_with(
            [Point3::new(-1, 0, 0), Point3::new(2, 1, 0)],
            &ChunkShape::Cube,
        );
        let bounds = world.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-16.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(48.0, 32.0, 16.0));
        assert!(bounds.contains(Point3::new(-16.0, 0.0, 15.9)));
        assert!(!bounds.contains(Point3::new(0.0, 0.0, 16.0)));
        assert!(World::new().bounds().is_none());
    }

    #[test]
    fn world_block_lookup_crosses_chunks() {
        let world = World::generate_with([Point3::new(1, 0, 0)], &ChunkShape::Cube);
        assert!(world.is_solid_world_block(Point3::new(16, 0, 0)));
        assert!(!world.is_solid_world_block(Point3::new(15, 0, 0)));
    }
}
