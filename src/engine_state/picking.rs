//! # Ray Picking
//!
//! Finds the block under a screen-space ray and deletes it.
//!
//! Picking is done in two marches. The first marches the ray against every
//! candidate chunk's box with a coarse step. The second walks the hit chunks
//! nearest first and marches against each of their visible blocks with a fine
//! step, resuming one coarse step before the chunk hit. The nearest block hit is
//! removed, unless its chunk is being rebuilt.
//!
//! A removal on a chunk boundary also queues the neighbour across that boundary
//! when the neighbour has a solid block facing the hole, since the neighbour's
//! hidden face is now exposed.

use std::collections::HashSet;

use cgmath::{Point3, Vector3};
use log::{debug, info};

use crate::config::PickingConfig;

use super::{
    rebuild_scheduler::RebuildScheduler,
    rendering::frustum::Plane,
    voxels::{
        block::block_side::BlockSide,
        chunk::BlockEdit,
        coords::{chunk_origin, to_world_block, BlockCoord, ChunkCoord, CHUNK_BASE},
        world::World,
    },
};

/// A half-line in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Point3<f32>,
    /// Unit direction
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Creates a ray. `direction` is expected to be normalized.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    /// The point `depth` units along the ray.
    pub fn at(&self, depth: f32) -> Point3<f32> {
        self.origin + self.direction * depth
    }
}

/// What a pick did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PickOutcome {
    /// The ray hit no visible block.
    NoSelection,
    /// The block was removed and rebuilds were queued.
    Removed {
        /// Chunk holding the block
        chunk: ChunkCoord,
        /// Chunk-local block coordinate
        block: BlockCoord,
        /// Distance along the ray to the hit
        distance: f32,
    },
    /// The block was hit but its chunk is rebuilding, so nothing changed.
    Suppressed {
        /// Chunk holding the block
        chunk: ChunkCoord,
        /// Chunk-local block coordinate
        block: BlockCoord,
    },
}

/// The six inward-facing planes of an axis-aligned cube.
///
/// A point is inside the cube iff it is strictly inside every plane.
pub fn box_planes(min: Point3<f32>, size: f32) -> [Plane; 6] {
    [
        Plane { a: 0.0, b: 0.0, c: 1.0, d: -min.z },
        Plane { a: 0.0, b: 0.0, c: -1.0, d: min.z + size },
        Plane { a: -1.0, b: 0.0, c: 0.0, d: min.x + size },
        Plane { a: 1.0, b: 0.0, c: 0.0, d: -min.x },
        Plane { a: 0.0, b: 1.0, c: 0.0, d: -min.y },
        Plane { a: 0.0, b: -1.0, c: 0.0, d: min.y + size },
    ]
}

/// `true` if `point` is strictly inside the cube at `min` with edge `size`.
pub fn point_in_box(point: Point3<f32>, min: Point3<f32>, size: f32) -> bool {
    box_planes(min, size).iter().all(|plane| plane.evaluate(point) > 0.0)
}

/// Marches `ray` from `start_depth` in steps of `step` while the depth stays below
/// `max_depth`, and returns the first depth whose point is inside the cube.
pub fn cast_ray_at_box(
    ray: &Ray,
    box_min: Point3<f32>,
    size: f32,
    start_depth: f32,
    step: f32,
    max_depth: f32,
) -> Option<f32> {
    if step <= 0.0 {
        return None;
    }
    let planes = box_planes(box_min, size);
    let mut i = 0u32;
    loop {
        let depth = start_depth + i as f32 * step;
        if depth >= max_depth {
            return None;
        }
        let point = ray.at(depth);
        if planes.iter().all(|plane| plane.evaluate(point) > 0.0) {
            return Some(depth);
        }
        i += 1;
    }
}

/// Screen-ray block picker.
#[derive(Clone, Debug, Default)]
pub struct RayPicker {
    config: PickingConfig,
}

impl RayPicker {
    /// Creates a picker with the given march settings.
    pub fn new(config: PickingConfig) -> Self {
        Self { config }
    }

    /// Chunks among `candidates` whose box the ray enters, nearest first.
    pub fn chunk_hits(
        &self,
        world: &World,
        candidates: &HashSet<ChunkCoord>,
        ray: &Ray,
    ) -> Vec<(f32, ChunkCoord)> {
        let mut hits: Vec<(f32, ChunkCoord)> = candidates
            .iter()
            .filter(|coord| world.get(**coord).is_some())
            .filter_map(|coord| {
                cast_ray_at_box(
                    ray,
                    chunk_origin(*coord),
                    CHUNK_BASE as f32,
                    0.0,
                    self.config.chunk_step,
                    self.config.chunk_max_depth,
                )
                .map(|distance| (distance, *coord))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits
    }

    /// Nearest visible block of `chunk` the ray enters, searched from one coarse
    /// step before `chunk_distance`.
    pub fn block_hit(
        &self,
        world: &World,
        chunk: ChunkCoord,
        chunk_distance: f32,
        ray: &Ray,
    ) -> Option<(f32, BlockCoord)> {
        let chunk_ref = world.get(chunk)?;
        let start = (chunk_distance - self.config.chunk_step).max(0.0);
        let mut limit = start + self.config.block_max_depth;
        let mut best = None;

        for (block, attributes) in chunk_ref.blocks().iter() {
            if !attributes.visible {
                continue;
            }
            let world_block = to_world_block(chunk, block);
            let min = Point3::new(world_block.x as f32, world_block.y as f32, world_block.z as f32);
            let step = self.config.block_step;
            if let Some(distance) = cast_ray_at_box(ray, min, 1.0, start, step, limit) {
                limit = distance;
                best = Some((distance, block));
            }
        }
        best
    }

    /// Picks along `ray` among the chunks in `candidates` and removes the nearest
    /// visible block it hits.
    pub fn pick(
        &self,
        world: &mut World,
        scheduler: &mut RebuildScheduler,
        candidates: &HashSet<ChunkCoord>,
        ray: &Ray,
    ) -> PickOutcome {
        for (chunk_distance, chunk) in self.chunk_hits(world, candidates, ray) {
            let Some((distance, block)) = self.block_hit(world, chunk, chunk_distance, ray) else {
                debug!(
                    "Ray entered chunk {:?} at {:.2} but hit no visible block",
                    chunk, chunk_distance
                );
                continue;
            };

            if self.config.highlight_chunks {
                if let Some(hit) = world.get_mut(chunk) {
                    hit.mouse_highlighted = true;
                }
            }

            return match remove_block(world, scheduler, chunk, block) {
                BlockEdit::Removed => {
                    info!(
                        "Removed block {:?} of chunk {:?} at distance {:.2}",
                        block, chunk, distance
                    );
                    PickOutcome::Removed { chunk, block, distance }
                }
                BlockEdit::Suppressed => PickOutcome::Suppressed { chunk, block },
                BlockEdit::Missing => PickOutcome::NoSelection,
            };
        }
        PickOutcome::NoSelection
    }
}

/// Removes `block` from `chunk` unless the chunk is rebuilding, then queues the
/// chunk and any neighbour whose face toward the hole is now exposed.
pub fn remove_block(
    world: &mut World,
    scheduler: &mut RebuildScheduler,
    chunk: ChunkCoord,
    block: BlockCoord,
) -> BlockEdit {
    let Some(owner) = world.get_mut(chunk) else {
        return BlockEdit::Missing;
    };
    let edit = owner.remove_block(block);
    if edit != BlockEdit::Removed {
        return edit;
    }

    scheduler.request_rebuild(world, chunk);
    for (side, mirrored) in exposed_neighbors(block) {
        let neighbor = chunk + side.offset();
        let faces_hole = world
            .get(neighbor)
            .is_some_and(|n| n.blocks().is_solid(mirrored));
        if faces_hole {
            debug!("Block {:?} of chunk {:?} exposed neighbour {:?}", block, chunk, neighbor);
            scheduler.request_rebuild(world, neighbor);
        }
    }
    edit
}

/// For a block on the chunk boundary, the sides it touches and the block across
/// each of them in the neighbouring chunk.
fn exposed_neighbors(block: BlockCoord) -> Vec<(BlockSide, BlockCoord)> {
    let last = CHUNK_BASE - 1;
    let mut sides = Vec::new();

    if block.x == 0 {
        sides.push((BlockSide::LEFT, BlockCoord::new(last, block.y, block.z)));
    } else if block.x == last {
        sides.push((BlockSide::RIGHT, BlockCoord::new(0, block.y, block.z)));
    }
    if block.y == 0 {
        sides.push((BlockSide::BOTTOM, BlockCoord::new(block.x, last, block.z)));
    } else if block.y == last {
        sides.push((BlockSide::TOP, BlockCoord::new(block.x, 0, block.z)));
    }
    if block.z == 0 {
        sides.push((BlockSide::BACK, BlockCoord::new(block.x, block.y, last)));
    } else if block.z == last {
        sides.push((BlockSide::FRONT, BlockCoord::new(block.x, block.y, 0)));
    }
    sides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        buffer_state::BufferState,
        voxels::chunk::{chunk_creation::ChunkShape, MeshState},
    };
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn built(positions: &[ChunkCoord], shape: ChunkShape) -> (World, RebuildScheduler) {
        let mut world = World::generate_with(positions.iter().copied(), &shape);
        let mut scheduler = RebuildScheduler::new(2, None);
        let mut sink = BufferState::new();
        assert!(scheduler.wait_for_idle(&mut world, &mut sink, TIMEOUT));
        (world, scheduler)
    }

    fn all(positions: &[ChunkCoord]) -> HashSet<ChunkCoord> {
        positions.iter().copied().collect()
    }

    #[test]
    fn box_march_enters_through_the_near_face() {
        let ray = Ray::new(Point3::new(8.5, 8.5, 40.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = cast_ray_at_box(&ray, Point3::new(0.0, 0.0, 0.0), 16.0, 0.0, 0.5, 256.0);
        assert_eq!(hit, Some(24.5));

        let miss = Ray::new(Point3::new(30.5, 8.5, 40.0), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(cast_ray_at_box(&miss, Point3::new(0.0, 0.0, 0.0), 16.0, 0.0, 0.5, 256.0), None);
        assert_eq!(cast_ray_at_box(&ray, Point3::new(0.0, 0.0, 0.0), 16.0, 0.0, 0.5, 20.0), None);
    }

    #[test]
    fn point_in_box_is_strict() {
        let min = Point3::new(0.0, 0.0, 0.0);
        assert!(point_in_box(Point3::new(0.5, 0.5, 0.5), min, 1.0));
        assert!(!point_in_box(Point3::new(1.0, 0.5, 0.5), min, 1.0));
        assert!(!point_in_box(Point3::new(0.0, 0.5, 0.5), min, 1.0));
    }

    #[test]
    fn ray_at_chunk_centre_removes_the_first_block() {
        let origin = Point3::new(0, 0, 0);
        let (mut world, mut scheduler) = built(&[origin], ChunkShape::Cube);
        let picker = RayPicker::default();
        let ray = Ray::new(Point3::new(8.5, 8.5, 40.0), Vector3::new(0.0, 0.0, -1.0));

        let chunk_hits = picker.chunk_hits(&world, &all(&[origin]), &ray);
        assert_eq!(chunk_hits.len(), 1);
        assert!((chunk_hits[0].0 - 24.5).abs() < 1e-4);

        match picker.pick(&mut world, &mut scheduler, &all(&[origin]), &ray) {
            PickOutcome::Removed { chunk, block, distance } => {
                assert_eq!(chunk, origin);
                assert_eq!(block, BlockCoord::new(8, 8, 15));
                assert!(distance > 24.0 && distance < 25.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        let chunk = world.get(origin).unwrap();
        assert!(!chunk.blocks().is_solid(BlockCoord::new(8, 8, 15)));
        assert_eq!(chunk.mesh_state(), MeshState::PendingSetup);
    }

    #[test]
    fn nearest_chunk_wins() {
        let near = Point3::new(0, 0, 1);
        let far = Point3::new(0, 0, 0);
        let (mut world, mut scheduler) = built(&[near, far], ChunkShape::Cube);
        let picker = RayPicker::default();
        let ray = Ray::new(Point3::new(8.5, 8.5, 60.0), Vector3::new(0.0, 0.0, -1.0));

        let outcome = picker.pick(&mut world, &mut scheduler, &all(&[near, far]), &ray);
        assert!(matches!(outcome, PickOutcome::Removed { chunk, .. } if chunk == near));
        assert_eq!(world.get(far).unwrap().mesh_state(), MeshState::Ready);
    }

    #[test]
    fn missing_everything_is_no_selection() {
        let origin = Point3::new(0, 0, 0);
        let (mut world, mut scheduler) = built(&[origin], ChunkShape::Cube);
        let ray = Ray::new(Point3::new(8.5, 8.5, 40.0), Vector3::new(0.0, 0.0, 1.0));
        let outcome = RayPicker::default().pick(&mut world, &mut scheduler, &all(&[origin]), &ray);
        assert_eq!(outcome, PickOutcome::NoSelection);
        assert_eq!(world.get(origin).unwrap().mesh_state(), MeshState::Ready);
    }

    #[test]
    fn chunks_outside_the_candidate_set_are_ignored() {
        let origin = Point3::new(0, 0, 0);
        let (mut world, mut scheduler) = built(&[origin], ChunkShape::Cube);
        let ray = Ray::new(Point3::new(8.5, 8.5, 40.0), Vector3::new(0.0, 0.0, -1.0));
        let outcome = RayPicker::default().pick(&mut world, &mut scheduler, &HashSet::new(), &ray);
        assert_eq!(outcome, PickOutcome::NoSelection);
    }

    #[test]
    fn rebuilding_chunk_suppresses_the_edit() {
        let origin = Point3::new(0, 0, 0);
        let (mut world, mut scheduler) = built(&[origin], ChunkShape::Cube);
        world.get_mut(origin).unwrap().set_mesh_state(MeshState::Rebuilding);

        let ray = Ray::new(Point3::new(8.5, 8.5, 40.0), Vector3::new(0.0, 0.0, -1.0));
        let outcome = RayPicker::default().pick(&mut world, &mut scheduler, &all(&[origin]), &ray);
        assert_eq!(
            outcome,
            PickOutcome::Suppressed {
                chunk: origin,
                block: BlockCoord::new(8, 8, 15)
            }
        );
        assert!(world.get(origin).unwrap().blocks().is_solid(BlockCoord::new(8, 8, 15)));
    }

    #[test]
    fn boundary_removal_queues_the_neighbour() {
        let chunk = Point3::new(0, 0, 0);
        let neighbor = Point3::new(-1, 0, 0);
        let (mut world, mut scheduler) = built(&[chunk, neighbor], ChunkShape::Cube);

        let edit = remove_block(&mut world, &mut scheduler, chunk, BlockCoord::new(0, 0, 0));
        assert_eq!(edit, BlockEdit::Removed);
        assert_eq!(world.get(chunk).unwrap().mesh_state(), MeshState::PendingSetup);
        assert_eq!(world.get(neighbor).unwrap().mesh_state(), MeshState::PendingSetup);
    }

    #[test]
    fn interior_or_unbacked_removal_leaves_neighbours_alone() {
        let chunk = Point3::new(0, 0, 0);
        let neighbor = Point3::new(1, 0, 0);
        let mut world = World::generate_with([chunk], &ChunkShape::Cube);
        world.insert_chunk(neighbor, Default::default());
        let mut scheduler = RebuildScheduler::new(2, None);
        let mut sink = BufferState::new();
        assert!(scheduler.wait_for_idle(&mut world, &mut sink, TIMEOUT));

        remove_block(&mut world, &mut scheduler, chunk, BlockCoord::new(15, 4, 4));
        assert_eq!(world.get(neighbor).unwrap().mesh_state(), MeshState::Ready);

        remove_block(&mut world, &mut scheduler, chunk, BlockCoord::new(5, 5, 5));
        assert_eq!(world.get(neighbor).unwrap().mesh_state(), MeshState::Ready);
        assert_eq!(
            remove_block(&mut world, &mut scheduler, chunk, BlockCoord::new(5, 5, 5)),
            BlockEdit::Missing
        );
    }

    #[test]
    fn corner_block_touches_three_neighbours() {
        let sides: Vec<BlockSide> = exposed_neighbors(BlockCoord::new(0, 15, 0))
            .into_iter()
            .map(|(side, _)| side)
            .collect();
        assert_eq!(sides, vec![BlockSide::LEFT, BlockSide::TOP, BlockSide::BACK]);
        assert!(exposed_neighbors(BlockCoord::new(3, 4, 5)).is_empty());
    }
}
