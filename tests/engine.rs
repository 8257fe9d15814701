use std::collections::HashSet;
use std::time::Duration;

use cgmath::{Deg, Matrix4, Point3, Vector3};
use voxel_chunks::engine_state::{
    buffer_state::BufferState,
    picking::{cast_ray_at_box, remove_block, Ray, RayPicker},
    rebuild_scheduler::RebuildScheduler,
    rendering::{
        frustum::{cube_corners, Containment, Frustum},
        meshing::MeshBuilder,
    },
    voxels::{
        block::block_side::BlockSide,
        chunk::{chunk_creation::ChunkShape, BlockEdit, MeshState},
        coords::{BlockCoord, ChunkCoord},
        occlusion::OcclusionSampler,
        world::World,
    },
};
use voxel_chunks::{EngineConfig, EngineState, PickOutcome};

const TIMEOUT: Duration = Duration::from_secs(60);

fn settle(world: &mut World, scheduler: &mut RebuildScheduler) -> BufferState {
    let mut sink = BufferState::new();
    assert!(scheduler.wait_for_idle(world, &mut sink, TIMEOUT));
    sink
}

#[test]
fn lone_solid_chunk_meshes_to_its_shell() {
    let origin = Point3::new(0, 0, 0);
    let mut world = World::generate_with([origin], &ChunkShape::Cube);
    let mut scheduler = RebuildScheduler::new(2, None);
    let sink = settle(&mut world, &mut scheduler);

    let buffers = world.get(origin).unwrap().buffers;
    let indices: u32 = buffers.sides.iter().map(|side| side.index_count).sum();
    assert_eq!(indices / 3, 3072);
    for side in BlockSide::all() {
        assert_eq!(buffers.side(side).vertex_count, 16 * 16 * 4);
    }
    assert_eq!(sink.len(), 18);
}

#[test]
fn shared_boundary_emits_no_faces() {
    let left = Point3::new(0, 0, 0);
    let right = Point3::new(1, 0, 0);
    let mut world = World::generate_with([left, right], &ChunkShape::Cube);
    let mut scheduler = RebuildScheduler::new(2, None);
    settle(&mut world, &mut scheduler);

    assert!(world.get(left).unwrap().buffers.side(BlockSide::RIGHT).is_empty());
    assert!(world.get(right).unwrap().buffers.side(BlockSide::LEFT).is_empty());
    assert!(!world.get(left).unwrap().buffers.side(BlockSide::LEFT).is_empty());
}

#[test]
fn corner_removal_queues_both_chunks() {
    let chunk = Point3::new(0, 0, 0);
    let neighbor = Point3::new(0, -1, 0);
    let mut world = World::generate_with([chunk, neighbor], &ChunkShape::Cube);
    let mut scheduler = RebuildScheduler::new(2, None);
    let mut sink = settle(&mut world, &mut scheduler);

    let edit = remove_block(&mut world, &mut scheduler, chunk, BlockCoord::new(0, 0, 0));
    assert_eq!(edit, BlockEdit::Removed);
    assert_eq!(world.get(chunk).unwrap().mesh_state(), MeshState::PendingSetup);
    assert_eq!(world.get(neighbor).unwrap().mesh_state(), MeshState::PendingSetup);

    assert!(scheduler.wait_for_idle(&mut world, &mut sink, TIMEOUT));
    let below = world.get(neighbor).unwrap();
    assert_eq!(below.mesh_state(), MeshState::Ready);
    assert_eq!(below.buffers.side(BlockSide::TOP).vertex_count, 4);
}

#[test]
fn centred_ray_hits_chunk_then_first_block() {
    let origin = Point3::new(0, 0, 0);
    let mut world = World::generate_with([origin], &ChunkShape::Cube);
    let mut scheduler = RebuildScheduler::new(2, None);
    settle(&mut world, &mut scheduler);

    let distance_to_centre = 32.0;
    let eye = Point3::new(8.5, 8.5, 8.0 + distance_to_centre);
    let ray = Ray::new(eye, Vector3::new(0.0, 0.0, -1.0));
    let chunk_min = Point3::new(0.0, 0.0, 0.0);
    let chunk_hit = cast_ray_at_box(&ray, chunk_min, 16.0, 0.0, 0.5, 256.0).unwrap();
    assert!((chunk_hit - (distance_to_centre - 8.0)).abs() <= 0.5);

    let candidates: HashSet<ChunkCoord> = [origin].into_iter().collect();
    let outcome = RayPicker::default().pick(&mut world, &mut scheduler, &candidates, &ray);
    assert!(matches!(
        outcome,
        PickOutcome::Removed { block, .. } if block == BlockCoord::new(8, 8, 15)
    ));
}

#[test]
fn rebuild_concurrency_stays_bounded() {
    let positions: Vec<ChunkCoord> = (0..4)
        .flat_map(|x| (0..4).map(move |z| Point3::new(x, 0, z)))
        .collect();
    let mut world = World::generate_with(positions, &ChunkShape::Pyramid);
    let mut scheduler = RebuildScheduler::new(2, Some(OcclusionSampler::default()));
    let mut sink = BufferState::new();

    let start = std::time::Instant::now();
    loop {
        scheduler.tick(&mut world, &mut sink);
        let rebuilding = world
            .chunks()
            .filter(|chunk| chunk.mesh_state() == MeshState::Rebuilding)
            .count();
        assert!(rebuilding <= 2);
        if scheduler.is_idle() {
            break;
        }
        assert!(start.elapsed() < TIMEOUT);
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(world.chunks().all(|chunk| chunk.mesh_state() == MeshState::Ready));
}

#[test]
fn triangle_count_is_bounded_by_isolated_blocks() {
    let checkerboard = |_: ChunkCoord, b: BlockCoord| (b.x + b.y + b.z) % 2 == 0;
    let isolated = World::generate_with([Point3::new(0, 0, 0)], &checkerboard);
    let snapshot = isolated.snapshot();
    let output = MeshBuilder::from_snapshot(&snapshot, Point3::new(0, 0, 0)).unwrap().build();
    assert_eq!(output.stats.triangles(), output.stats.worst_case_triangles);

    for shape in [ChunkShape::Sphere, ChunkShape::Pyramid, ChunkShape::WireCube] {
        let world = World::generate_with([Point3::new(0, 0, 0)], &shape);
        let snapshot = world.snapshot();
        let output = MeshBuilder::from_snapshot(&snapshot, Point3::new(0, 0, 0)).unwrap().build();
        assert!(output.stats.triangles() < output.stats.worst_case_triangles);
    }
}

#[test]
fn occlusion_stays_in_range() {
    let world = World::generate_with(
        [Point3::new(0, 0, 0), Point3::new(1, 0, 0)],
        &ChunkShape::Sphere,
    );
    let snapshot = world.snapshot();
    let sampler = OcclusionSampler::default();
    for (block, _) in world.get(Point3::new(0, 0, 0)).unwrap().blocks().iter().step_by(37) {
        for value in sampler.sample_block(&snapshot, Point3::new(0, 0, 0), block) {
            assert!((0.0..=1.0).contains(&value));
        }
    }
}

#[test]
fn frustum_matches_brute_force_corner_tests() {
    let pv = cgmath::perspective(Deg(70.0), 1.5, 0.5, 80.0)
        * Matrix4::look_to_rh(
            Point3::new(5.0, 3.0, 5.0),
            Vector3::new(1.0, -0.2, 0.4),
            Vector3::unit_y(),
        );
    let frustum = Frustum::from_matrix(&pv);

    for x in (-40..100).step_by(13) {
        for y in (-40..60).step_by(17) {
            for z in (-40..100).step_by(11) {
                let origin = Point3::new(x as f32, y as f32, z as f32);
                let corners = cube_corners(origin, 16.0);
                let all_out_of_one = frustum
                    .planes
                    .iter()
                    .any(|plane| corners.iter().all(|c| !plane.contains(*c)));
                let all_in = corners.iter().all(|c| frustum.contains_point(*c));

                let result = frustum.classify_aabb(origin, 16.0);
                assert_eq!(result == Containment::Outside, all_out_of_one);
                assert_eq!(result == Containment::Inside, all_in && !all_out_of_one);
            }
        }
    }
}

#[test]
fn engine_round_trip() {
    let mut engine = EngineState::new(EngineConfig {
        world_size: 2,
        ..Default::default()
    })
    .unwrap();
    assert!(engine.wait_for_idle(TIMEOUT));
    assert!(engine.world().chunks().all(|chunk| chunk.mesh_state() == MeshState::Ready));
    assert!(!engine.render_set().is_empty());

    for batch in engine.render_batches() {
        for (_, side) in &batch.sides {
            assert!(side.vertex_count > 0);
            let vertices = engine.sink().get_buffer(side.vertex_buffer.unwrap()).unwrap();
            assert_eq!(vertices.len(), side.vertex_count as usize * 12);
        }
    }

    let _ = engine.pick(320.0, 240.0);
    assert!(engine.wait_for_idle(TIMEOUT));
    assert!(engine.world().chunks().all(|chunk| chunk.mesh_state() == MeshState::Ready));
}
