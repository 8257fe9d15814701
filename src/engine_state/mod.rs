//! # Engine State Module
//!
//! The core engine module that owns the voxel world and everything that acts on it.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `buffer_state` - The boundary to the graphics API and an in-memory sink
//! * `camera_state` - Camera pose, matrices and unprojection
//! * `rendering` - Meshing, per-chunk buffer handles, frustum culling
//! * `rebuild_scheduler` - Bounded background mesh rebuilds
//! * `picking` - Ray picking and block removal
//! * `task_management` - Worker threads
//! * `voxels` - Blocks, chunks, the world and occlusion sampling
//!
//! ## Architecture
//!
//! `EngineState` is the explicit world context: it owns chunk storage, the rebuild
//! queues, the camera and the render set, and passes them by reference to the
//! systems that need them. Only the main thread touches it. Background workers see
//! immutable snapshots of block data and hand results back through the scheduler.

use std::collections::HashSet;
use std::time::Duration;

use cgmath::{Matrix4, Point3};
use log::{debug, warn};

use crate::config::{ConfigError, EngineConfig};

pub mod buffer_state;
pub mod camera_state;
pub mod picking;
pub mod rebuild_scheduler;
pub mod rendering;
pub mod task_management;
pub mod voxels;

use buffer_state::{BufferState, MeshSink};
use camera_state::CameraState;
use picking::{PickOutcome, RayPicker};
use rebuild_scheduler::{RebuildScheduler, TickReport};
use rendering::{
    chunk_buffers::SideBuffers,
    frustum::{Containment, Frustum},
};
use voxels::{
    block::block_side::BlockSide,
    chunk::{BlockEdit, MeshState},
    coords::{chunk_origin, BlockCoord, ChunkCoord, CHUNK_BASE},
    occlusion::OcclusionSampler,
    world::World,
};

/// Frustum classification counts of the last render-set pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CullingStats {
    /// Chunks fully inside the frustum
    pub inside: usize,
    /// Chunks straddling a frustum plane
    pub partial: usize,
    /// Chunks culled
    pub outside: usize,
}

/// What the renderer needs to draw one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRenderBatch {
    /// Chunk coordinate
    pub position: ChunkCoord,
    /// Model transform of the chunk-local mesh
    pub model: Matrix4<f32>,
    /// Debug shading flag
    pub mouse_highlighted: bool,
    /// Non-empty sides facing the camera
    pub sides: Vec<(BlockSide, SideBuffers)>,
}

/// The main state container for the voxel engine.
///
/// # Examples
///
/// ```ignore
/// let mut engine = EngineState::new(EngineConfig::default())?;
///
/// // Main loop
/// loop {
///     engine.update();
///     for batch in engine.render_batches() {
///         // draw batch.sides with batch.model
///     }
/// }
/// ```
pub struct EngineState<S: MeshSink = BufferState> {
    config: EngineConfig,
    /// Camera pose and matrices
    pub camera_state: CameraState,
    world: World,
    scheduler: RebuildScheduler,
    sink: S,
    picker: RayPicker,
    render_set: HashSet<ChunkCoord>,
    culling: CullingStats,
    last_pv: Option<Matrix4<f32>>,
    last_setup_count: usize,
}

impl EngineState<BufferState> {
    /// Validates `config`, generates the world it describes and uploads into an
    /// in-memory [`BufferState`].
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::generate(config.world_size, config.generation, config.seed);
        Self::with_world(config, world, BufferState::new())
    }
}

impl<S: MeshSink> EngineState<S> {
    /// Builds an engine around an existing world and sink.
    pub fn with_world(config: EngineConfig, world: World, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let occlusion = config
            .occlusion
            .enabled
            .then(|| OcclusionSampler::new(config.occlusion.num_rays, config.occlusion.step));

        Ok(Self {
            camera_state: CameraState::from_config(&config.camera),
            scheduler: RebuildScheduler::new(config.max_concurrent_rebuilds, occlusion),
            picker: RayPicker::new(config.picking.clone()),
            world,
            sink,
            render_set: HashSet::new(),
            culling: CullingStats::default(),
            last_pv: None,
            last_setup_count: 0,
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The voxel world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The rebuild scheduler.
    pub fn scheduler(&self) -> &RebuildScheduler {
        &self.scheduler
    }

    /// The mesh sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Chunks that passed the last frustum pass.
    pub fn render_set(&self) -> &HashSet<ChunkCoord> {
        &self.render_set
    }

    /// Counts of the last frustum pass.
    pub fn culling_stats(&self) -> CullingStats {
        self.culling
    }

    /// One frame of bookkeeping: ticks the rebuild scheduler, then refreshes the
    /// render set if the camera moved or new chunks were set up.
    pub fn update(&mut self) -> TickReport {
        let report = self.scheduler.tick(&mut self.world, &mut self.sink);

        let pv = self.camera_state.pv();
        let setup_count = self
            .world
            .chunks()
            .filter(|chunk| chunk.mesh_state() != MeshState::Unset)
            .count();
        if self.last_pv != Some(pv) || self.last_setup_count != setup_count {
            self.refresh_render_set(&pv);
            self.last_pv = Some(pv);
            self.last_setup_count = setup_count;
        }

        report
    }

    fn refresh_render_set(&mut self, pv: &Matrix4<f32>) {
        let frustum = Frustum::from_matrix(pv);
        let mut stats = CullingStats::default();
        self.render_set.clear();

        for chunk in self.world.chunks() {
            if chunk.mesh_state() == MeshState::Unset {
                continue;
            }
            match frustum.classify_aabb(chunk_origin(chunk.position), CHUNK_BASE as f32) {
                Containment::Inside => stats.inside += 1,
                Containment::Partial => stats.partial += 1,
                Containment::Outside => {
                    stats.outside += 1;
                    continue;
                }
            }
            self.render_set.insert(chunk.position);
        }

        debug!(
            "Render set: {} chunks ({} inside, {} partial, {} outside)",
            self.render_set.len(),
            stats.inside,
            stats.partial,
            stats.outside
        );
        self.culling = stats;
    }

    /// Ticks until the scheduler is idle or `timeout` passes, refreshing the render
    /// set along the way.
    pub fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        let idle = self.scheduler.wait_for_idle(&mut self.world, &mut self.sink, timeout);
        self.update();
        idle
    }

    /// Picks the block under a screen pixel and removes it.
    ///
    /// An unprojection failure aborts the pick and counts as no selection.
    pub fn pick(&mut self, pixel_x: f32, pixel_y: f32) -> PickOutcome {
        for coord in &self.render_set {
            if let Some(chunk) = self.world.get_mut(*coord) {
                chunk.mouse_highlighted = false;
            }
        }

        let ray = match self.camera_state.picking_ray(pixel_x, pixel_y) {
            Ok(ray) => ray,
            Err(err) => {
                warn!("Pick at ({}, {}) aborted: {}", pixel_x, pixel_y, err);
                return PickOutcome::NoSelection;
            }
        };

        self.picker
            .pick(&mut self.world, &mut self.scheduler, &self.render_set, &ray)
    }

    /// Removes a block directly, with the same rebuild guard and neighbour cascade
    /// as a pick.
    pub fn remove_block(&mut self, chunk: ChunkCoord, block: BlockCoord) -> BlockEdit {
        picking::remove_block(&mut self.world, &mut self.scheduler, chunk, block)
    }

    /// Draw list for the current frame.
    pub fn render_batches(&self) -> Vec<ChunkRenderBatch> {
        let eye: Point3<f32> = self.camera_state.camera().position;
        let mut batches: Vec<ChunkRenderBatch> = self
            .render_set
            .iter()
            .filter_map(|coord| self.world.get(*coord))
            .filter(|chunk| chunk.buffers.is_uploaded())
            .map(|chunk| ChunkRenderBatch {
                position: chunk.position,
                model: chunk.model_matrix(),
                mouse_highlighted: chunk.mouse_highlighted,
                sides: chunk.buffers.sides_facing(chunk.world_origin(), eye),
            })
            .filter(|batch| !batch.sides.is_empty())
            .collect();
        batches.sort_by_key(|batch| (batch.position.x, batch.position.y, batch.position.z));
        batches
    }
}
