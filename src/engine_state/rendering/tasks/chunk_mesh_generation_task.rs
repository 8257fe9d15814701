//! Task for generating mesh data for chunks in a background thread.
//!
//! The task reads an immutable [`WorldSnapshot`], so the worker never touches the
//! live world. The result carries the finished mesh back to the main thread, which
//! is the only place buffers are written. A result is only installed while its
//! chunk is still rebuilding under the same build number.

use std::sync::Arc;

use log::{debug, warn};

use crate::engine_state::{
    buffer_state::MeshSink,
    rendering::meshing::{ChunkMeshOutput, MeshBuilder},
    task_management::task::{BuildTicket, Task, TaskResult},
    voxels::{
        coords::ChunkCoord,
        occlusion::OcclusionSampler,
        world::{World, WorldSnapshot},
    },
};

/// A task that meshes one chunk in a background thread.
pub struct ChunkMeshGenerationTask {
    ticket: BuildTicket,
    snapshot: WorldSnapshot,
    occlusion: Option<Arc<OcclusionSampler>>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `ticket` - The chunk to mesh and the build number it was stamped with
    /// * `snapshot` - Block data of the chunk and its neighbours at dispatch time
    /// * `occlusion` - Sampler for fresh occlusion, or `None` to keep stored values
    pub fn new(
        ticket: BuildTicket,
        snapshot: WorldSnapshot,
        occlusion: Option<Arc<OcclusionSampler>>,
    ) -> Self {
        ChunkMeshGenerationTask {
            ticket,
            snapshot,
            occlusion,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn ticket(&self) -> BuildTicket {
        self.ticket
    }

    fn process(&self) -> Box<dyn TaskResult + Send> {
        let position = self.ticket.position;
        let output = MeshBuilder::from_snapshot(&self.snapshot, position).map(|builder| {
            match &self.occlusion {
                Some(sampler) => builder.build_with_occlusion(sampler, &self.snapshot),
                None => builder.build(),
            }
        });

        Box::new(ChunkMeshGenerationTaskResult {
            ticket: self.ticket,
            output,
        })
    }
}

/// The result of a chunk mesh generation task.
pub struct ChunkMeshGenerationTaskResult {
    ticket: BuildTicket,
    output: Option<ChunkMeshOutput>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Installs the refreshed block store and uploads the mesh through `sink`.
    fn handle_result(
        self: Box<Self>,
        world: &mut World,
        sink: &mut dyn MeshSink,
    ) -> Option<ChunkCoord> {
        let BuildTicket { position, build } = self.ticket;
        let Some(output) = self.output else {
            warn!("Chunk {:?} vanished before it could be meshed", position);
            return None;
        };
        let Some(chunk) = world.get_mut(position) else {
            warn!("Dropping mesh of unloaded chunk {:?}", position);
            return None;
        };
        if !chunk.accepts_build(build, &output.blocks) {
            warn!(
                "Dropping stale mesh of chunk {:?}: build {} no longer matches",
                position, build
            );
            return None;
        }

        chunk.install_blocks(output.blocks);
        chunk.buffers.upload(sink, &output.mesh);
        chunk.mouse_highlighted = false;

        debug!(
            "Uploaded chunk {:?}: {} triangles ({} culled)",
            position,
            output.stats.triangles(),
            output.stats.saved_triangles()
        );
        Some(position)
    }
}
