//! Per-chunk GPU buffer handles.
//!
//! Each chunk keeps one set of handles per face direction. Uploading a new mesh
//! overwrites the existing buffers in place; a direction with no geometry keeps
//! a zero count and is never drawn.

use cgmath::{InnerSpace, Point3};

use crate::engine_state::{
    buffer_state::{BufferUsage, BufferWriteCommand, GpuBufferHandle, MeshSink},
    voxels::{block::block_side::BlockSide, coords::CHUNK_BASE},
};

use super::meshing::{Mesh, INDEX_BUFFER_LABELS, OCCLUSION_BUFFER_LABELS, VERTEX_BUFFER_LABELS};

/// GPU handles and counts for one face direction of a chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SideBuffers {
    /// Vertex positions
    pub vertex_buffer: Option<GpuBufferHandle>,
    /// Triangle indices
    pub index_buffer: Option<GpuBufferHandle>,
    /// Per-vertex occlusion
    pub occlusion_buffer: Option<GpuBufferHandle>,
    /// Number of vertices in the last upload
    pub vertex_count: u32,
    /// Number of indices in the last upload
    pub index_count: u32,
}

impl SideBuffers {
    /// `true` if the renderer should skip this side.
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0 || self.vertex_buffer.is_none()
    }
}

/// The six [`SideBuffers`] of a chunk, in `BlockSide` order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkBuffers {
    /// Handles per side
    pub sides: [SideBuffers; 6],
}

impl ChunkBuffers {
    /// Handles of one side.
    pub fn side(&self, side: BlockSide) -> &SideBuffers {
        &self.sides[side.index()]
    }

    /// `true` once any side has been uploaded.
    pub fn is_uploaded(&self) -> bool {
        self.sides.iter().any(|side| side.vertex_buffer.is_some())
    }

    /// Uploads a finished mesh through `sink`.
    ///
    /// Sides with geometry are written into their existing buffers, or into new
    /// buffers on first upload. Empty sides issue no write and get zero counts.
    pub fn upload(&mut self, sink: &mut dyn MeshSink, mesh: &Mesh) {
        for side in BlockSide::all() {
            let i = side.index();
            let mesh_side = mesh.side(side);
            let buffers = &mut self.sides[i];

            buffers.vertex_count = mesh_side.vertices.len() as u32;
            buffers.index_count = mesh_side.indices.len() as u32;
            if mesh_side.is_empty() {
                continue;
            }

            buffers.vertex_buffer = Some(sink.write(BufferWriteCommand {
                label: VERTEX_BUFFER_LABELS[i],
                usage: BufferUsage::Vertex,
                target: buffers.vertex_buffer,
                data: &mesh_side.vertices,
            }));
            buffers.index_buffer = Some(sink.write(BufferWriteCommand {
                label: INDEX_BUFFER_LABELS[i],
                usage: BufferUsage::Index,
                target: buffers.index_buffer,
                data: &mesh_side.indices,
            }));
            buffers.occlusion_buffer = Some(sink.write(BufferWriteCommand {
                label: OCCLUSION_BUFFER_LABELS[i],
                usage: BufferUsage::Occlusion,
                target: buffers.occlusion_buffer,
                data: &mesh_side.occlusion,
            }));
        }
    }

    /// Sides worth drawing from `camera`: non-empty, and the camera is on the outer
    /// side of the chunk plane the side faces through.
    pub fn sides_facing(
        &self,
        chunk_origin: Point3<f32>,
        camera: Point3<f32>,
    ) -> Vec<(BlockSide, SideBuffers)> {
        BlockSide::all()
            .into_iter()
            .filter(|side| !self.side(*side).is_empty())
            .filter(|side| {
                let plane_point = chunk_origin + side.plane_anchor(CHUNK_BASE as f32);
                (camera - plane_point).dot(side.normal()) > 0.0
            })
            .map(|side| (side, *self.side(side)))
            .collect()
    }
}
