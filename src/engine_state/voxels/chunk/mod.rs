//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a 16x16x16 block store, the mesh
//! lifecycle state that gates edits and uploads, and the GPU handles of the
//! chunk's last uploaded mesh.
//!
//! ## Lifecycle
//!
//! ```text
//! Unset -load-> PendingSetup -dispatch-> Rebuilding -upload-> Ready
//!                    ^                                          |
//!                    +-------------- block removed -------------+
//! ```
//!
//! A chunk in `Rebuilding` has a background worker reading its blocks, so
//! [`Chunk::remove_block`] refuses to touch it.

use std::sync::Arc;

use cgmath::{Matrix4, Point3, Vector3};
use log::debug;

use crate::engine_state::rendering::chunk_buffers::ChunkBuffers;

use super::coords::{chunk_origin, BlockCoord, ChunkCoord};

pub mod block_store;
pub mod chunk_creation;
pub mod chunk_iteration;

use block_store::BlockStore;

/// Where a chunk is in the mesh rebuild pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshState {
    /// Generated, not yet handed to the scheduler.
    Unset,
    /// Waiting for a free rebuild slot.
    PendingSetup,
    /// A background worker is meshing this chunk.
    Rebuilding,
    /// The uploaded mesh matches the block store.
    Ready,
}

/// What happened to a requested block edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockEdit {
    /// The block was removed.
    Removed,
    /// There was no solid block at that coordinate.
    Missing,
    /// The chunk is being rebuilt and edits are refused until it is done.
    Suppressed,
}

/// Represents a 16x16x16 collection of voxel blocks in the world.
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkCoord,

    /// Block data, shared read-only with background mesh builds.
    ///
    /// Edits go through `Arc::make_mut`, so a worker holding an older snapshot keeps
    /// reading consistent data.
    blocks: Arc<BlockStore>,

    mesh_state: MeshState,

    /// Build number of the mesh build in flight, while `Rebuilding`.
    build: Option<u64>,

    /// GPU handles and counts of the last uploaded mesh, one set per side.
    pub buffers: ChunkBuffers,

    /// Debug shading flag set by the picker. Reset on every upload.
    pub mouse_highlighted: bool,
}

impl Chunk {
    /// Creates a chunk in the `Unset` state with no GPU buffers.
    pub fn new(position: ChunkCoord, blocks: BlockStore) -> Self {
        Self {
            position,
            blocks: Arc::new(blocks),
            mesh_state: MeshState::Unset,
            build: None,
            buffers: ChunkBuffers::default(),
            mouse_highlighted: false,
        }
    }

    /// Read access to the block store.
    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    /// A shared handle to the current block store, for background readers.
    pub fn shared_blocks(&self) -> Arc<BlockStore> {
        Arc::clone(&self.blocks)
    }

    /// Current lifecycle state.
    pub fn mesh_state(&self) -> MeshState {
        self.mesh_state
    }

    /// Build number of the running mesh build, if any.
    pub fn current_build(&self) -> Option<u64> {
        self.build
    }

    /// Moves the chunk to `state`. Leaving `Rebuilding` forgets the running build.
    pub(crate) fn set_mesh_state(&mut self, state: MeshState) {
        if state != MeshState::Rebuilding {
            self.build = None;
        }
        self.mesh_state = state;
    }

    /// Marks the chunk `Rebuilding` under build number `build`.
    pub(crate) fn begin_rebuild(&mut self, build: u64) {
        self.mesh_state = MeshState::Rebuilding;
        self.build = Some(build);
    }

    /// `true` if the chunk is rebuilding under `build` and its solid blocks still
    /// match `blocks`, so a finished build may be installed.
    pub(crate) fn accepts_build(&self, build: u64, blocks: &BlockStore) -> bool {
        self.is_rebuilding() && self.build == Some(build) && self.blocks.same_solidity(blocks)
    }

    /// `true` while a background worker owns this chunk's mesh.
    pub fn is_rebuilding(&self) -> bool {
        self.mesh_state == MeshState::Rebuilding
    }

    /// Removes a block unless the chunk is being rebuilt.
    ///
    /// This only edits the block store. Queueing the rebuild is the caller's job.
    pub fn remove_block(&mut self, block: BlockCoord) -> BlockEdit {
        if self.is_rebuilding() {
            debug!(
                "Ignoring edit of block {:?} in chunk {:?}: chunk is rebuilding",
                block, self.position
            );
            return BlockEdit::Suppressed;
        }
        if !self.blocks.is_solid(block) {
            return BlockEdit::Missing;
        }
        Arc::make_mut(&mut self.blocks).remove(block);
        BlockEdit::Removed
    }

    /// Swaps in the block store produced by a finished mesh build (same solidity,
    /// fresh visibility and occlusion). Check [`Chunk::accepts_build`] first.
    pub(crate) fn install_blocks(&mut self, blocks: BlockStore) {
        self.blocks = Arc::new(blocks);
    }

    /// World-space position of the chunk's minimum corner.
    pub fn world_origin(&self) -> Point3<f32> {
        chunk_origin(self.position)
    }

    /// Model transform placing the chunk-local mesh in the world.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let origin = self.world_origin();
        Matrix4::from_translation(Vector3::new(origin.x, origin.y, origin.z))
    }
}
