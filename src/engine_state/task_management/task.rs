//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system.
//!
//! ## Core Components
//! - `Task`: a unit of work executed on a worker thread
//! - `TaskResult`: the output of a task, applied on the main thread
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the main thread, with mutable
//!    access to the world and the mesh sink
//!
//! Every task carries a [`BuildTicket`]. The manager uses it to report tasks lost
//! with a dead worker, and results use it to recognise a chunk that changed hands.
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the main thread
//! - Tasks own everything they read; shared voxel data travels as `Arc` snapshots

use crate::engine_state::{
    buffer_state::MeshSink,
    voxels::{coords::ChunkCoord, world::World},
};

/// One dispatched build of one chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BuildTicket {
    /// Chunk being built
    pub position: ChunkCoord,
    /// Build number the chunk was stamped with at dispatch
    pub build: u64,
}

/// A unit of work that can be executed on a background worker.
///
/// Tasks should own all the data they need. They never see the live world.
pub trait Task: Send {
    /// The build this task belongs to.
    fn ticket(&self) -> BuildTicket;

    /// Processes the task and returns a result.
    ///
    /// Runs on a worker thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The result of processing a [`Task`].
pub trait TaskResult: Send {
    /// Applies the result on the main thread.
    ///
    /// # Returns
    /// The chunk the result was applied to, or `None` if it was discarded because
    /// the chunk is gone or no longer waits for this build.
    fn handle_result(
        self: Box<Self>,
        world: &mut World,
        sink: &mut dyn MeshSink,
    ) -> Option<ChunkCoord>;
}
