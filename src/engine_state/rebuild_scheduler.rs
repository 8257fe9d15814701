//! # Rebuild Scheduler
//!
//! Moves chunks through `Unset → PendingSetup → Rebuilding → Ready` while keeping
//! at most `K` mesh builds in flight.
//!
//! Every [`RebuildScheduler::tick`] runs three passes on the main thread:
//!
//! 1. **Setup**: chunks still `Unset` become `PendingSetup` and join the queue.
//! 2. **Drain**: finished builds are taken off the worker result channels without
//!    blocking. Each result is uploaded through the sink and its chunk becomes
//!    `Ready`.
//! 3. **Dispatch**: while fewer than `K` builds are in flight, the oldest pending
//!    chunk becomes `Rebuilding` and a [`ChunkMeshGenerationTask`] is published
//!    with a snapshot of the world.
//!
//! A rebuild requested while the chunk is already `Rebuilding` cannot be started
//! (the worker is reading the chunk). It is remembered, and the chunk goes straight
//! back to `PendingSetup` when the running build lands.
//!
//! Every dispatch stamps the chunk with a fresh build number. Results are only
//! installed into a chunk still waiting for that number, so a chunk replaced
//! mid-build keeps its own blocks. A build lost with a crashed worker sends its
//! chunk back to `PendingSetup`.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};
use web_time::Instant;

use super::{
    buffer_state::MeshSink,
    rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
    task_management::{task::BuildTicket, TaskManager},
    voxels::{chunk::MeshState, coords::ChunkCoord, occlusion::OcclusionSampler, world::World},
};

/// Default bound on concurrent rebuilds.
pub const DEFAULT_MAX_CONCURRENT_REBUILDS: usize = 2;

/// What one [`RebuildScheduler::tick`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Results drained and uploaded this tick
    pub uploaded: usize,
    /// Builds started this tick
    pub dispatched: usize,
    /// Builds running after the tick
    pub in_flight: usize,
    /// Chunks waiting for a slot after the tick
    pub pending: usize,
}

/// Bounded-concurrency mesh rebuild pipeline.
pub struct RebuildScheduler {
    max_concurrent: usize,
    task_manager: TaskManager,
    pending: VecDeque<ChunkCoord>,
    stale: HashSet<ChunkCoord>,
    occlusion: Option<Arc<OcclusionSampler>>,
    next_build: u64,
}

impl RebuildScheduler {
    /// Creates a scheduler running at most `max_concurrent` builds (at least one)
    /// on as many worker threads.
    ///
    /// With `occlusion` set, every build samples fresh occlusion for its exposed
    /// faces; otherwise stored values are reused.
    pub fn new(max_concurrent: usize, occlusion: Option<OcclusionSampler>) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            task_manager: TaskManager::new(max_concurrent),
            pending: VecDeque::new(),
            stale: HashSet::new(),
            occlusion: occlusion.map(Arc::new),
            next_build: 0,
        }
    }

    /// The concurrency bound `K`.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Builds dispatched and not yet drained.
    pub fn in_flight(&self) -> usize {
        self.task_manager.tasks_in_flight() + self.task_manager.queued_len()
    }

    /// Chunks waiting for a rebuild slot.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// `true` if nothing is queued, running or deferred.
    ///
    /// Chunks still `Unset` are only noticed by the next [`tick`](Self::tick).
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.stale.is_empty() && self.task_manager.is_idle()
    }

    /// Asks for `coord` to be meshed again.
    ///
    /// # Returns
    /// `true` if a new rebuild was queued or deferred, `false` if one was already
    /// pending or the chunk does not exist.
    pub fn request_rebuild(&mut self, world: &mut World, coord: ChunkCoord) -> bool {
        let Some(chunk) = world.get_mut(coord) else {
            return false;
        };

        match chunk.mesh_state() {
            MeshState::PendingSetup => false,
            MeshState::Rebuilding => {
                debug!("Chunk {:?} is rebuilding, deferring rebuild", coord);
                self.stale.insert(coord)
            }
            MeshState::Unset | MeshState::Ready => {
                chunk.set_mesh_state(MeshState::PendingSetup);
                self.pending.push_back(coord);
                true
            }
        }
    }

    /// Runs the setup, drain and dispatch passes once. Never blocks.
    pub fn tick(&mut self, world: &mut World, sink: &mut dyn MeshSink) -> TickReport {
        let mut report = TickReport::default();

        for chunk in world.chunks_mut() {
            if chunk.mesh_state() == MeshState::Unset {
                chunk.set_mesh_state(MeshState::PendingSetup);
                self.pending.push_back(chunk.position);
            }
        }

        let completed = self.task_manager.process_completed_tasks(world, sink);
        for coord in completed.applied {
            report.uploaded += 1;
            let requeue = self.stale.remove(&coord);
            self.finish_rebuild(world, coord, requeue);
        }
        for ticket in completed.lost {
            self.recover_lost_build(world, ticket);
        }

        self.task_manager.process_queued_tasks();
        while self.in_flight() < self.max_concurrent {
            let Some(coord) = self.pending.pop_front() else {
                break;
            };
            let Some(chunk) = world.get_mut(coord) else {
                continue;
            };
            if chunk.mesh_state() != MeshState::PendingSetup {
                continue;
            }
            self.next_build += 1;
            chunk.begin_rebuild(self.next_build);

            debug!(
                "rebuilds: ({}/{}) - adding chunk ({},{},{})",
                self.in_flight() + 1,
                self.max_concurrent,
                coord.x,
                coord.y,
                coord.z
            );
            let ticket = BuildTicket {
                position: coord,
                build: self.next_build,
            };
            let snapshot = world.snapshot();
            let task = ChunkMeshGenerationTask::new(ticket, snapshot, self.occlusion.clone());
            self.task_manager.publish_task(Box::new(task));
            report.dispatched += 1;
        }

        report.in_flight = self.in_flight();
        report.pending = self.pending.len();
        if report.uploaded > 0 || report.dispatched > 0 {
            trace!("Rebuild tick: {:?}", report);
        }
        report
    }

    /// Moves a chunk whose build result was installed out of `Rebuilding`.
    fn finish_rebuild(&mut self, world: &mut World, coord: ChunkCoord, requeue: bool) {
        let Some(chunk) = world.get_mut(coord) else {
            return;
        };
        if chunk.mesh_state() != MeshState::Rebuilding {
            return;
        }
        if requeue {
            chunk.set_mesh_state(MeshState::PendingSetup);
            self.pending.push_back(coord);
        } else {
            chunk.set_mesh_state(MeshState::Ready);
        }
    }

    /// Sends the chunk of a build that died with its worker back to the queue,
    /// unless the chunk has moved on since.
    fn recover_lost_build(&mut self, world: &mut World, ticket: BuildTicket) {
        let Some(chunk) = world.get_mut(ticket.position) else {
            return;
        };
        if chunk.current_build() != Some(ticket.build) {
            return;
        }
        warn!(
            "Mesh build {} of chunk {:?} was lost, queueing it again",
            ticket.build, ticket.position
        );
        self.stale.remove(&ticket.position);
        chunk.set_mesh_state(MeshState::PendingSetup);
        self.pending.push_back(ticket.position);
    }

    /// Ticks until the scheduler is idle or `timeout` passes.
    ///
    /// For headless drivers and tests; a frame loop calls [`tick`](Self::tick) once
    /// per frame instead.
    ///
    /// # Returns
    /// `true` if the scheduler went idle in time.
    pub fn wait_for_idle(
        &mut self,
        world: &mut World,
        sink: &mut dyn MeshSink,
        timeout: Duration,
    ) -> bool {
        let start = Instant::now();
        loop {
            self.tick(world, sink);
            if self.is_idle() {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
