//! # Task Management System
//!
//! A small worker pool for CPU-side work that must stay off the main thread.
//!
//! ## Architecture Overview
//! - `TaskManager`: central coordinator for task distribution and worker management
//! - `Task`: a unit of work that can be executed asynchronously
//! - `TaskResult`: the result of a completed task, applied on the main thread
//! - `TaskChannel`: communication channel between the main thread and one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. Results are applied on the main thread in `process_completed_tasks()`
//!
//! Each worker holds at most [`MAX_TASKS_IN_FLIGHT`] tasks, so a manager with `n`
//! workers never runs more than `n` tasks at once. Everything else waits in the
//! queue until `process_queued_tasks()` finds a free worker.
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(2);
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // In the main loop:
//! let finished = task_manager.process_completed_tasks(&mut world, &mut sink);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use log::{error, info};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use task::{BuildTicket, Task, TaskResult};

use super::{
    buffer_state::MeshSink,
    voxels::{coords::ChunkCoord, world::World},
};

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: sends tasks from main thread to worker
/// - `result_receiver`: receives task results from worker
/// - `in_flight`: tickets of tasks sent but not yet drained, oldest first
/// - `disconnected`: set once a send fails; the channel is skipped until replaced
/// - `_worker`: handle to the worker thread
///
/// Dropping the channel closes `task_sender`, which ends the worker's receive loop.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    in_flight: VecDeque<BuildTicket>,
    disconnected: bool,
    _worker: JoinHandle<()>,
}

impl TaskChannel {
    /// Spawns a worker thread and connects it.
    fn spawn() -> Self {
        let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
        let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

        let worker = thread::spawn(move || {
            while let Ok(task) = task_rx.recv() {
                let result = task.process();
                if result_tx.send(result).is_err() {
                    break;
                }
            }
        });

        TaskChannel {
            task_sender: task_tx,
            result_receiver: result_rx,
            in_flight: VecDeque::new(),
            disconnected: false,
            _worker: worker,
        }
    }
}

/// What one [`TaskManager::process_completed_tasks`] call drained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletedTasks {
    /// Chunks whose results were applied, in drain order
    pub applied: Vec<ChunkCoord>,
    /// Results that came back but were discarded by their handler
    pub discarded: usize,
    /// Tasks that died with their worker and will never report
    pub lost: Vec<BuildTicket>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: set of active worker channels
/// - `queued_tasks`: tasks waiting for an available worker
/// - `current_channel`: index for round-robin scheduling
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// A manager with zero workers queues every task and never runs any.
    pub fn new(num_workers: usize) -> Self {
        info!(
            "Starting {} task workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        TaskManager {
            channels: (0..num_workers).map(|_| TaskChannel::spawn()).collect(),
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks currently held by workers.
    pub fn tasks_in_flight(&self) -> usize {
        self.channels.iter().map(|c| c.in_flight.len()).sum()
    }

    /// Number of tasks waiting for a worker.
    pub fn queued_len(&self) -> usize {
        self.queued_tasks.len()
    }

    /// `true` if no task is running or queued.
    pub fn is_idle(&self) -> bool {
        self.tasks_in_flight() == 0 && self.queued_tasks.is_empty()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task back if the worker has gone away.
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        let channel = &mut self.channels[channel_idx];
        let ticket = task.ticket();
        match channel.task_sender.send(task) {
            Ok(_) => {
                channel.in_flight.push_back(ticket);
                Ok(())
            }
            Err(task) => {
                channel.disconnected = true;
                Err(task.0)
            }
        }
    }

    /// Finds a worker channel that can accept a new task, round-robin from the
    /// last used channel.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            let channel = &self.channels[current];
            if !channel.disconnected && channel.in_flight.len() < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately handed to a worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        let Some(channel_idx) = self.find_available_channel() else {
            self.queued_tasks.push_back(task);
            return false;
        };

        match self.try_send_task(task, channel_idx) {
            Ok(_) => {
                self.current_channel = (channel_idx + 1) % self.channels.len();
                true
            }
            Err(task) => {
                error!("Worker {} disconnected, queueing task", channel_idx);
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers until either runs out.
    ///
    /// Tasks leave the queue in FIFO order.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    error!("Worker {} disconnected, keeping task queued", channel_idx);
                    self.queued_tasks.push_front(task);
                }
            }
        }
    }

    /// Applies every result the workers have finished since the last call.
    ///
    /// A worker found dead (its task panicked) is replaced by a fresh one, and the
    /// tasks it still held are reported as lost. Never blocks. Must be called from
    /// the main thread.
    pub fn process_completed_tasks(
        &mut self,
        world: &mut World,
        sink: &mut dyn MeshSink,
    ) -> CompletedTasks {
        let mut completed = CompletedTasks::default();
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(result) => {
                        channel.in_flight.pop_front();
                        match result.handle_result(world, sink) {
                            Some(position) => completed.applied.push(position),
                            None => completed.discarded += 1,
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        error!(
                            "Worker {} stopped with {} task(s) in flight, restarting it",
                            idx,
                            channel.in_flight.len()
                        );
                        completed.lost.extend(channel.in_flight.drain(..));
                        *channel = TaskChannel::spawn();
                        break;
                    }
                }
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::buffer_state::BufferState;
    use cgmath::Point3;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    struct EchoTask {
        position: ChunkCoord,
        gate: Option<Arc<Barrier>>,
        panics: bool,
    }

    struct EchoResult(ChunkCoord);

    impl Task for EchoTask {
        fn ticket(&self) -> BuildTicket {
            BuildTicket {
                position: self.position,
                build: self.position.x as u64,
            }
        }

        fn process(&self) -> Box<dyn TaskResult + Send> {
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            if self.panics {
                panic!("worker task failed");
            }
            Box::new(EchoResult(self.position))
        }
    }

    impl TaskResult for EchoResult {
        fn handle_result(
            self: Box<Self>,
            _world: &mut World,
            _sink: &mut dyn MeshSink,
        ) -> Option<ChunkCoord> {
            Some(self.0)
        }
    }

    fn echo(x: i32) -> Box<EchoTask> {
        Box::new(EchoTask {
            position: Point3::new(x, 0, 0),
            gate: None,
            panics: false,
        })
    }

    fn drain(manager: &mut TaskManager, expected: usize) -> CompletedTasks {
        let mut world = World::new();
        let mut sink = BufferState::new();
        let mut all = CompletedTasks::default();
        for _ in 0..1000 {
            let completed = manager.process_completed_tasks(&mut world, &mut sink);
            all.applied.extend(completed.applied);
            all.discarded += completed.discarded;
            all.lost.extend(completed.lost);
            manager.process_queued_tasks();
            if all.applied.len() + all.lost.len() >= expected {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        all
    }

    #[test]
    fn workers_hold_at_most_one_task_each() {
        let gate = Arc::new(Barrier::new(3));
        let mut manager = TaskManager::new(2);
        for x in 0..4 {
            manager.publish_task(Box::new(EchoTask {
                position: Point3::new(x, 0, 0),
                gate: Some(gate.clone()),
                panics: false,
            }));
        }
        assert_eq!(manager.tasks_in_flight(), 2);
        assert_eq!(manager.queued_len(), 2);

        gate.wait();
        let mut finished = drain(&mut manager, 2).applied;
        assert_eq!(manager.tasks_in_flight(), 2);
        assert_eq!(manager.queued_len(), 0);

        gate.wait();
        finished.extend(drain(&mut manager, 2).applied);
        finished.sort_by_key(|p| p.x);
        assert_eq!(finished.iter().map(|p| p.x).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(manager.is_idle());
    }

    #[test]
    fn zero_workers_only_queue() {
        let mut manager = TaskManager::new(0);
        assert_eq!(manager.num_workers(), 0);
        assert!(!manager.publish_task(echo(0)));
        manager.process_queued_tasks();
        assert_eq!(manager.queued_len(), 1);
        assert!(!manager.is_idle());
    }

    #[test]
    fn results_come_back_for_every_task() {
        let mut manager = TaskManager::new(3);
        for x in 0..10 {
            manager.publish_task(echo(x));
        }
        let completed = drain(&mut manager, 10);
        assert_eq!(completed.applied.len(), 10);
        assert!(completed.lost.is_empty());
        assert!(manager.is_idle());
    }

    #[test]
    fn panicking_task_is_reported_lost_and_its_worker_replaced() {
        let mut manager = TaskManager::new(1);
        manager.publish_task(Box::new(EchoTask {
            position: Point3::new(4, 0, 0),
            gate: None,
            panics: true,
        }));

        let completed = drain(&mut manager, 1);
        assert_eq!(
            completed.lost,
            vec![BuildTicket {
                position: Point3::new(4, 0, 0),
                build: 4
            }]
        );
        assert!(manager.is_idle());
        assert_eq!(manager.num_workers(), 1);

        assert!(manager.publish_task(echo(5)));
        let completed = drain(&mut manager, 1);
        assert_eq!(completed.applied, vec![Point3::new(5, 0, 0)]);
        assert!(manager.is_idle());
    }
}
