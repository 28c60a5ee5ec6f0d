//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **All-ready barrier**: `start` blocks until each worker has reported in
//! - **One stop signal**: dropping a single sender disconnects every worker's
//!   stop receiver, so a pool-wide stop is observed within one loop iteration
//! - **Queue close wakes blockers**: workers parked in a blocking fetch are
//!   released by closing the queue, never by polling

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{ShutdownPolicy, WorkerPoolConfig};
use crate::core::queue::TaskQueue;
use crate::core::registry::ProcessorRegistry;
use crate::core::worker::Worker;
use crate::core::{QueueError, Task};

use super::{PoolCounters, PoolError, PoolState, PoolStats};

/// Fixed-size pool of worker threads draining a shared task queue.
///
/// The queue is shared rather than owned: producers keep their own handle to
/// it and it outlives the pool.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Shared task source.
    queue: Arc<dyn TaskQueue>,

    /// Read-only processor lookup shared by all workers.
    registry: Arc<ProcessorRegistry>,

    /// Lifecycle state; held across `start` so lifecycle calls serialize.
    state: Mutex<PoolState>,

    /// Stop signal. Never sent on; dropping it stops every worker.
    stop_tx: Mutex<Option<Sender<()>>>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Create a pool over `queue`. No threads are spawned until
    /// [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(
        config: WorkerPoolConfig,
        queue: Arc<dyn TaskQueue>,
        registry: Arc<ProcessorRegistry>,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        Ok(Self {
            config,
            queue,
            registry,
            state: Mutex::new(PoolState::NotStarted),
            stop_tx: Mutex::new(None),
            workers: Mutex::new(Vec::new()),
            counters: Arc::new(PoolCounters::default()),
        })
    }

    /// Spawn the workers and wait until every one of them is in its loop.
    ///
    /// # Errors
    ///
    /// - `PoolError::AlreadyStarted` unless the pool is `NotStarted`
    /// - `PoolError::Spawn` if a thread cannot be created; workers spawned
    ///   so far are stopped and joined and the pool ends up `Stopped`
    /// - `PoolError::WorkerPanicked` if a worker died before reporting ready
    pub fn start(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        if *state != PoolState::NotStarted {
            return Err(PoolError::AlreadyStarted(*state));
        }

        let worker_count = self.config.worker_count;
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (ready_tx, ready_rx) = bounded::<usize>(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let worker = Worker::new(
                worker_id,
                Arc::clone(&self.queue),
                Arc::clone(&self.registry),
                Arc::clone(&self.counters),
                stop_rx.clone(),
                self.config.processing_timeout(),
                self.config.idle_backoff(),
            );
            let ready_tx = ready_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{worker_id}", self.config.thread_name_prefix))
                .stack_size(self.config.thread_stack_size)
                .spawn(move || worker.run(ready_tx));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to spawn worker thread");
                    drop(stop_tx);
                    self.queue.close();
                    join_all(handles);
                    *state = PoolState::Stopped;
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }
        drop(ready_tx);

        // All-ready barrier: one message per worker.
        let mut ready = 0;
        while ready < worker_count {
            if ready_rx.recv().is_err() {
                break;
            }
            ready += 1;
        }
        if ready < worker_count {
            error!(ready = ready, worker_count = worker_count, "Workers exited before reporting ready");
            drop(stop_tx);
            self.queue.close();
            join_all(handles);
            *state = PoolState::Stopped;
            return Err(PoolError::WorkerPanicked(worker_count - ready));
        }

        *self.stop_tx.lock() = Some(stop_tx);
        *self.workers.lock() = handles;
        *state = PoolState::Running;

        info!(
            worker_count = worker_count,
            queue_capacity = self.queue.capacity(),
            shutdown_policy = ?self.config.shutdown_policy,
            "WorkerPool started"
        );
        Ok(())
    }

    /// Shut the pool down according to its [`ShutdownPolicy`] and join every
    /// worker thread.
    ///
    /// - `Drain`: wait for every accepted task to be acknowledged, then close
    ///   the queue, then signal stop, then join.
    /// - `Cancel`: signal stop, close the queue, then join. Tasks still queued
    ///   stay in the queue unprocessed.
    ///
    /// # Errors
    ///
    /// - `PoolError::NotRunning` unless the pool is `Running`
    /// - `PoolError::WorkerPanicked` if any worker thread panicked; the pool
    ///   is `Stopped` regardless
    pub fn shutdown(&self) -> Result<(), PoolError> {
        {
            let mut state = self.state.lock();
            if *state != PoolState::Running {
                return Err(PoolError::NotRunning(*state));
            }
            *state = PoolState::Draining;
        }

        let policy = self.config.shutdown_policy;
        info!(policy = ?policy, active_tasks = self.queue.active_tasks(), "Shutting down worker pool");

        match policy {
            ShutdownPolicy::Drain => {
                self.queue.wait_for_tasks();
                debug!("All accepted tasks acknowledged");
                self.queue.close();
                self.signal_stop();
            }
            ShutdownPolicy::Cancel => {
                self.signal_stop();
                self.queue.close();
            }
        }

        let handles = std::mem::take(&mut *self.workers.lock());
        let worker_count = handles.len();
        let panicked = join_all(handles);
        *self.state.lock() = PoolState::Stopped;

        let left_behind = self.queue.len();
        if left_behind > 0 {
            warn!(queued = left_behind, "Tasks left unprocessed at shutdown");
        }
        info!(worker_count = worker_count, "Worker pool shut down complete");

        if panicked > 0 {
            return Err(PoolError::WorkerPanicked(panicked));
        }
        Ok(())
    }

    /// Enqueue a task on the pool's queue.
    ///
    /// # Errors
    ///
    /// Whatever the queue rejects the task with.
    pub fn submit(&self, task: Task) -> Result<(), QueueError> {
        self.queue.add_task(task)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    /// Shared queue this pool drains.
    #[must_use]
    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        &self.queue
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count, self.queue.len())
    }

    fn signal_stop(&self) {
        // Dropping the only sender disconnects every worker's receiver.
        self.stop_tx.lock().take();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal shutdown but don't join workers in Drop; explicit shutdown()
        // is required for a graceful stop.
        if *self.state.lock() == PoolState::Running {
            self.signal_stop();
            self.queue.close();
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Join every handle and return how many threads panicked.
fn join_all(handles: Vec<JoinHandle<()>>) -> usize {
    let mut panicked = 0;
    for (idx, handle) in handles.into_iter().enumerate() {
        if handle.join().is_ok() {
            debug!(worker_id = idx, "Worker joined successfully");
        } else {
            warn!(worker_id = idx, "Worker panicked");
            panicked += 1;
        }
    }
    panicked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::queue::{ChannelTaskQueue, PriorityTaskQueue};
    use std::time::Duration;

    fn config(workers: usize) -> WorkerPoolConfig {
        WorkerPoolConfig::new()
            .with_worker_count(workers)
            .with_queue_capacity(16)
            .with_idle_backoff(Duration::from_millis(10))
    }

    #[test]
    fn test_lifecycle_states() {
        let pool = WorkerPool::new(
            config(2),
            Arc::new(PriorityTaskQueue::new(16)),
            Arc::new(ProcessorRegistry::new()),
        )
        .unwrap();
        assert_eq!(pool.state(), PoolState::NotStarted);
        assert_eq!(pool.shutdown(), Err(PoolError::NotRunning(PoolState::NotStarted)));

        pool.start().unwrap();
        assert_eq!(pool.state(), PoolState::Running);
        assert_eq!(pool.start(), Err(PoolError::AlreadyStarted(PoolState::Running)));

        pool.shutdown().unwrap();
        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(pool.start(), Err(PoolError::AlreadyStarted(PoolState::Stopped)));
        assert_eq!(pool.shutdown(), Err(PoolError::NotRunning(PoolState::Stopped)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = WorkerPool::new(
            config(0),
            Arc::new(ChannelTaskQueue::new(4)),
            Arc::new(ProcessorRegistry::new()),
        );
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_submit_and_drain() {
        let pool = WorkerPool::new(
            config(2),
            Arc::new(ChannelTaskQueue::new(16)),
            Arc::new(ProcessorRegistry::new()),
        )
        .unwrap();
        pool.start().unwrap();
        for i in 0..5 {
            pool.submit(Task::new(format!("t-{i}"), "any")).unwrap();
        }
        pool.shutdown().unwrap();

        let stats = pool.stats();
        assert_eq!(stats.completed_tasks, 5);
        assert_eq!(stats.fallback_tasks, 5);
        assert_eq!(stats.queued_tasks, 0);
        assert_eq!(pool.submit(Task::new("late", "any")), Err(QueueError::ShuttingDown));
    }
}
