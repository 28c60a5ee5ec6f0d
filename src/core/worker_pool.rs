//! Worker pool with dedicated worker threads.
//!
//! The pool owns a fixed set of OS threads that pull tasks from a shared
//! [`TaskQueue`](crate::core::TaskQueue) and route them through a
//! [`ProcessorRegistry`](crate::core::ProcessorRegistry).
//!
//! # Lifecycle
//!
//! `NotStarted → Running → Draining → Stopped`. [`WorkerPool::start`] returns
//! only once every worker has entered its loop. [`WorkerPool::shutdown`]
//! follows the [`ShutdownPolicy`](crate::config::ShutdownPolicy) chosen at
//! construction and returns once every worker thread has been joined.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use prometheus_dispatch::config::WorkerPoolConfig;
//! use prometheus_dispatch::core::{ProcessorRegistry, Task, TaskQueue, WorkerPool};
//! use prometheus_dispatch::infra::PriorityTaskQueue;
//!
//! let queue = Arc::new(PriorityTaskQueue::new(100));
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(4),
//!     queue.clone(),
//!     Arc::new(ProcessorRegistry::new()),
//! )?;
//!
//! pool.start()?;
//! queue.add_task(Task::new("job-1", "any").with_priority(0))?;
//! pool.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::worker::TaskOutcome;

/// Lifecycle state of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Constructed, no threads spawned yet.
    NotStarted,
    /// Every worker is running its loop.
    Running,
    /// Shutdown in progress.
    Draining,
    /// Every worker thread has been joined.
    Stopped,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Errors returned by pool lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// `start` was called on a pool that is not in `NotStarted`.
    AlreadyStarted(PoolState),

    /// `shutdown` was called on a pool that is not `Running`.
    NotRunning(PoolState),

    /// Configuration validation failed.
    InvalidConfig(String),

    /// A worker thread could not be spawned.
    Spawn(String),

    /// Worker threads panicked; the count is attached.
    WorkerPanicked(usize),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted(state) => write!(f, "pool already started (state: {state})"),
            Self::NotRunning(state) => write!(f, "pool is not running (state: {state})"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Spawn(msg) => write!(f, "failed to spawn worker: {msg}"),
            Self::WorkerPanicked(count) => write!(f, "{count} worker thread(s) panicked"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Tasks currently being processed.
    pub active_tasks: u64,

    /// Tasks waiting in the queue.
    pub queued_tasks: u64,

    /// Tasks whose processor returned `Ok`.
    pub completed_tasks: u64,

    /// Tasks whose processor failed, panicked or declined the task.
    pub failed_tasks: u64,

    /// Tasks abandoned after exceeding the processing timeout.
    pub timed_out_tasks: u64,

    /// Tasks routed to the fallback processor.
    pub fallback_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub timed_out_tasks: AtomicU64,
    pub fallback_tasks: AtomicU64,
}

impl PoolCounters {
    /// Count a finished task by outcome.
    pub fn record(&self, outcome: &TaskOutcome) {
        let counter = match outcome {
            TaskOutcome::Completed => &self.completed_tasks,
            TaskOutcome::Failed(_) => &self.failed_tasks,
            TaskOutcome::TimedOut => &self.timed_out_tasks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queued_tasks: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: queued_tasks as u64,
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            timed_out_tasks: self.timed_out_tasks.load(Ordering::Relaxed),
            fallback_tasks: self.fallback_tasks.load(Ordering::Relaxed),
        }
    }
}

pub use native::WorkerPool;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProcessError;

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::AlreadyStarted(PoolState::Running);
        assert_eq!(format!("{err}"), "pool already started (state: running)");

        let err = PoolError::NotRunning(PoolState::NotStarted);
        assert_eq!(format!("{err}"), "pool is not running (state: not-started)");

        let err = PoolError::WorkerPanicked(2);
        assert_eq!(format!("{err}"), "2 worker thread(s) panicked");
    }

    #[test]
    fn test_pool_stats_default() {
        let stats = PoolStats::default();
        assert_eq!(stats.worker_count, 0);
        assert_eq!(stats.active_tasks, 0);
        assert_eq!(stats.completed_tasks, 0);
    }

    #[test]
    fn test_pool_counters_snapshot() {
        let counters = PoolCounters::default();
        counters.record(&TaskOutcome::Completed);
        counters.record(&TaskOutcome::Completed);
        counters.record(&TaskOutcome::TimedOut);
        counters.record(&TaskOutcome::Failed(ProcessError::Panicked));
        counters.fallback_tasks.fetch_add(3, Ordering::Relaxed);

        let stats = counters.snapshot(4, 7);
        assert_eq!(stats.worker_count, 4);
        assert_eq!(stats.queued_tasks, 7);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.timed_out_tasks, 1);
        assert_eq!(stats.failed_tasks, 1);
        assert_eq!(stats.fallback_tasks, 3);
    }
}
