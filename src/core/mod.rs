//! Core dispatch abstractions: tasks, processors, queues and the worker pool.

pub mod error;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod task;
pub mod worker;
pub mod worker_pool;

pub use error::{AppResult, ProcessError, QueueError};
pub use processor::{DefaultProcessor, Processor};
pub use queue::{Fetch, TaskQueue};
pub use registry::ProcessorRegistry;
pub use task::{Task, UNPRIORITIZED};
pub use worker::{execute_with_timeout, TaskOutcome, WorkerState};
pub use worker_pool::{PoolError, PoolState, PoolStats, WorkerPool};
