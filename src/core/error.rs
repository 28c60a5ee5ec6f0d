//! Error types for queue and processing operations.

use thiserror::Error;

/// Errors produced by the task queues.
///
/// `EmptyQueue` and `EndOfQueue` are control-flow signals rather than
/// failures: the former comes from a non-blocking pop on an empty heap, the
/// latter from a blocking pop on a queue that has been closed and drained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Capacity reached at ingestion; the caller decides whether to retry or drop.
    #[error("queue full: capacity {capacity}")]
    QueueFull {
        /// Configured capacity of the queue.
        capacity: usize,
    },
    /// The queue has been closed and accepts no new work.
    #[error("queue closed")]
    Closed,
    /// The queue is shutting down and accepts no new work.
    #[error("queue shutting down")]
    ShuttingDown,
    /// No task is available right now.
    #[error("queue empty")]
    EmptyQueue,
    /// The queue is closed and every queued task has been handed out.
    #[error("end of queue")]
    EndOfQueue,
}

/// Errors produced while executing a single task.
///
/// These never escape the worker loop: they are logged, counted in the pool
/// statistics and the task is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// No processor is registered for the task type. The registry falls back to
    /// its default processor, so this is only reported, never returned by it.
    #[error("no processor registered for task type `{0}`")]
    UnresolvedProcessor(String),
    /// The processor did not finish within its time budget.
    #[error("processing timed out after {timeout_ms} ms")]
    Timeout {
        /// Budget that was exceeded, in milliseconds.
        timeout_ms: u64,
    },
    /// The processor declined a task type it cannot handle.
    #[error("processor `{processor}` cannot handle task type `{task_type}`")]
    Unsupported {
        /// Name of the processor that declined.
        processor: String,
        /// Task type that was offered.
        task_type: String,
    },
    /// The task payload could not be decoded by the processor.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// The processor returned an error.
    #[error("processing failed: {0}")]
    Failed(String),
    /// The processor panicked.
    #[error("processor panicked")]
    Panicked,
}

impl From<serde_json::Error> for ProcessError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
