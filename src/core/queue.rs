//! Queue abstraction shared by producers and workers.

use super::error::QueueError;
use super::task::Task;

/// Outcome of a worker's fetch attempt.
#[derive(Debug)]
pub enum Fetch {
    /// A task to process. The worker must acknowledge it with
    /// [`TaskQueue::task_completed`] exactly once.
    Task(Task),
    /// Nothing available right now; back off and retry.
    Idle,
    /// The queue is closed and drained; the worker should exit.
    Closed,
}

/// Producer and consumer contract implemented by every queue backend.
///
/// Each accepted task counts as active from `add_task` until the matching
/// `task_completed`, which is what [`wait_for_tasks`](Self::wait_for_tasks)
/// waits on during a draining shutdown.
pub trait TaskQueue: Send + Sync + 'static {
    /// Enqueue a task without blocking.
    ///
    /// # Errors
    ///
    /// `QueueFull` at capacity, `Closed` or `ShuttingDown` once the queue
    /// stopped admitting work.
    fn add_task(&self, task: Task) -> Result<(), QueueError>;

    /// Fetch the next task for a worker. Blocking backends wait until a task
    /// arrives or the queue closes; polling backends return [`Fetch::Idle`].
    fn fetch(&self) -> Fetch;

    /// Acknowledge that a fetched task is finished, whatever its outcome.
    fn task_completed(&self);

    /// Stop admitting work and release any consumer blocked in `fetch`.
    /// Idempotent.
    fn close(&self);

    /// Block until every accepted task has been acknowledged.
    fn wait_for_tasks(&self);

    /// Tasks waiting to be fetched.
    fn len(&self) -> usize;

    /// Whether no task is waiting.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued tasks.
    fn capacity(&self) -> usize;

    /// Accepted tasks not yet acknowledged (queued or in flight).
    fn active_tasks(&self) -> usize;
}
