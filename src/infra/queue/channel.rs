//! Bounded FIFO queue on a crossbeam channel.
//!
//! Producers never block: a full buffer is reported as `QueueFull` and a
//! queue that is shutting down as `ShuttingDown`. Consumers poll with
//! [`ChannelTaskQueue::get_task`] and back off when it returns `None`.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::core::{Fetch, QueueError, Task, TaskQueue};

use super::tracker::ActiveTasks;

/// Fixed-capacity FIFO task queue with an active-task counter.
pub struct ChannelTaskQueue {
    task_tx: Sender<Task>,
    task_rx: Receiver<Task>,
    capacity: usize,
    /// Shutdown flag. Producers hold the read lock across check-and-send, so
    /// no task is admitted once `start_shutdown` returns.
    shutting_down: RwLock<bool>,
    active: ActiveTasks,
}

impl ChannelTaskQueue {
    /// Create a queue buffering at most `capacity` tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (task_tx, task_rx) = bounded(capacity);
        Self {
            task_tx,
            task_rx,
            capacity,
            shutting_down: RwLock::new(false),
            active: ActiveTasks::new(),
        }
    }

    /// Dequeue the oldest task without blocking.
    #[must_use]
    pub fn get_task(&self) -> Option<Task> {
        self.task_rx.try_recv().ok()
    }

    /// Stop admitting tasks. Already queued tasks can still be fetched.
    pub fn start_shutdown(&self) {
        let mut shutting_down = self.shutting_down.write();
        if !*shutting_down {
            *shutting_down = true;
            info!(queued = self.task_rx.len(), "Task queue shutting down");
        }
    }

    /// Whether [`start_shutdown`](Self::start_shutdown) has been called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutting_down.read()
    }
}

impl TaskQueue for ChannelTaskQueue {
    fn add_task(&self, task: Task) -> Result<(), QueueError> {
        let shutting_down = self.shutting_down.read();
        if *shutting_down {
            return Err(QueueError::ShuttingDown);
        }
        self.active.increment();
        match self.task_tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                self.active.complete();
                debug!(task_id = task.id(), "Task queue full");
                Err(QueueError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => {
                self.active.complete();
                Err(QueueError::ShuttingDown)
            }
        }
    }

    fn fetch(&self) -> Fetch {
        match self.get_task() {
            Some(task) => Fetch::Task(task),
            None if self.is_shutting_down() => Fetch::Closed,
            None => Fetch::Idle,
        }
    }

    fn task_completed(&self) {
        self.active.complete();
    }

    fn close(&self) {
        self.start_shutdown();
    }

    fn wait_for_tasks(&self) {
        self.active.wait_idle();
    }

    fn len(&self) -> usize {
        self.task_rx.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn active_tasks(&self) -> usize {
        self.active.get()
    }
}
