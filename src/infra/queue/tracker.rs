//! Active-task counter with a blocking wait for quiescence.

use parking_lot::{Condvar, Mutex};
use tracing::warn;

/// Counts accepted-but-unacknowledged tasks and lets callers wait for zero.
#[derive(Debug, Default)]
pub struct ActiveTasks {
    count: Mutex<usize>,
    idle: Condvar,
}

impl ActiveTasks {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count.
    #[must_use]
    pub fn get(&self) -> usize {
        *self.count.lock()
    }

    /// Record an accepted task.
    pub fn increment(&self) {
        *self.count.lock() += 1;
    }

    /// Record a finished task and wake waiters when the count reaches zero.
    pub fn complete(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            warn!("task_completed called with no active tasks");
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    /// Block until the count is zero.
    pub fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}
