//! Blocking priority queue: the heap behind a mutex and condition variable.

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::core::{Fetch, QueueError, Task, TaskQueue};

use super::heap::PriorityHeap;
use super::tracker::ActiveTasks;

struct State {
    heap: PriorityHeap,
    closed: bool,
}

/// Thread-safe wrapper around [`PriorityHeap`] with blocking pops.
///
/// All heap access happens under one lock, so a pop is exclusive: no two
/// consumers can receive the same task, and pops follow heap order.
///
/// Closing is sticky. After [`close`](Self::close) pushes fail with
/// `Closed`, queued tasks are still handed out, and once the heap is empty
/// every blocked [`pop`](Self::pop) returns `EndOfQueue`.
pub struct SafePriorityQueue {
    state: Mutex<State>,
    available: Condvar,
}

impl SafePriorityQueue {
    /// Create an open, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                heap: PriorityHeap::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Push a task and wake one waiting consumer. Never blocks on capacity.
    ///
    /// # Errors
    ///
    /// `QueueError::Closed` after [`close`](Self::close).
    pub fn push(&self, task: Task) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        state.heap.push(task);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Push only if fewer than `capacity` tasks are queued. The size check and
    /// the insert share one critical section.
    ///
    /// # Errors
    ///
    /// `QueueError::Closed` after close, `QueueError::QueueFull` at capacity.
    pub fn push_bounded(&self, task: Task, capacity: usize) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        if state.heap.len() >= capacity {
            return Err(QueueError::QueueFull { capacity });
        }
        state.heap.push(task);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Pop the most urgent task, waiting while the queue is empty and open.
    ///
    /// # Errors
    ///
    /// `QueueError::EndOfQueue` once the queue is closed and empty.
    pub fn pop(&self) -> Result<Task, QueueError> {
        let mut state = self.state.lock();
        while state.heap.is_empty() && !state.closed {
            trace!("pop waiting for tasks");
            self.available.wait(&mut state);
        }
        match state.heap.pop() {
            Ok(task) => Ok(task),
            Err(_) => {
                debug!("pop: queue closed and empty");
                Err(QueueError::EndOfQueue)
            }
        }
    }

    /// Pop without waiting.
    ///
    /// # Errors
    ///
    /// `QueueError::EmptyQueue` if open and empty, `QueueError::EndOfQueue`
    /// if closed and empty.
    pub fn try_pop(&self) -> Result<Task, QueueError> {
        let mut state = self.state.lock();
        state.heap.pop().map_err(|err| {
            if state.closed {
                QueueError::EndOfQueue
            } else {
                err
            }
        })
    }

    /// Close the queue and wake every blocked consumer. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Whether no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }
}

impl Default for SafePriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Capacity-limited priority queue used as a pool's task source.
///
/// Producers get immediate `QueueFull` rejections instead of blocking;
/// workers block in `fetch` until a task arrives or the queue closes.
pub struct PriorityTaskQueue {
    inner: SafePriorityQueue,
    capacity: usize,
    active: ActiveTasks,
}

impl PriorityTaskQueue {
    /// Create a queue holding at most `capacity` waiting tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: SafePriorityQueue::new(),
            capacity,
            active: ActiveTasks::new(),
        }
    }

    /// Pop the most urgent task, blocking while empty and open.
    ///
    /// # Errors
    ///
    /// `QueueError::EndOfQueue` once closed and drained.
    pub fn get_task(&self) -> Result<Task, QueueError> {
        self.inner.pop()
    }
}

impl TaskQueue for PriorityTaskQueue {
    fn add_task(&self, task: Task) -> Result<(), QueueError> {
        // Count before inserting so a fast worker cannot acknowledge first.
        self.active.increment();
        if let Err(err) = self.inner.push_bounded(task, self.capacity) {
            self.active.complete();
            return Err(err);
        }
        Ok(())
    }

    fn fetch(&self) -> Fetch {
        match self.inner.pop() {
            Ok(task) => Fetch::Task(task),
            Err(_) => Fetch::Closed,
        }
    }

    fn task_completed(&self) {
        self.active.complete();
    }

    fn close(&self) {
        self.inner.close();
    }

    fn wait_for_tasks(&self) {
        self.active.wait_idle();
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn active_tasks(&self) -> usize {
        self.active.get()
    }
}
