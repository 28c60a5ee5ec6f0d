//! Worker execution loop: fetch, resolve a processor, process under a
//! timeout, report.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, error, trace, warn};

use super::error::ProcessError;
use super::processor::Processor;
use super::queue::{Fetch, TaskQueue};
use super::registry::ProcessorRegistry;
use super::task::Task;
use super::worker_pool::PoolCounters;

/// Where a worker is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Between tasks.
    Idle,
    /// Waiting on the queue.
    Fetching,
    /// Running a processor.
    Processing,
}

/// Result of handing one task to its processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The processor returned `Ok`.
    Completed,
    /// The processor returned an error, panicked, or declined the task type.
    Failed(ProcessError),
    /// The processor exceeded its budget and was abandoned.
    TimedOut,
}

/// A single executor bound to the pool's shared queue and registry.
pub(crate) struct Worker {
    id: usize,
    queue: Arc<dyn TaskQueue>,
    registry: Arc<ProcessorRegistry>,
    counters: Arc<PoolCounters>,
    /// Never sent on; the pool drops the sender to stop every worker.
    stop_rx: Receiver<()>,
    processing_timeout: Duration,
    idle_backoff: Duration,
    state: WorkerState,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        queue: Arc<dyn TaskQueue>,
        registry: Arc<ProcessorRegistry>,
        counters: Arc<PoolCounters>,
        stop_rx: Receiver<()>,
        processing_timeout: Duration,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            id,
            queue,
            registry,
            counters,
            stop_rx,
            processing_timeout,
            idle_backoff,
            state: WorkerState::Idle,
        }
    }

    /// Signal readiness, then loop until stopped or the queue is closed.
    pub(crate) fn run(mut self, ready_tx: Sender<usize>) {
        debug!(worker_id = self.id, "Worker started");
        if ready_tx.send(self.id).is_err() {
            debug!(worker_id = self.id, "Pool stopped waiting for readiness");
        }
        drop(ready_tx);

        loop {
            if self.stop_requested() {
                debug!(worker_id = self.id, "Worker received stop signal");
                break;
            }

            self.transition(WorkerState::Fetching);
            match self.queue.fetch() {
                Fetch::Task(task) => {
                    self.transition(WorkerState::Processing);
                    self.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
                    let outcome = self.process_guarded(task);
                    self.counters.record(&outcome);
                    self.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
                    // Exactly one acknowledgment per fetched task, whatever the outcome.
                    self.queue.task_completed();
                    self.transition(WorkerState::Idle);
                }
                Fetch::Idle => {
                    self.transition(WorkerState::Idle);
                    if self.back_off() {
                        debug!(worker_id = self.id, "Worker stopped during backoff");
                        break;
                    }
                }
                Fetch::Closed => {
                    debug!(worker_id = self.id, "Queue closed, worker exiting");
                    break;
                }
            }
        }

        debug!(worker_id = self.id, "Worker thread exiting");
    }

    /// [`process_task`](Self::process_task) with any unwind on this thread
    /// turned into a failed outcome, so the worker survives to acknowledge
    /// the task.
    fn process_guarded(&self, task: Task) -> TaskOutcome {
        let task_id = task.id().to_string();
        panic::catch_unwind(AssertUnwindSafe(|| self.process_task(task))).unwrap_or_else(|_| {
            error!(worker_id = self.id, task_id = %task_id, "Task panicked on the worker thread");
            TaskOutcome::Failed(ProcessError::Panicked)
        })
    }

    /// Resolve a processor for the task and run it under the timeout guard.
    /// Failures are logged here and never propagate out of the worker.
    pub(crate) fn process_task(&self, task: Task) -> TaskOutcome {
        let task_id = task.id().to_string();
        debug!(
            worker_id = self.id,
            task_id = %task_id,
            task_type = task.task_type(),
            priority = task.priority(),
            "Worker processing task"
        );

        let processor = match self.registry.resolve(task.task_type()) {
            Ok(processor) => processor,
            Err(err) => {
                warn!(worker_id = self.id, task_id = %task_id, error = %err, "Routing task to fallback processor");
                self.counters.fallback_tasks.fetch_add(1, Ordering::Relaxed);
                self.registry.get_processor(task.task_type())
            }
        };

        if !processor.can_process(task.task_type()) {
            let err = ProcessError::Unsupported {
                processor: processor.name().to_string(),
                task_type: task.task_type().to_string(),
            };
            error!(worker_id = self.id, task_id = %task_id, error = %err, "Task rejected by processor");
            return TaskOutcome::Failed(err);
        }

        match execute_with_timeout(processor, task, self.processing_timeout) {
            Ok(()) => {
                debug!(worker_id = self.id, task_id = %task_id, "Task completed");
                TaskOutcome::Completed
            }
            Err(ProcessError::Timeout { timeout_ms }) => {
                warn!(
                    worker_id = self.id,
                    task_id = %task_id,
                    timeout_ms,
                    "Task timed out, abandoning it"
                );
                TaskOutcome::TimedOut
            }
            Err(err) => {
                error!(worker_id = self.id, task_id = %task_id, error = %err, "Task failed");
                TaskOutcome::Failed(err)
            }
        }
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            trace!(worker_id = self.id, from = ?self.state, to = ?next, "Worker state change");
            self.state = next;
        }
    }

    fn stop_requested(&self) -> bool {
        !matches!(self.stop_rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleep for the idle backoff, waking early on stop. Returns `true` if a
    /// stop was signaled.
    fn back_off(&self) -> bool {
        !matches!(
            self.stop_rx.recv_timeout(self.idle_backoff),
            Err(RecvTimeoutError::Timeout)
        )
    }
}

/// Run `processor` on its own thread and wait at most `timeout` for it.
///
/// On timeout the processing thread is detached and left to finish on its own;
/// its eventual result is discarded. The helper thread gets a fixed name:
/// task ids are caller-supplied and may not be valid thread names.
///
/// # Errors
///
/// The processor's own error, `ProcessError::Timeout` when the budget is
/// exceeded, or `ProcessError::Panicked` if the processor panicked.
pub fn execute_with_timeout(
    processor: Arc<dyn Processor>,
    task: Task,
    timeout: Duration,
) -> Result<(), ProcessError> {
    let (done_tx, done_rx) = bounded(1);
    let spawned = thread::Builder::new()
        .name("dispatch-task".into())
        .spawn(move || {
            let result = processor.process(&task);
            let _ = done_tx.send(result);
        });
    if let Err(e) = spawned {
        return Err(ProcessError::Failed(format!("failed to spawn processing thread: {e}")));
    }

    match done_rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ProcessError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
        // Sender dropped without a result: the processor unwound.
        Err(RecvTimeoutError::Disconnected) => Err(ProcessError::Panicked),
    }
}
