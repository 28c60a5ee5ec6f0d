//! Processor contract and the fallback processor.

use tracing::info;

use super::error::ProcessError;
use super::task::Task;

/// Business logic behind a task type.
///
/// Processors are invoked from a dedicated helper thread per task, so a slow
/// or hung `process` call never stalls the worker that dispatched it. The
/// registry hands out shared references, so implementations must be
/// `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use prometheus_dispatch::core::{ProcessError, Processor, Task};
///
/// struct ResizeProcessor;
///
/// impl Processor for ResizeProcessor {
///     fn name(&self) -> &str {
///         "resize"
///     }
///
///     fn can_process(&self, task_type: &str) -> bool {
///         task_type == "resize_image"
///     }
///
///     fn process(&self, task: &Task) -> Result<(), ProcessError> {
///         let _width = task.payload()["width"].as_u64().unwrap_or(0);
///         Ok(())
///     }
/// }
/// ```
pub trait Processor: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this processor accepts tasks of the given type.
    fn can_process(&self, task_type: &str) -> bool;

    /// Execute one task.
    ///
    /// # Errors
    ///
    /// Any [`ProcessError`]; the worker logs it and drops the task.
    fn process(&self, task: &Task) -> Result<(), ProcessError>;
}

/// Fallback processor used when no specific processor is registered.
/// Accepts every task type and only records that the task went through.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProcessor;

impl Processor for DefaultProcessor {
    fn name(&self) -> &str {
        "default"
    }

    fn can_process(&self, _task_type: &str) -> bool {
        true
    }

    fn process(&self, task: &Task) -> Result<(), ProcessError> {
        info!(
            task_id = task.id(),
            task_type = task.task_type(),
            "Processed task with default processor"
        );
        Ok(())
    }
}
