//! Tokio bridge for async processors.

use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::core::{ProcessError, Processor, Task};

/// Async counterpart of [`Processor`] for I/O-bound business logic.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_dispatch::core::{ProcessError, Task};
/// use prometheus_dispatch::runtime::{AsyncProcessor, TokioProcessor};
///
/// struct WebhookProcessor;
///
/// #[async_trait]
/// impl AsyncProcessor for WebhookProcessor {
///     fn name(&self) -> &str { "webhook" }
///     fn can_process(&self, task_type: &str) -> bool { task_type == "webhook" }
///     async fn process(&self, task: &Task) -> Result<(), ProcessError> {
///         // post task.payload() somewhere
///         Ok(())
///     }
/// }
///
/// registry.add_processor("webhook", TokioProcessor::current(WebhookProcessor)?);
/// ```
#[async_trait]
pub trait AsyncProcessor: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this processor accepts tasks of the given type.
    fn can_process(&self, task_type: &str) -> bool;

    /// Execute one task.
    ///
    /// # Errors
    ///
    /// Any [`ProcessError`]; the worker logs it and drops the task.
    async fn process(&self, task: &Task) -> Result<(), ProcessError>;
}

/// Runs an [`AsyncProcessor`] on a tokio runtime from the blocking
/// [`Processor`] contract.
///
/// The worker pool calls `process` on a dedicated helper thread, which is
/// outside any runtime context, so blocking on the handle there is safe. A
/// timed-out future keeps running on that helper thread until it finishes.
pub struct TokioProcessor<P> {
    inner: P,
    handle: Handle,
}

impl<P: AsyncProcessor> TokioProcessor<P> {
    /// Wrap `inner`, driving it on the runtime behind `handle`.
    pub const fn new(inner: P, handle: Handle) -> Self {
        Self { inner, handle }
    }

    /// Wrap `inner`, driving it on the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// `ProcessError::Failed` when called outside a tokio runtime.
    pub fn current(inner: P) -> Result<Self, ProcessError> {
        let handle = Handle::try_current().map_err(|e| ProcessError::Failed(e.to_string()))?;
        Ok(Self::new(inner, handle))
    }
}

impl<P: AsyncProcessor> Processor for TokioProcessor<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn can_process(&self, task_type: &str) -> bool {
        self.inner.can_process(task_type)
    }

    fn process(&self, task: &Task) -> Result<(), ProcessError> {
        self.handle.block_on(self.inner.process(task))
    }
}
