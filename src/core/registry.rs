//! Task-type to processor lookup with a default fallback.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::ProcessError;
use super::processor::{DefaultProcessor, Processor};

/// Maps task-type strings to processors.
///
/// The registry is built up front and then shared read-only between workers
/// behind an `Arc`, so lookups need no locking.
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
    fallback: Arc<dyn Processor>,
}

impl ProcessorRegistry {
    /// Create an empty registry that falls back to [`DefaultProcessor`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(DefaultProcessor)
    }

    /// Create an empty registry with a custom fallback processor.
    pub fn with_fallback(fallback: impl Processor) -> Self {
        Self {
            processors: HashMap::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Register a processor for a task type, replacing any previous one.
    ///
    /// A processor whose `can_process` rejects the type is still registered,
    /// but the mismatch is logged since every such task will fail.
    pub fn add_processor(&mut self, task_type: impl Into<String>, processor: impl Processor) {
        let task_type = task_type.into();
        if !processor.can_process(&task_type) {
            warn!(
                task_type = %task_type,
                processor = processor.name(),
                "Registered processor does not accept its task type"
            );
        }
        self.processors.insert(task_type, Arc::new(processor));
    }

    /// Builder form of [`add_processor`](Self::add_processor).
    #[must_use]
    pub fn with_processor(mut self, task_type: impl Into<String>, processor: impl Processor) -> Self {
        self.add_processor(task_type, processor);
        self
    }

    /// Look up the processor registered for `task_type`.
    ///
    /// # Errors
    ///
    /// `ProcessError::UnresolvedProcessor` if nothing is registered for it.
    pub fn resolve(&self, task_type: &str) -> Result<Arc<dyn Processor>, ProcessError> {
        self.processors
            .get(task_type)
            .cloned()
            .ok_or_else(|| ProcessError::UnresolvedProcessor(task_type.to_string()))
    }

    /// Processor for `task_type`, or the fallback when none is registered.
    /// Never fails.
    #[must_use]
    pub fn get_processor(&self, task_type: &str) -> Arc<dyn Processor> {
        match self.resolve(task_type) {
            Ok(processor) => processor,
            Err(err) => {
                debug!(error = %err, fallback = self.fallback.name(), "Using fallback processor");
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Whether a specific processor is registered for `task_type`.
    #[must_use]
    pub fn contains(&self, task_type: &str) -> bool {
        self.processors.contains_key(task_type)
    }

    /// Number of registered task types (the fallback is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether no specific processor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("ProcessorRegistry")
            .field("task_types", &types)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
