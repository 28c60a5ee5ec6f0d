//! Task value routed through the dispatch engine.

use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;

/// Priority used for tasks submitted without an explicit one.
///
/// Lower values are serviced first, so these sort after every explicitly
/// prioritized task.
pub const UNPRIORITIZED: i64 = i64::MAX;

/// A unit of work: identity, type tag, priority and an opaque payload.
///
/// Tasks are immutable once built. Identity is not enforced to be unique;
/// two tasks with the same id are independent work items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    task_type: String,
    priority: Option<i64>,
    created_at_ms: u128,
    #[serde(default)]
    payload: serde_json::Value,
}

impl Task {
    /// Create a task without an explicit priority.
    pub fn new(id: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_type: task_type.into(),
            priority: None,
            created_at_ms: now_ms(),
            payload: serde_json::Value::Null,
        }
    }

    /// Create a task with a random v4 UUID as its id.
    pub fn with_generated_id(task_type: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), task_type)
    }

    /// Set an explicit priority. Lower values run first.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attach a JSON payload for the processor.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Task identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type tag used to select a processor.
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Priority as submitted, if any.
    #[must_use]
    pub const fn explicit_priority(&self) -> Option<i64> {
        self.priority
    }

    /// Priority used for ordering; [`UNPRIORITIZED`] when none was given.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority.unwrap_or(UNPRIORITIZED)
    }

    /// Creation timestamp in milliseconds since epoch.
    #[must_use]
    pub const fn created_at_ms(&self) -> u128 {
        self.created_at_ms
    }

    /// Opaque payload for the processor.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}
