//! Email delivery processor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{ProcessError, Processor, Task};

/// Task type handled by [`EmailProcessor`].
pub const SEND_EMAIL: &str = "send_email";

/// Payload of a `send_email` task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address.
    pub receiver: String,
    /// Sender address.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Named content parts, e.g. `text` and `html`.
    #[serde(default)]
    pub content: HashMap<String, String>,
}

impl EmailMessage {
    /// Build a `send_email` task carrying this message.
    ///
    /// # Errors
    ///
    /// `ProcessError::InvalidPayload` if the message cannot be serialized.
    pub fn into_task(self, id: impl Into<String>) -> Result<Task, ProcessError> {
        Ok(Task::new(id, SEND_EMAIL).with_payload(serde_json::to_value(self)?))
    }
}

/// Processor for `send_email` tasks. Delivery is recorded in the log; the
/// transport is left to the embedding application.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailProcessor;

impl Processor for EmailProcessor {
    fn name(&self) -> &str {
        "email"
    }

    fn can_process(&self, task_type: &str) -> bool {
        task_type == SEND_EMAIL
    }

    fn process(&self, task: &Task) -> Result<(), ProcessError> {
        if !self.can_process(task.task_type()) {
            return Err(ProcessError::Unsupported {
                processor: self.name().to_string(),
                task_type: task.task_type().to_string(),
            });
        }
        let message: EmailMessage = serde_json::from_value(task.payload().clone())?;
        if message.receiver.is_empty() {
            return Err(ProcessError::InvalidPayload("receiver is empty".into()));
        }
        info!(
            task_id = task.id(),
            receiver = %message.receiver,
            sender = %message.sender,
            subject = %message.subject,
            "Processed email task"
        );
        Ok(())
    }
}
