//! Worker pool configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Default processing budget per task.
pub const DEFAULT_PROCESSING_TIMEOUT_MS: u64 = 5_000;
/// Default sleep between polls of an empty non-blocking queue.
pub const DEFAULT_IDLE_BACKOFF_MS: u64 = 100;
/// Default number of queued tasks before producers are rejected.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

/// Queue backend feeding the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Blocking min-heap ordered by task priority.
    #[default]
    Priority,
    /// Non-blocking bounded FIFO channel.
    Channel,
}

/// How [`WorkerPool::shutdown`](crate::core::WorkerPool::shutdown) treats
/// work that is still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Wait until every accepted task is acknowledged, then close the queue,
    /// stop the workers and join them.
    #[default]
    Drain,
    /// Stop the workers and close the queue right away; tasks still queued
    /// are left unprocessed.
    Cancel,
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads, fixed for the pool's lifetime.
    pub worker_count: usize,
    /// Maximum queued tasks before rejection.
    pub queue_capacity: usize,
    /// Queue backend.
    pub queue_mode: QueueMode,
    /// Shutdown behavior.
    pub shutdown_policy: ShutdownPolicy,
    /// Processing budget per task in milliseconds.
    pub processing_timeout_ms: u64,
    /// Sleep between polls of an empty non-blocking queue, in milliseconds.
    pub idle_backoff_ms: u64,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
    /// Stack size for worker threads in bytes.
    pub thread_stack_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_mode: QueueMode::default(),
            shutdown_policy: ShutdownPolicy::default(),
            processing_timeout_ms: DEFAULT_PROCESSING_TIMEOUT_MS,
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
            thread_name_prefix: "dispatch-worker".into(),
            thread_stack_size: 2 * 1024 * 1024,
        }
    }
}

impl WorkerPoolConfig {
    /// Configuration with defaults (one worker per CPU).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Select the queue backend.
    #[must_use]
    pub fn with_queue_mode(mut self, queue_mode: QueueMode) -> Self {
        self.queue_mode = queue_mode;
        self
    }

    /// Select the shutdown policy.
    #[must_use]
    pub fn with_shutdown_policy(mut self, shutdown_policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = shutdown_policy;
        self
    }

    /// Set the per-task processing budget.
    #[must_use]
    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the idle backoff for non-blocking queues.
    #[must_use]
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Per-task processing budget.
    #[must_use]
    pub const fn processing_timeout(&self) -> Duration {
        Duration::from_millis(self.processing_timeout_ms)
    }

    /// Idle backoff for non-blocking queues.
    #[must_use]
    pub const fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// A message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.processing_timeout_ms == 0 {
            return Err("processing_timeout_ms must be greater than 0".into());
        }
        if self.queue_mode == QueueMode::Channel && self.idle_backoff_ms == 0 {
            return Err("idle_backoff_ms must be greater than 0 in channel mode".into());
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `DISPATCH_*` environment variables, reading a
    /// `.env` file first if one exists. Unset variables take their defaults.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `DISPATCH_WORKERS` | `worker_count` |
    /// | `DISPATCH_QUEUE_CAPACITY` | `queue_capacity` |
    /// | `DISPATCH_QUEUE_MODE` | `queue_mode` (`priority` or `channel`) |
    /// | `DISPATCH_SHUTDOWN_POLICY` | `shutdown_policy` (`drain` or `cancel`) |
    /// | `DISPATCH_PROCESSING_TIMEOUT_MS` | `processing_timeout_ms` |
    /// | `DISPATCH_IDLE_BACKOFF_MS` | `idle_backoff_ms` |
    ///
    /// # Errors
    ///
    /// A variable that does not parse, or an invalid resulting configuration.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Some(v) = env_var("DISPATCH_WORKERS") {
            cfg.worker_count = v.parse().context("DISPATCH_WORKERS")?;
        }
        if let Some(v) = env_var("DISPATCH_QUEUE_CAPACITY") {
            cfg.queue_capacity = v.parse().context("DISPATCH_QUEUE_CAPACITY")?;
        }
        if let Some(v) = env_var("DISPATCH_QUEUE_MODE") {
            cfg.queue_mode = parse_enum(&v).context("DISPATCH_QUEUE_MODE")?;
        }
        if let Some(v) = env_var("DISPATCH_SHUTDOWN_POLICY") {
            cfg.shutdown_policy = parse_enum(&v).context("DISPATCH_SHUTDOWN_POLICY")?;
        }
        if let Some(v) = env_var("DISPATCH_PROCESSING_TIMEOUT_MS") {
            cfg.processing_timeout_ms = v.parse().context("DISPATCH_PROCESSING_TIMEOUT_MS")?;
        }
        if let Some(v) = env_var("DISPATCH_IDLE_BACKOFF_MS") {
            cfg.idle_backoff_ms = v.parse().context("DISPATCH_IDLE_BACKOFF_MS")?;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a snake_case enum name the same way serde reads it from JSON.
fn parse_enum<T: for<'de> Deserialize<'de>>(value: &str) -> AppResult<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .map_err(|e| anyhow::anyhow!("unrecognized value `{value}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = WorkerPoolConfig::new();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.processing_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.idle_backoff(), Duration::from_millis(100));
        assert_eq!(cfg.shutdown_policy, ShutdownPolicy::Drain);
    }

    #[test]
    fn test_parse_enum() {
        assert_eq!(parse_enum::<QueueMode>("Channel").unwrap(), QueueMode::Channel);
        assert_eq!(parse_enum::<ShutdownPolicy>(" cancel ").unwrap(), ShutdownPolicy::Cancel);
        assert!(parse_enum::<QueueMode>("fifo").is_err());
    }

    #[test]
    fn test_oversized_durations_saturate() {
        let cfg = WorkerPoolConfig::new()
            .with_processing_timeout(Duration::MAX)
            .with_idle_backoff(Duration::from_millis(250));
        assert_eq!(cfg.processing_timeout_ms, u64::MAX);
        assert_eq!(cfg.idle_backoff_ms, 250);
    }
}
