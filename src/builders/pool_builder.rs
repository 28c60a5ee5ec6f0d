//! Builders to construct a queue and worker pool from configuration.

use std::sync::Arc;

use anyhow::Context;

use crate::config::{QueueMode, WorkerPoolConfig};
use crate::core::{AppResult, PoolError, ProcessorRegistry, TaskQueue, WorkerPool};
use crate::infra::queue::{ChannelTaskQueue, PriorityTaskQueue};

/// Build the queue backend selected by `cfg.queue_mode`.
#[must_use]
pub fn build_queue(cfg: &WorkerPoolConfig) -> Arc<dyn TaskQueue> {
    match cfg.queue_mode {
        QueueMode::Priority => Arc::new(PriorityTaskQueue::new(cfg.queue_capacity)),
        QueueMode::Channel => Arc::new(ChannelTaskQueue::new(cfg.queue_capacity)),
    }
}

/// Build a worker pool and its queue from configuration. The pool is returned
/// in `NotStarted`; its queue is reachable through [`WorkerPool::queue`].
///
/// # Errors
///
/// `PoolError::InvalidConfig` if the configuration is invalid.
pub fn build_pool(cfg: WorkerPoolConfig, registry: ProcessorRegistry) -> Result<WorkerPool, PoolError> {
    cfg.validate().map_err(PoolError::InvalidConfig)?;
    let queue = build_queue(&cfg);
    WorkerPool::new(cfg, queue, Arc::new(registry))
}

/// Build a worker pool from `DISPATCH_*` environment variables.
///
/// # Errors
///
/// Invalid environment configuration.
pub fn build_pool_from_env(registry: ProcessorRegistry) -> AppResult<WorkerPool> {
    let cfg = WorkerPoolConfig::from_env().context("loading worker pool configuration")?;
    Ok(build_pool(cfg, registry)?)
}
