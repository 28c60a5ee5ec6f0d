//! # Prometheus Dispatch
//!
//! A concurrent task-dispatch engine: tasks are enqueued with a priority (or
//! pushed onto a bounded FIFO channel), a fixed pool of worker threads pulls
//! them, and each task is routed to a pluggable processor selected by its type.
//!
//! ## Key Features
//!
//! - **Priority queue**: array-backed min-heap behind a mutex and condition
//!   variable; blocking pops, sticky close that releases every waiter
//! - **Bounded channel queue**: non-blocking FIFO with explicit `QueueFull`
//!   backpressure and an active-task counter for draining
//! - **Processor registry**: task type → processor with a default fallback
//! - **Timeout guard**: every processor call runs on its own thread and is
//!   abandoned if it exceeds its budget, so a hung task never pins a worker
//! - **Coordinated lifecycle**: all-ready barrier on start, drain-or-cancel
//!   shutdown that joins every worker
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prometheus_dispatch::builders::build_pool;
//! use prometheus_dispatch::config::{ShutdownPolicy, WorkerPoolConfig};
//! use prometheus_dispatch::core::{ProcessorRegistry, Task};
//! use prometheus_dispatch::processors::{EmailProcessor, SEND_EMAIL};
//!
//! prometheus_dispatch::util::init_tracing();
//!
//! let registry = ProcessorRegistry::new().with_processor(SEND_EMAIL, EmailProcessor);
//! let pool = build_pool(
//!     WorkerPoolConfig::new()
//!         .with_worker_count(3)
//!         .with_queue_capacity(10)
//!         .with_shutdown_policy(ShutdownPolicy::Drain),
//!     registry,
//! )?;
//!
//! pool.start()?;
//! for i in 0..10 {
//!     pool.submit(Task::new(format!("task-{i}"), "any").with_priority(i % 3))?;
//! }
//! pool.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Ordering
//!
//! The priority queue hands out the lowest priority value first. Tasks with
//! equal priority come out in no guaranteed order. Tasks without a priority
//! sort after every prioritized task. The channel queue is strictly FIFO.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core dispatch abstractions: tasks, processors, queues and the worker pool.
pub mod core;
/// Configuration models for the worker pool.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Queue backends.
pub mod infra;
/// Concrete processors.
pub mod processors;
/// Runtime adapters for async processors.
pub mod runtime;
/// Shared utilities.
pub mod util;
