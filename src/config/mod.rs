//! Configuration models for the worker pool and its queue.

pub mod pool;

pub use pool::{QueueMode, ShutdownPolicy, WorkerPoolConfig};
