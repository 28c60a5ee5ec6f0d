//! Infrastructure adapters: queue backends.

pub mod queue;

pub use queue::{ChannelTaskQueue, PriorityTaskQueue, SafePriorityQueue};
