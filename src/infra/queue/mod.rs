//! Queue backends.

pub mod channel;
pub mod heap;
pub mod priority;
pub mod tracker;

pub use channel::ChannelTaskQueue;
pub use heap::{EntryId, PriorityHeap};
pub use priority::{PriorityTaskQueue, SafePriorityQueue};
pub use tracker::ActiveTasks;
