//! Runtime adapters for async processors.

#[cfg(feature = "tokio-runtime")]
pub mod tokio_processor;

#[cfg(feature = "tokio-runtime")]
pub use tokio_processor::{AsyncProcessor, TokioProcessor};
