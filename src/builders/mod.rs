//! Builders to construct worker pools from configuration.

pub mod pool_builder;

pub use pool_builder::{build_pool, build_pool_from_env, build_queue};
