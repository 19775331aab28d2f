//! Logging bootstrap for processes embedding the stock engine.

pub mod tracing;

pub use tracing::{init, init_with_filter};
