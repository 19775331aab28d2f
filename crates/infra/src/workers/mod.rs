//! Background worker threads consuming bus subscriptions.

pub mod worker;

pub use worker::{Worker, WorkerHandle};
