//! Background job queue: typed kinds, retry with backoff, dead-lettering.
//!
//! Used for the scheduled expiry sweep; the queue itself is generic so other
//! periodic maintenance can ride on it.

pub mod executor;
pub mod store;
pub mod types;

pub use executor::{JobExecutor, JobExecutorConfig, JobExecutorHandle};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use types::{
    BackoffStrategy, DeadLetterEntry, Job, JobId, JobKind, JobResult, JobStatus, RetryPolicy,
};
