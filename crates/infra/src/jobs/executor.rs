//! Job executor with retry and backoff handling.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use larder_core::TenantId;

use super::store::JobStore;
use super::types::{Job, JobResult, JobStatus};

/// Job handler function type.
pub type JobHandler = Box<dyn Fn(&Job) -> JobResult + Send + Sync>;

/// Job executor configuration.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// How often to poll for ready jobs
    pub poll_interval: Duration,
    /// Name for logging and the thread
    pub name: String,
    /// Optional tenant filter
    pub tenant_id: Option<TenantId>,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "job-executor".to_string(),
            tenant_id: None,
        }
    }
}

impl JobExecutorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }
}

/// Handle to control a running executor.
#[derive(Debug)]
pub struct JobExecutorHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl JobExecutorHandle {
    /// Request graceful shutdown and wait for the loop to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Background job executor.
///
/// Polls a job store for ready jobs, runs the handler registered for each
/// job's kind, and applies the job's retry policy on failure.
pub struct JobExecutor<S: JobStore> {
    store: S,
    handlers: HashMap<String, JobHandler>,
}

impl<S: JobStore + 'static> JobExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a job kind (exact `type_name` match).
    pub fn register_handler<F>(&mut self, kind: impl Into<String>, handler: F)
    where
        F: Fn(&Job) -> JobResult + Send + Sync + 'static,
    {
        self.handlers.insert(kind.into(), Box::new(handler));
    }

    /// Execute a single (already claimed) job. Synchronous form used by
    /// tests and by the polling loop.
    pub fn execute_one(&self, job: &mut Job) -> Result<(), String> {
        let handler = self
            .handlers
            .get(job.kind.type_name())
            .ok_or_else(|| format!("no handler for job kind: {}", job.kind.type_name()))?;

        job.mark_running();

        match handler(job) {
            JobResult::Success => {
                job.mark_completed();
                self.store.update(job).map_err(|e| e.to_string())?;
                debug!(job = %job.id, "job completed");
                Ok(())
            }
            JobResult::Failure(error) => {
                job.mark_failed(error.clone());
                self.store.update(job).map_err(|e| e.to_string())?;

                if matches!(job.status, JobStatus::DeadLettered { .. }) {
                    warn!(job = %job.id, %error, "job dead-lettered");
                    self.store
                        .dead_letter(job.clone(), error.clone())
                        .map_err(|e| e.to_string())?;
                }

                Err(error)
            }
            JobResult::RetryAfter(delay) => {
                job.mark_failed("retry after delay".to_string());
                job.scheduled_at =
                    Some(Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default());
                self.store.update(job).map_err(|e| e.to_string())?;
                Err("retry after delay".to_string())
            }
        }
    }

    /// Spawn the polling loop in a background thread.
    pub fn spawn(self, config: JobExecutorConfig) -> JobExecutorHandle
    where
        S: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let name = config.name.clone();
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || executor_loop(self, config, shutdown_rx))
            .expect("failed to spawn job executor thread");

        JobExecutorHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn executor_loop<S: JobStore + 'static>(
    executor: JobExecutor<S>,
    config: JobExecutorConfig,
    shutdown_rx: mpsc::Receiver<()>,
) {
    info!(executor = %config.name, "job executor started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match executor.store.claim_next(config.tenant_id) {
            Ok(Some(mut job)) => {
                debug!(executor = %config.name, job = %job.id, kind = ?job.kind, "claimed job");
                if let Err(e) = executor.execute_one(&mut job) {
                    debug!(
                        executor = %config.name,
                        job = %job.id,
                        error = %e,
                        status = ?job.status,
                        "job execution failed"
                    );
                }
            }
            Ok(None) => thread::sleep(config.poll_interval),
            Err(e) => {
                error!(executor = %config.name, error = ?e, "failed to claim job");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(executor = %config.name, "job executor stopped");
}
