//! Job storage: queue, claim, update, dead-letter.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use larder_core::TenantId;

use super::types::{DeadLetterEntry, Job, JobId, JobStatus};

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job store lock poisoned")]
    LockPoisoned,

    #[error("job not found")]
    NotFound,
}

/// Storage abstraction for the job queue.
pub trait JobStore: Send + Sync {
    fn enqueue(&self, job: Job) -> Result<(), JobStoreError>;

    /// Claim the oldest ready job (Pending, or Failed past its backoff),
    /// marking it Running. `tenant_id` restricts the scan to one tenant.
    fn claim_next(&self, tenant_id: Option<TenantId>) -> Result<Option<Job>, JobStoreError>;

    fn update(&self, job: &Job) -> Result<(), JobStoreError>;

    fn dead_letter(&self, job: Job, reason: String) -> Result<(), JobStoreError>;

    fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError>;

    fn dead_letters(&self) -> Result<Vec<DeadLetterEntry>, JobStoreError>;
}

impl<S> JobStore for std::sync::Arc<S>
where
    S: JobStore + ?Sized,
{
    fn enqueue(&self, job: Job) -> Result<(), JobStoreError> {
        (**self).enqueue(job)
    }

    fn claim_next(&self, tenant_id: Option<TenantId>) -> Result<Option<Job>, JobStoreError> {
        (**self).claim_next(tenant_id)
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn dead_letter(&self, job: Job, reason: String) -> Result<(), JobStoreError> {
        (**self).dead_letter(job, reason)
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
        (**self).get(id)
    }

    fn dead_letters(&self) -> Result<Vec<DeadLetterEntry>, JobStoreError> {
        (**self).dead_letters()
    }
}

/// In-memory job store for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    dlq: RwLock<Vec<DeadLetterEntry>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn enqueue(&self, job: Job) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| JobStoreError::LockPoisoned)?;
        jobs.insert(job.id, job);
        Ok(())
    }

    fn claim_next(&self, tenant_id: Option<TenantId>) -> Result<Option<Job>, JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| JobStoreError::LockPoisoned)?;

        let claimed_id = jobs
            .values()
            .filter(|j| tenant_id.is_none_or(|t| j.tenant_id == t))
            .filter(|j| {
                matches!(j.status, JobStatus::Pending | JobStatus::Failed { .. }) && j.is_ready()
            })
            .min_by_key(|j| j.created_at)
            .map(|j| j.id);

        Ok(claimed_id.and_then(|id| {
            jobs.get_mut(&id).map(|job| {
                job.status = JobStatus::Running;
                job.clone()
            })
        }))
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| JobStoreError::LockPoisoned)?;
        if !jobs.contains_key(&job.id) {
            return Err(JobStoreError::NotFound);
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn dead_letter(&self, job: Job, reason: String) -> Result<(), JobStoreError> {
        let mut dlq = self.dlq.write().map_err(|_| JobStoreError::LockPoisoned)?;
        dlq.push(DeadLetterEntry::new(job, reason));
        Ok(())
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| JobStoreError::LockPoisoned)?;
        Ok(jobs.get(&id).cloned())
    }

    fn dead_letters(&self) -> Result<Vec<DeadLetterEntry>, JobStoreError> {
        let dlq = self.dlq.read().map_err(|_| JobStoreError::LockPoisoned)?;
        Ok(dlq.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::JobKind;

    #[test]
    fn claim_marks_running_and_respects_tenant_filter() {
        let store = InMemoryJobStore::new();
        let mine = TenantId::new();
        let other = TenantId::new();

        store.enqueue(Job::new(other, JobKind::custom("a"))).unwrap();
        store.enqueue(Job::new(mine, JobKind::custom("b"))).unwrap();

        let claimed = store.claim_next(Some(mine)).unwrap().unwrap();
        assert_eq!(claimed.tenant_id, mine);
        assert!(matches!(claimed.status, JobStatus::Running));

        // A running job cannot be claimed twice.
        assert!(store.claim_next(Some(mine)).unwrap().is_none());
    }

    #[test]
    fn claim_is_fifo_by_creation_time() {
        let store = InMemoryJobStore::new();
        let tenant = TenantId::new();

        let first = Job::new(tenant, JobKind::custom("first"));
        let first_id = first.id;
        store.enqueue(first).unwrap();
        store.enqueue(Job::new(tenant, JobKind::custom("second"))).unwrap();

        let claimed = store.claim_next(None).unwrap().unwrap();
        assert_eq!(claimed.id, first_id);
    }

    #[test]
    fn update_of_unknown_job_is_an_error() {
        let store = InMemoryJobStore::new();
        let job = Job::new(TenantId::new(), JobKind::custom("ghost"));
        assert!(matches!(
            store.update(&job),
            Err(JobStoreError::NotFound)
        ));
    }
}
