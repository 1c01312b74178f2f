use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::ports::{JobStore, RepositoryError};
use crate::domain::{Job, JobId, JobStatus};

#[derive(Default)]
struct Inner {
    next_id: i64,
    jobs: HashMap<JobId, Job>,
    ids: HashMap<i64, JobId>,
    history: Vec<(JobId, JobStatus, DateTime<Utc>)>,
}

impl Inner {
    fn record(&mut self, job: &Job) {
        self.history
            .push((job.job_id.clone(), job.status, job.updated_at));
    }
}

/// Process-local job store. Each operation takes the lock once and never
/// across an await, so every mutation is atomic for readers.
#[derive(Default)]
pub struct InMemoryJobStore {
    inner: Mutex<Inner>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::ConnectionFailed("job store lock poisoned".into()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statuses written for `job_id`, oldest first.
    pub fn status_history(&self, job_id: &JobId) -> Vec<JobStatus> {
        self.lock()
            .map(|inner| {
                inner
                    .history
                    .iter()
                    .filter(|(id, _, _)| id == job_id)
                    .map(|(_, status, _)| *status)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn upsert_processing(
        &self,
        job_id: &JobId,
        file_path: &str,
    ) -> Result<Job, RepositoryError> {
        let mut inner = self.lock()?;
        let now = Utc::now();

        if let Some(job) = inner.jobs.get_mut(job_id) {
            if job.is_done() {
                return Ok(job.clone());
            }
            job.status = JobStatus::Processing;
            job.transcript = None;
            job.interpretation = None;
            job.updated_at = now;
            let job = job.clone();
            inner.record(&job);
            return Ok(job);
        }

        inner.next_id += 1;
        let job = Job::processing(inner.next_id, job_id.clone(), file_path.to_string());
        inner.ids.insert(job.id, job_id.clone());
        inner.jobs.insert(job_id.clone(), job.clone());
        inner.record(&job);
        Ok(job)
    }

    async fn mark_done(
        &self,
        job_id: &JobId,
        transcript: &str,
        interpretation: &str,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| RepositoryError::NotFound(job_id.to_string()))?;

        job.status = JobStatus::Done;
        job.transcript = Some(transcript.to_string());
        job.interpretation = Some(interpretation.to_string());
        job.updated_at = Utc::now();
        let job = job.clone();
        inner.record(&job);
        Ok(())
    }

    async fn mark_failed(&self, job_id: &JobId) -> Result<(), RepositoryError> {
        let mut inner = self.lock()?;
        let Some(job) = inner.jobs.get_mut(job_id) else {
            return Ok(());
        };
        if job.is_done() {
            return Ok(());
        }

        job.status = JobStatus::Failed;
        job.transcript = None;
        job.interpretation = None;
        job.updated_at = Utc::now();
        let job = job.clone();
        inner.record(&job);
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Job>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner
            .ids
            .get(&id)
            .and_then(|job_id| inner.jobs.get(job_id))
            .cloned())
    }

    async fn get_by_job_id(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.lock()?.jobs.get(job_id).cloned())
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let inner = self.lock()?;
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.status == status)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.updated_at);
        Ok(jobs)
    }
}
