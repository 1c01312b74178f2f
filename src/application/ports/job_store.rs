use async_trait::async_trait;

use crate::domain::{Job, JobId, JobStatus};

use super::RepositoryError;

/// Durable record of job identity, status and results.
///
/// Every mutation is a single atomic write. A `done` record is never
/// overwritten by `upsert_processing` or `mark_failed`, so concurrent
/// readers only ever see the status move toward a terminal value.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Creates the record in `processing`, or moves an existing
    /// non-`done` record back to `processing`. Returns the stored job.
    async fn upsert_processing(
        &self,
        job_id: &JobId,
        file_path: &str,
    ) -> Result<Job, RepositoryError>;

    async fn mark_done(
        &self,
        job_id: &JobId,
        transcript: &str,
        interpretation: &str,
    ) -> Result<(), RepositoryError>;

    async fn mark_failed(&self, job_id: &JobId) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Job>, RepositoryError>;

    async fn get_by_job_id(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError>;

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError>;
}
