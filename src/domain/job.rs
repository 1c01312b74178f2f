use super::{JobId, JobStatus};
use chrono::{DateTime, Utc};

/// One audio-to-summary work item as persisted by the job store.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Internal surrogate key, exposed through the status endpoint.
    pub id: i64,
    pub job_id: JobId,
    pub file_path: String,
    pub status: JobStatus,
    pub transcript: Option<String>,
    pub interpretation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn processing(id: i64, job_id: JobId, file_path: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            job_id,
            file_path,
            status: JobStatus::Processing,
            transcript: None,
            interpretation: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }
}
