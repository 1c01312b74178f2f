use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::application::ports::{JobStore, RepositoryError};
use crate::domain::{Job, JobId, JobStatus};

const JOB_COLUMNS: &str =
    "id, job_id, file_path, status, transcript, interpretation, created_at, updated_at";

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    job_id: String,
    file_path: String,
    status: String,
    transcript: Option<String>,
    interpretation: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<JobStatus>()
            .map_err(RepositoryError::InvalidData)?;

        Ok(Job {
            id: r.id,
            job_id: JobId::new(r.job_id),
            file_path: r.file_path,
            status,
            transcript: r.transcript,
            interpretation: r.interpretation,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, file_path), fields(job_id = %job_id))]
    async fn upsert_processing(
        &self,
        job_id: &JobId,
        file_path: &str,
    ) -> Result<Job, RepositoryError> {
        let now = Utc::now();

        // A done row is left untouched; the conflict update then returns
        // nothing and the stored row is read back below.
        let upserted = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO audio_jobs (job_id, file_path, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (job_id) DO UPDATE
            SET status = EXCLUDED.status,
                transcript = NULL,
                interpretation = NULL,
                updated_at = EXCLUDED.updated_at
            WHERE audio_jobs.status <> $5
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id.as_str())
        .bind(file_path)
        .bind(JobStatus::Processing.as_str())
        .bind(now)
        .bind(JobStatus::Done.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        match upserted {
            Some(row) => row.try_into(),
            None => self
                .get_by_job_id(job_id)
                .await?
                .ok_or_else(|| RepositoryError::NotFound(job_id.to_string())),
        }
    }

    #[instrument(skip(self, transcript, interpretation), fields(job_id = %job_id))]
    async fn mark_done(
        &self,
        job_id: &JobId,
        transcript: &str,
        interpretation: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE audio_jobs
            SET status = $1, transcript = $2, interpretation = $3, updated_at = $4
            WHERE job_id = $5
            "#,
        )
        .bind(JobStatus::Done.as_str())
        .bind(transcript)
        .bind(interpretation)
        .bind(Utc::now())
        .bind(job_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(job_id.to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn mark_failed(&self, job_id: &JobId) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE audio_jobs
            SET status = $1, transcript = NULL, interpretation = NULL, updated_at = $2
            WHERE job_id = $3 AND status <> $4
            "#,
        )
        .bind(JobStatus::Failed.as_str())
        .bind(Utc::now())
        .bind(job_id.as_str())
        .bind(JobStatus::Done.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM audio_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn get_by_job_id(&self, job_id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM audio_jobs WHERE job_id = $1"
        ))
        .bind(job_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM audio_jobs WHERE status = $1 ORDER BY updated_at ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter().map(Job::try_from).collect()
    }
}
