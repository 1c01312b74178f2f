use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::application::ports::RepositoryError;
use crate::domain::{Job, JobId, JobStatus};
use crate::presentation::state::AppState;

use super::error_response::error_response;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub id: i64,
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            job_id: job.job_id.to_string(),
            status: job.status.as_str().to_string(),
            transcript: job.transcript,
            interpretation: job.interpretation,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatusResponse>,
}

#[derive(Deserialize, Debug)]
pub struct ListJobsQuery {
    pub status: String,
}

/// Looks a job up by surrogate id when `id` is numeric, otherwise (or when
/// the numeric lookup misses) by producer job id.
async fn find_job(state: &AppState, id: &str) -> Result<Option<Job>, RepositoryError> {
    if let Ok(surrogate) = id.parse::<i64>() {
        if let Some(job) = state.job_store.get_by_id(surrogate).await? {
            return Ok(Some(job));
        }
    }
    state.job_store.get_by_job_id(&JobId::new(id)).await
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match find_job(&state, &id).await {
        Ok(Some(job)) => (StatusCode::OK, Json(JobStatusResponse::from(job))).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", id)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch job: {}", e),
            )
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> impl IntoResponse {
    let status = match query.status.parse::<JobStatus>() {
        Ok(s) => s,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.job_store.list_by_status(status).await {
        Ok(jobs) => (
            StatusCode::OK,
            Json(JobListResponse {
                jobs: jobs.into_iter().map(JobStatusResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list jobs");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list jobs: {}", e),
            )
        }
    }
}
