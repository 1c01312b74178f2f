use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::{JobId, JobStatus, Notification, StoragePath};
use crate::presentation::state::AppState;

use super::error_response::error_response;
use super::multipart_file::read_uploaded_file;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,
    pub status: String,
}

/// Stages the audio and publishes one job notification for it.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let file = match read_uploaded_file(&mut multipart).await {
        Ok(file) => file,
        Err(response) => return response,
    };

    let storage_path = StoragePath::for_upload(&file.filename);

    let file_path = match state.staging_store.store(&storage_path, file.data).await {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, path = %storage_path, "Failed to stage upload");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store file: {}", e),
            );
        }
    };

    let job_id = JobId::generate();
    let notification = Notification::new(&job_id, file_path.clone());

    if let Err(e) = state.publisher.publish(&notification).await {
        tracing::error!(error = %e, job_id = %job_id, "Failed to publish job notification");
        if let Err(del_err) = state.staging_store.delete(&storage_path).await {
            tracing::warn!(error = %del_err, path = %storage_path, "Failed to delete unpublished upload");
        }
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Job queue unavailable",
        );
    }

    tracing::info!(
        job_id = %job_id,
        file_path = %file_path,
        filename = %file.filename,
        "Audio job published"
    );

    (
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            job_id: job_id.to_string(),
            status: JobStatus::Processing.as_str().to_string(),
        }),
    )
        .into_response()
}
