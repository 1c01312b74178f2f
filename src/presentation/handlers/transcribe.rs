use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::TranscriptionServiceError;
use crate::presentation::state::AppState;

use super::error_response::error_response;
use super::multipart_file::read_uploaded_file;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
    pub interpretation: String,
}

/// Transcribes and summarizes a short recording within the request.
#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let file = match read_uploaded_file(&mut multipart).await {
        Ok(file) => file,
        Err(response) => return response,
    };

    match state.transcription_service.transcribe(&file.data).await {
        Ok(result) => (
            StatusCode::OK,
            Json(TranscribeResponse {
                transcript: result.transcript,
                interpretation: result.interpretation,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, filename = %file.filename, "Direct transcription failed");
            let status = match e {
                TranscriptionServiceError::Transcoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
                TranscriptionServiceError::Recognition(_)
                | TranscriptionServiceError::Summarization(_) => StatusCode::BAD_GATEWAY,
            };
            error_response(status, format!("Transcription failed: {}", e))
        }
    }
}
