use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;

use super::error_response::error_response;

pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// Reads the first multipart field as the uploaded file. Missing or empty
/// files are a 400.
pub async fn read_uploaded_file(multipart: &mut Multipart) -> Result<UploadedFile, Response> {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => {
            tracing::warn!("Request with no file");
            return Err(error_response(StatusCode::BAD_REQUEST, "No file uploaded"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read multipart");
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart: {}", e),
            ));
        }
    };

    let filename = field.file_name().unwrap_or("upload").to_string();

    let data = match field.bytes().await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read file bytes");
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read file: {}", e),
            ));
        }
    };

    if data.is_empty() {
        tracing::warn!(filename = %filename, "Empty file uploaded");
        return Err(error_response(StatusCode::BAD_REQUEST, "No file uploaded"));
    }

    tracing::debug!(filename = %filename, bytes = data.len(), "File data received");

    Ok(UploadedFile { filename, data })
}
