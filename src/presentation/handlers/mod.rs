mod error_response;
mod health;
mod job_status;
mod multipart_file;
mod transcribe;
mod upload;

pub use error_response::ErrorResponse;
pub use health::health_handler;
pub use job_status::{JobListResponse, JobStatusResponse, job_status_handler, list_jobs_handler};
pub use transcribe::{TranscribeResponse, transcribe_handler};
pub use upload::{UploadResponse, upload_handler};
