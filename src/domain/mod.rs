mod job;
mod job_id;
mod job_status;
mod notification;
mod recognition;
mod storage_path;

pub use job::Job;
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use notification::{Notification, NotificationError};
pub use recognition::{RecognitionResult, TranscriptSegment};
pub use storage_path::StoragePath;
