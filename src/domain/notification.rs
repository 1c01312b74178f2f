use serde::{Deserialize, Serialize};

use super::JobId;

/// Message published once per accepted upload and consumed by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "jobId", alias = "JobId")]
    pub job_id: String,
    #[serde(rename = "filePath", alias = "FilePath")]
    pub file_path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("undecodable message data: {0}")]
    UndecodableData(String),
}

impl Notification {
    pub fn new(job_id: &JobId, file_path: impl Into<String>) -> Self {
        Self {
            job_id: job_id.as_str().to_string(),
            file_path: file_path.into(),
        }
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, NotificationError> {
        let notification: Notification = serde_json::from_slice(data)?;
        if notification.job_id.trim().is_empty() {
            return Err(NotificationError::MissingField("jobId"));
        }
        if notification.file_path.trim().is_empty() {
            return Err(NotificationError::MissingField("filePath"));
        }
        Ok(notification)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, NotificationError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn job_id(&self) -> JobId {
        JobId::new(self.job_id.clone())
    }
}
