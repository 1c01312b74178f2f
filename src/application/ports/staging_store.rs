use bytes::Bytes;

use crate::domain::StoragePath;

/// Object storage holding uploaded audio until the speech service reads it.
#[async_trait::async_trait]
pub trait StagingStore: Send + Sync {
    /// Writes the object and returns the URI the speech service can read.
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<String, StagingStoreError>;

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StagingStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
