use std::sync::Arc;

use bytes::Bytes;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

/// Staging in a Google Cloud Storage bucket; URIs are `gs://bucket/object`.
pub struct GcsStagingStore {
    inner: Arc<dyn ObjectStore>,
    bucket: String,
}

impl GcsStagingStore {
    pub fn new(bucket: &str, service_account_path: Option<&str>) -> Result<Self, StagingStoreError> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
        if let Some(path) = service_account_path {
            builder = builder.with_service_account_path(path);
        }
        let store = builder
            .build()
            .map_err(|e| StagingStoreError::Configuration(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl StagingStore for GcsStagingStore {
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<String, StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;

        Ok(format!("gs://{}/{}", self.bucket, path))
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .delete(&store_path)
            .await
            .map_err(|e| StagingStoreError::DeleteFailed(e.to_string()))
    }
}
