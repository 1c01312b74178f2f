use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::presentation::config::{StorageProviderSetting, StorageSettings};

use super::gcs_store::GcsStagingStore;
use super::local_store::LocalStagingStore;

pub struct StagingStoreFactory;

impl StagingStoreFactory {
    pub fn create(settings: &StorageSettings) -> Result<Arc<dyn StagingStore>, StagingStoreError> {
        match settings.provider {
            StorageProviderSetting::Local => {
                let path = PathBuf::from(&settings.local_path);
                let store = LocalStagingStore::new(path)?;
                Ok(Arc::new(store))
            }
            StorageProviderSetting::Gcs => {
                let bucket = settings.bucket.as_deref().ok_or_else(|| {
                    StagingStoreError::Configuration("storage.bucket required for gcs".into())
                })?;
                let store =
                    GcsStagingStore::new(bucket, settings.service_account_path.as_deref())?;
                Ok(Arc::new(store))
            }
        }
    }
}
