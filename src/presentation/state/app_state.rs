use std::sync::Arc;

use crate::application::ports::{JobStore, NotificationPublisher, StagingStore};
use crate::application::services::TranscriptionService;

#[derive(Clone)]
pub struct AppState {
    pub job_store: Arc<dyn JobStore>,
    pub publisher: Arc<dyn NotificationPublisher>,
    pub staging_store: Arc<dyn StagingStore>,
    pub transcription_service: Arc<TranscriptionService>,
    pub max_upload_bytes: usize,
}
