mod audio_transcoder;
mod job_store;
mod notification_channel;
mod repository_error;
mod staging_store;
mod summarization_service;
mod transcription_operation;

pub use audio_transcoder::{AudioTranscoder, TranscoderError};
pub use job_store::JobStore;
pub use notification_channel::{
    AckHandle, ChannelError, Delivery, NotificationPublisher, NotificationSource,
};
pub use repository_error::RepositoryError;
pub use staging_store::{StagingStore, StagingStoreError};
pub use summarization_service::{SummarizationError, SummarizationService};
pub use transcription_operation::{
    OperationHandle, OperationStatus, SpeechRecognizer, TranscriptionError,
    TranscriptionOperation,
};
