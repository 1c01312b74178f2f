mod job_processor;
mod notification_consumer;
mod processing_error;
mod transcription_service;

pub use job_processor::{JobProcessor, JobProcessorConfig};
pub use notification_consumer::NotificationConsumer;
pub use processing_error::{AckDecision, ProcessingError};
pub use transcription_service::{
    DirectTranscription, TranscriptionService, TranscriptionServiceError,
    UNTRANSCRIBABLE_MESSAGE, WAV_SAMPLE_RATE_HZ,
};
