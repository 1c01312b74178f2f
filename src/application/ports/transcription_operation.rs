use async_trait::async_trait;

use crate::domain::RecognitionResult;

/// Name of a long-running recognition on the speech service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Pending,
    Completed(RecognitionResult),
}

/// External long-running speech-to-text operation. The wait policy
/// belongs to the caller; `poll` never blocks on completion.
#[async_trait]
pub trait TranscriptionOperation: Send + Sync {
    async fn submit(
        &self,
        audio_uri: &str,
        language_code: &str,
    ) -> Result<OperationHandle, TranscriptionError>;

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, TranscriptionError>;

    async fn cancel(&self, handle: &OperationHandle) -> Result<(), TranscriptionError>;
}

/// Inline recognition of short audio, used by the synchronous endpoint.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(
        &self,
        wav_data: &[u8],
        sample_rate_hz: u32,
        language_code: &str,
    ) -> Result<RecognitionResult, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("poll failed: {0}")]
    PollFailed(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("cancel failed: {0}")]
    CancelFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
