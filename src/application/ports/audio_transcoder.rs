use async_trait::async_trait;

/// Converts arbitrary uploaded audio into 16-bit PCM WAV for inline
/// recognition.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn to_wav(&self, input: &[u8], sample_rate_hz: u32) -> Result<Vec<u8>, TranscoderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscoderError {
    #[error("failed to start transcoder: {0}")]
    SpawnFailed(String),
    #[error("transcoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
