use std::sync::Arc;

use crate::application::ports::{
    AudioTranscoder, SpeechRecognizer, SummarizationError, SummarizationService, TranscoderError,
    TranscriptionError,
};
use crate::infrastructure::observability::sanitize_for_log;

pub const UNTRANSCRIBABLE_MESSAGE: &str = "Could not transcribe the audio.";

pub const WAV_SAMPLE_RATE_HZ: u32 = 16_000;

#[derive(Debug, Clone, PartialEq)]
pub struct DirectTranscription {
    pub transcript: String,
    pub interpretation: String,
}

/// Synchronous path: transcode, recognize inline, summarize. Meant for
/// short recordings; long audio goes through the job pipeline.
pub struct TranscriptionService {
    transcoder: Arc<dyn AudioTranscoder>,
    recognizer: Arc<dyn SpeechRecognizer>,
    summarizer: Arc<dyn SummarizationService>,
    language_code: String,
}

impl TranscriptionService {
    pub fn new(
        transcoder: Arc<dyn AudioTranscoder>,
        recognizer: Arc<dyn SpeechRecognizer>,
        summarizer: Arc<dyn SummarizationService>,
        language_code: String,
    ) -> Self {
        Self {
            transcoder,
            recognizer,
            summarizer,
            language_code,
        }
    }

    pub async fn transcribe(&self, audio: &[u8]) -> Result<DirectTranscription, TranscriptionServiceError> {
        let wav = self.transcoder.to_wav(audio, WAV_SAMPLE_RATE_HZ).await?;
        tracing::debug!(input_bytes = audio.len(), wav_bytes = wav.len(), "Audio transcoded");

        let recognition = self
            .recognizer
            .recognize(&wav, WAV_SAMPLE_RATE_HZ, &self.language_code)
            .await?;

        let Some(transcript) = recognition.transcript() else {
            return Ok(DirectTranscription {
                transcript: String::new(),
                interpretation: UNTRANSCRIBABLE_MESSAGE.to_string(),
            });
        };

        tracing::debug!(transcript = %sanitize_for_log(&transcript), "Inline recognition completed");

        let interpretation = self.summarizer.summarize(&transcript).await?;

        Ok(DirectTranscription {
            transcript,
            interpretation,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionServiceError {
    #[error("transcoding: {0}")]
    Transcoding(#[from] TranscoderError),
    #[error("recognition: {0}")]
    Recognition(#[from] TranscriptionError),
    #[error("summarization: {0}")]
    Summarization(#[from] SummarizationError),
}
