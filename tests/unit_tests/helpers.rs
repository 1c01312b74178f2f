use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use audioscribe::application::ports::{
    AudioTranscoder, JobStore, OperationHandle, OperationStatus, RepositoryError,
    SpeechRecognizer, SummarizationError, SummarizationService, TranscoderError,
    TranscriptionError, TranscriptionOperation,
};
use audioscribe::application::services::{JobProcessor, JobProcessorConfig};
use audioscribe::domain::{Job, JobId, JobStatus, RecognitionResult};
use tokio::sync::Barrier;

/// Long-running operation that completes after a fixed number of polls.
pub struct ScriptedTranscription {
    submit_error: Option<String>,
    poll_error: Option<String>,
    completes_after: Option<u32>,
    result: RecognitionResult,
    submit_barrier: Option<Arc<Barrier>>,
    submits: AtomicU32,
    polls: AtomicU32,
    cancels: AtomicU32,
}

impl ScriptedTranscription {
    fn base(completes_after: Option<u32>, result: RecognitionResult) -> Self {
        Self {
            submit_error: None,
            poll_error: None,
            completes_after,
            result,
            submit_barrier: None,
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            cancels: AtomicU32::new(0),
        }
    }

    pub fn completing_with(segments: &[&str]) -> Self {
        Self::base(Some(1), RecognitionResult::from_texts(segments.iter().copied()))
    }

    pub fn completing_after(polls: u32, segments: &[&str]) -> Self {
        Self::base(
            Some(polls),
            RecognitionResult::from_texts(segments.iter().copied()),
        )
    }

    pub fn never_completing() -> Self {
        Self::base(None, RecognitionResult::default())
    }

    pub fn failing_submission(message: &str) -> Self {
        Self {
            submit_error: Some(message.to_string()),
            ..Self::base(None, RecognitionResult::default())
        }
    }

    pub fn failing_poll(message: &str) -> Self {
        Self {
            poll_error: Some(message.to_string()),
            ..Self::base(None, RecognitionResult::default())
        }
    }

    /// Every submit waits until `parties` submits are in flight together.
    pub fn with_submit_barrier(mut self, parties: usize) -> Self {
        self.submit_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub fn submit_count(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TranscriptionOperation for ScriptedTranscription {
    async fn submit(
        &self,
        audio_uri: &str,
        _language_code: &str,
    ) -> Result<OperationHandle, TranscriptionError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.submit_barrier {
            barrier.wait().await;
        }
        match &self.submit_error {
            Some(message) => Err(TranscriptionError::SubmissionFailed(message.clone())),
            None => Ok(OperationHandle::new(format!("operations/{}", audio_uri))),
        }
    }

    async fn poll(&self, _handle: &OperationHandle) -> Result<OperationStatus, TranscriptionError> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(message) = &self.poll_error {
            return Err(TranscriptionError::PollFailed(message.clone()));
        }
        match self.completes_after {
            Some(n) if polls >= n => Ok(OperationStatus::Completed(self.result.clone())),
            _ => Ok(OperationStatus::Pending),
        }
    }

    async fn cancel(&self, _handle: &OperationHandle) -> Result<(), TranscriptionError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct StubSummarizer {
    response: Result<String, String>,
    calls: AtomicU32,
}

impl StubSummarizer {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SummarizationService for StubSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<String, SummarizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(SummarizationError::ApiRequestFailed)
    }
}

/// Store whose backend is down.
pub struct UnavailableJobStore;

fn unavailable() -> RepositoryError {
    RepositoryError::ConnectionFailed("database unavailable".to_string())
}

#[async_trait::async_trait]
impl JobStore for UnavailableJobStore {
    async fn upsert_processing(&self, _: &JobId, _: &str) -> Result<Job, RepositoryError> {
        Err(unavailable())
    }

    async fn mark_done(&self, _: &JobId, _: &str, _: &str) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn mark_failed(&self, _: &JobId) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn get_by_id(&self, _: i64) -> Result<Option<Job>, RepositoryError> {
        Err(unavailable())
    }

    async fn get_by_job_id(&self, _: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(unavailable())
    }

    async fn list_by_status(&self, _: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        Err(unavailable())
    }
}

/// Transcoder that prefixes the input so tests can see it ran.
pub struct StubTranscoder {
    fail: bool,
}

impl StubTranscoder {
    pub fn working() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait::async_trait]
impl AudioTranscoder for StubTranscoder {
    async fn to_wav(&self, input: &[u8], _sample_rate_hz: u32) -> Result<Vec<u8>, TranscoderError> {
        if self.fail {
            return Err(TranscoderError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(input);
        Ok(wav)
    }
}

pub struct StubRecognizer {
    response: Result<RecognitionResult, String>,
    calls: AtomicU32,
}

impl StubRecognizer {
    pub fn returning(segments: &[&str]) -> Self {
        Self {
            response: Ok(RecognitionResult::from_texts(segments.iter().copied())),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for StubRecognizer {
    async fn recognize(
        &self,
        wav_data: &[u8],
        sample_rate_hz: u32,
        _language_code: &str,
    ) -> Result<RecognitionResult, TranscriptionError> {
        assert!(wav_data.starts_with(b"RIFF"));
        assert_eq!(sample_rate_hz, 16_000);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(TranscriptionError::ApiRequestFailed)
    }
}

pub fn test_config(poll_interval: Duration, max_wait: Duration) -> JobProcessorConfig {
    JobProcessorConfig {
        poll_interval,
        max_wait,
        language_code: "pt-BR".to_string(),
    }
}

pub fn processor(
    store: Arc<dyn JobStore>,
    transcription: Arc<ScriptedTranscription>,
    summarizer: Arc<StubSummarizer>,
    config: JobProcessorConfig,
) -> JobProcessor {
    JobProcessor::new(store, transcription, summarizer, config)
}

/// Polls `condition` every 10ms until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
