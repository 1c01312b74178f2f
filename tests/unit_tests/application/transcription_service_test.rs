use std::sync::Arc;

use audioscribe::application::services::{
    TranscriptionService, TranscriptionServiceError, UNTRANSCRIBABLE_MESSAGE,
};

use crate::helpers::{StubRecognizer, StubSummarizer, StubTranscoder};

fn service(
    transcoder: StubTranscoder,
    recognizer: Arc<StubRecognizer>,
    summarizer: Arc<StubSummarizer>,
) -> TranscriptionService {
    TranscriptionService::new(
        Arc::new(transcoder),
        recognizer,
        summarizer,
        "pt-BR".to_string(),
    )
}

#[tokio::test]
async fn given_recognized_speech_when_transcribing_then_returns_transcript_and_summary() {
    let recognizer = Arc::new(StubRecognizer::returning(&["bom dia", "", "a todos"]));
    let summarizer = Arc::new(StubSummarizer::returning("A greeting."));
    let service = service(StubTranscoder::working(), recognizer.clone(), summarizer.clone());

    let result = service.transcribe(b"mp3-bytes").await.unwrap();

    assert_eq!(result.transcript, "bom dia a todos");
    assert_eq!(result.interpretation, "A greeting.");
    assert_eq!(recognizer.call_count(), 1);
    assert_eq!(summarizer.call_count(), 1);
}

#[tokio::test]
async fn given_silent_audio_when_transcribing_then_returns_untranscribable_message_without_summarizing()
 {
    let recognizer = Arc::new(StubRecognizer::returning(&[]));
    let summarizer = Arc::new(StubSummarizer::returning("unused"));
    let service = service(StubTranscoder::working(), recognizer, summarizer.clone());

    let result = service.transcribe(b"silence").await.unwrap();

    assert_eq!(result.transcript, "");
    assert_eq!(result.interpretation, UNTRANSCRIBABLE_MESSAGE);
    assert_eq!(summarizer.call_count(), 0);
}

#[tokio::test]
async fn given_undecodable_audio_when_transcribing_then_returns_transcoding_error() {
    let recognizer = Arc::new(StubRecognizer::returning(&["unused"]));
    let summarizer = Arc::new(StubSummarizer::returning("unused"));
    let service = service(StubTranscoder::failing(), recognizer.clone(), summarizer);

    let result = service.transcribe(b"garbage").await;

    assert!(matches!(result, Err(TranscriptionServiceError::Transcoding(_))));
    assert_eq!(recognizer.call_count(), 0);
}

#[tokio::test]
async fn given_recognizer_failure_when_transcribing_then_returns_recognition_error() {
    let recognizer = Arc::new(StubRecognizer::failing("quota"));
    let summarizer = Arc::new(StubSummarizer::returning("unused"));
    let service = service(StubTranscoder::working(), recognizer, summarizer.clone());

    let result = service.transcribe(b"audio").await;

    assert!(matches!(result, Err(TranscriptionServiceError::Recognition(_))));
    assert_eq!(summarizer.call_count(), 0);
}

#[tokio::test]
async fn given_summarizer_failure_when_transcribing_then_returns_summarization_error() {
    let recognizer = Arc::new(StubRecognizer::returning(&["hello"]));
    let summarizer = Arc::new(StubSummarizer::failing("down"));
    let service = service(StubTranscoder::working(), recognizer, summarizer);

    let result = service.transcribe(b"audio").await;

    assert!(matches!(result, Err(TranscriptionServiceError::Summarization(_))));
}
