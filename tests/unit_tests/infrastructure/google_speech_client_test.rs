use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use audioscribe::application::ports::{
    OperationHandle, OperationStatus, SpeechRecognizer, TranscriptionError,
    TranscriptionOperation,
};
use audioscribe::infrastructure::speech::GoogleSpeechClient;

use super::mock_server::{Recorder, record, recorder, serve};

/// Routes every request to `respond` after recording it.
fn mock_speech_api(
    recorder: Recorder,
    respond: fn(&Method, &str) -> (u16, &'static str),
) -> Router {
    Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let recorder = recorder.clone();
            async move {
                record(&recorder, &method, &uri, &headers, &body);
                let (status, body) = respond(&method, uri.path());
                (StatusCode::from_u16(status).unwrap(), body).into_response()
            }
        },
    )
}

#[tokio::test]
async fn given_audio_uri_when_submitting_then_posts_long_running_request_and_returns_operation_name()
 {
    let requests = recorder();
    let (base_url, shutdown_tx) = serve(mock_speech_api(requests.clone(), |_, _| {
        (200, r#"{"name": "4242"}"#)
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, Some("test-key".to_string()), None);
    let handle = client.submit("gs://bucket/a.wav", "pt-BR").await.unwrap();

    assert_eq!(handle.name(), "4242");
    let recorded = requests.lock().unwrap()[0].clone();
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.path, "/v1/speech:longrunningrecognize");
    assert_eq!(recorded.api_key.as_deref(), Some("test-key"));
    assert_eq!(recorded.body["audio"]["uri"], "gs://bucket/a.wav");
    assert_eq!(recorded.body["config"]["languageCode"], "pt-BR");
    assert_eq!(recorded.body["config"]["encoding"], "LINEAR16");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_rejected_submission_when_submitting_then_returns_submission_error() {
    let (base_url, shutdown_tx) = serve(mock_speech_api(recorder(), |_, _| {
        (400, r#"{"error": {"code": 400, "message": "Invalid recognition 'audio'"}}"#)
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, None, Some("token".to_string()));
    let result = client.submit("not-a-uri", "pt-BR").await;

    assert!(matches!(result, Err(TranscriptionError::SubmissionFailed(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_running_operation_when_polling_then_returns_pending() {
    let requests = recorder();
    let (base_url, shutdown_tx) = serve(mock_speech_api(requests.clone(), |_, _| {
        (200, r#"{"name": "4242", "metadata": {"progressPercent": 40}}"#)
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, None, Some("token".to_string()));
    let status = client.poll(&OperationHandle::new("4242")).await.unwrap();

    assert_eq!(status, OperationStatus::Pending);
    let recorded = requests.lock().unwrap()[0].clone();
    assert_eq!(recorded.method, "GET");
    assert_eq!(recorded.path, "/v1/operations/4242");
    assert_eq!(recorded.authorization.as_deref(), Some("Bearer token"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_finished_operation_when_polling_then_returns_first_alternative_per_segment() {
    let (base_url, shutdown_tx) = serve(mock_speech_api(recorder(), |_, _| {
        (
            200,
            r#"{
                "name": "4242",
                "done": true,
                "response": {
                    "results": [
                        {"alternatives": [{"transcript": "hello", "confidence": 0.9}, {"transcript": "hallo"}]},
                        {"alternatives": []},
                        {"alternatives": [{"transcript": "world"}]}
                    ]
                }
            }"#,
        )
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, None, None);
    let status = client.poll(&OperationHandle::new("4242")).await.unwrap();

    let OperationStatus::Completed(result) = status else {
        panic!("expected completed operation, got {:?}", status);
    };
    assert_eq!(result.segments.len(), 3);
    assert_eq!(result.transcript().as_deref(), Some("hello world"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_finished_operation_without_results_when_polling_then_completes_with_no_transcript() {
    let (base_url, shutdown_tx) = serve(mock_speech_api(recorder(), |_, _| {
        (200, r#"{"name": "4242", "done": true, "response": {}}"#)
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, None, None);
    let status = client.poll(&OperationHandle::new("4242")).await.unwrap();

    let OperationStatus::Completed(result) = status else {
        panic!("expected completed operation, got {:?}", status);
    };
    assert!(result.transcript().is_none());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_failed_operation_when_polling_then_returns_operation_error() {
    let (base_url, shutdown_tx) = serve(mock_speech_api(recorder(), |_, _| {
        (
            200,
            r#"{"name": "4242", "done": true, "error": {"code": 3, "message": "bad encoding"}}"#,
        )
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, None, None);
    let result = client.poll(&OperationHandle::new("4242")).await;

    match result {
        Err(TranscriptionError::OperationFailed(message)) => {
            assert!(message.contains("bad encoding"));
        }
        other => panic!("expected operation failure, got {:?}", other),
    }
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_operation_when_cancelling_then_posts_cancel() {
    let requests = recorder();
    let (base_url, shutdown_tx) = serve(mock_speech_api(requests.clone(), |_, _| (200, "{}"))).await;

    let client = GoogleSpeechClient::new(&base_url, None, None);
    client.cancel(&OperationHandle::new("4242")).await.unwrap();

    let recorded = requests.lock().unwrap()[0].clone();
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.path, "/v1/operations/4242:cancel");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_wav_bytes_when_recognizing_inline_then_sends_base64_content_with_sample_rate() {
    let requests = recorder();
    let (base_url, shutdown_tx) = serve(mock_speech_api(requests.clone(), |_, _| {
        (200, r#"{"results": [{"alternatives": [{"transcript": "oi"}]}]}"#)
    }))
    .await;

    let client = GoogleSpeechClient::new(&base_url, Some("k".to_string()), None);
    let result = client.recognize(b"RIFFdata", 16_000, "pt-BR").await.unwrap();

    assert_eq!(result.transcript().as_deref(), Some("oi"));
    let recorded = requests.lock().unwrap()[0].clone();
    assert_eq!(recorded.path, "/v1/speech:recognize");
    assert_eq!(recorded.body["config"]["sampleRateHertz"], 16_000);
    assert_eq!(
        recorded.body["audio"]["content"],
        BASE64.encode(b"RIFFdata")
    );
    shutdown_tx.send(()).ok();
}
