use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;

use audioscribe::application::ports::{SummarizationError, SummarizationService};
use audioscribe::infrastructure::llm::GeminiSummarizer;

use super::mock_server::{Recorder, record, recorder, serve};

fn mock_gemini_api(recorder: Recorder, status: u16, response_body: &'static str) -> Router {
    Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let recorder = recorder.clone();
            async move {
                record(&recorder, &method, &uri, &headers, &body);
                (StatusCode::from_u16(status).unwrap(), response_body).into_response()
            }
        },
    )
}

fn summarizer(base_url: &str, template: &str) -> GeminiSummarizer {
    GeminiSummarizer::new(
        base_url,
        "gemini-key".to_string(),
        "gemini-2.5-pro".to_string(),
        template.to_string(),
    )
}

#[tokio::test]
async fn given_transcript_when_summarizing_then_sends_rendered_prompt_and_returns_candidate_text() {
    let requests = recorder();
    let (base_url, shutdown_tx) = serve(mock_gemini_api(
        requests.clone(),
        200,
        r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Summary "}, {"text": "X"}]}}]}"#,
    ))
    .await;

    let result = summarizer(&base_url, "Text: {transcript}. Summarize.")
        .summarize("hello world")
        .await
        .unwrap();

    assert_eq!(result, "Summary X");
    let recorded = requests.lock().unwrap()[0].clone();
    assert_eq!(
        recorded.path,
        "/v1beta/models/gemini-2.5-pro:generateContent"
    );
    assert_eq!(recorded.api_key.as_deref(), Some("gemini-key"));
    assert_eq!(
        recorded.body["contents"][0]["parts"][0]["text"],
        "Text: hello world. Summarize."
    );
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_rate_limited_api_when_summarizing_then_returns_rate_limited() {
    let (base_url, shutdown_tx) = serve(mock_gemini_api(
        recorder(),
        429,
        r#"{"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}"#,
    ))
    .await;

    let result = summarizer(&base_url, "{transcript}").summarize("hi").await;

    assert!(matches!(result, Err(SummarizationError::RateLimited)));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_server_error_when_summarizing_then_returns_api_error() {
    let (base_url, shutdown_tx) = serve(mock_gemini_api(recorder(), 500, "internal")).await;

    let result = summarizer(&base_url, "{transcript}").summarize("hi").await;

    assert!(matches!(result, Err(SummarizationError::ApiRequestFailed(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_no_candidates_when_summarizing_then_returns_invalid_response() {
    let (base_url, shutdown_tx) = serve(mock_gemini_api(
        recorder(),
        200,
        r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#,
    ))
    .await;

    let result = summarizer(&base_url, "{transcript}").summarize("hi").await;

    assert!(matches!(result, Err(SummarizationError::InvalidResponse(_))));
    shutdown_tx.send(()).ok();
}

#[test]
fn given_template_without_placeholder_when_rendering_then_appends_transcript() {
    let summarizer = summarizer("http://unused", "Summarize the following:");

    assert_eq!(
        summarizer.render_prompt("bom dia"),
        "Summarize the following:\nbom dia"
    );
}
