use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    OperationHandle, OperationStatus, SpeechRecognizer, TranscriptionError,
    TranscriptionOperation,
};
use crate::domain::{RecognitionResult, TranscriptSegment};

/// Google Cloud Speech-to-Text v1 over REST.
pub struct GoogleSpeechClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl GoogleSpeechClient {
    pub fn new(endpoint: &str, api_key: Option<String>, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            access_token,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_key {
            Some(key) => request.header("x-goog-api-key", key),
            None => request,
        };
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, String> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| format!("request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(format!("status {}: {}", status, body));
        }

        Ok(response)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    language_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionAudio<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio<'a>,
}

#[derive(Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<RecognizeResponse>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}

impl From<RecognizeResponse> for RecognitionResult {
    fn from(response: RecognizeResponse) -> Self {
        RecognitionResult::new(
            response
                .results
                .into_iter()
                .map(|r| {
                    TranscriptSegment::new(r.alternatives.into_iter().map(|a| a.transcript).collect())
                })
                .collect(),
        )
    }
}

#[async_trait]
impl TranscriptionOperation for GoogleSpeechClient {
    async fn submit(
        &self,
        audio_uri: &str,
        language_code: &str,
    ) -> Result<OperationHandle, TranscriptionError> {
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: None,
                language_code,
            },
            audio: RecognitionAudio {
                uri: Some(audio_uri),
                content: None,
            },
        };

        tracing::debug!(audio_uri, "Submitting long-running recognition");

        let response = self
            .send(
                self.client
                    .post(format!("{}/v1/speech:longrunningrecognize", self.endpoint))
                    .json(&body),
            )
            .await
            .map_err(TranscriptionError::SubmissionFailed)?;

        let operation: Operation = response.json().await.map_err(|e| {
            TranscriptionError::SubmissionFailed(format!("parse response: {}", e))
        })?;

        Ok(OperationHandle::new(operation.name))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, TranscriptionError> {
        let response = self
            .send(
                self.client
                    .get(format!("{}/v1/operations/{}", self.endpoint, handle.name())),
            )
            .await
            .map_err(TranscriptionError::PollFailed)?;

        let operation: Operation = response
            .json()
            .await
            .map_err(|e| TranscriptionError::PollFailed(format!("parse response: {}", e)))?;

        if !operation.done {
            return Ok(OperationStatus::Pending);
        }

        if let Some(error) = operation.error {
            return Err(TranscriptionError::OperationFailed(format!(
                "code {}: {}",
                error.code, error.message
            )));
        }

        Ok(OperationStatus::Completed(
            operation.response.unwrap_or_default().into(),
        ))
    }

    async fn cancel(&self, handle: &OperationHandle) -> Result<(), TranscriptionError> {
        self.send(self.client.post(format!(
            "{}/v1/operations/{}:cancel",
            self.endpoint,
            handle.name()
        )))
        .await
        .map(|_| ())
        .map_err(TranscriptionError::CancelFailed)
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(
        &self,
        wav_data: &[u8],
        sample_rate_hz: u32,
        language_code: &str,
    ) -> Result<RecognitionResult, TranscriptionError> {
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: Some(sample_rate_hz),
                language_code,
            },
            audio: RecognitionAudio {
                uri: None,
                content: Some(BASE64.encode(wav_data)),
            },
        };

        let response = self
            .send(
                self.client
                    .post(format!("{}/v1/speech:recognize", self.endpoint))
                    .json(&body),
            )
            .await
            .map_err(TranscriptionError::ApiRequestFailed)?;

        let recognized: RecognizeResponse = response.json().await.map_err(|e| {
            TranscriptionError::ApiRequestFailed(format!("parse response: {}", e))
        })?;

        Ok(recognized.into())
    }
}
