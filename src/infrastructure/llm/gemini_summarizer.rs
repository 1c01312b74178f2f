use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{SummarizationError, SummarizationService};
use crate::infrastructure::observability::sanitize_for_log;

pub const TRANSCRIPT_PLACEHOLDER: &str = "{transcript}";

/// Summarizes transcripts with the Gemini `generateContent` API.
pub struct GeminiSummarizer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    prompt_template: String,
}

impl GeminiSummarizer {
    pub fn new(endpoint: &str, api_key: String, model: String, prompt_template: String) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
            prompt_template,
        }
    }

    pub fn render_prompt(&self, transcript: &str) -> String {
        if self.prompt_template.contains(TRANSCRIPT_PLACEHOLDER) {
            self.prompt_template
                .replace(TRANSCRIPT_PLACEHOLDER, transcript)
        } else {
            format!("{}\n{}", self.prompt_template, transcript)
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[async_trait]
impl SummarizationService for GeminiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizationError> {
        let prompt = self.render_prompt(transcript);
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );

        tracing::debug!(model = %self.model, "Requesting summary");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SummarizationError::ApiRequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizationError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::InvalidResponse(e.to_string()))?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SummarizationError::InvalidResponse(
                "no candidate text".to_string(),
            ));
        }

        tracing::info!(summary = %sanitize_for_log(&text), "Summary generated");

        Ok(text)
    }
}
