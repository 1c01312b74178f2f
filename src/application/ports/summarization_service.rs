use async_trait::async_trait;

#[async_trait]
pub trait SummarizationService: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
