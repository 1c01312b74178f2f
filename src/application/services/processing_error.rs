use std::time::Duration;

use crate::application::ports::{RepositoryError, SummarizationError, TranscriptionError};
use crate::domain::NotificationError;

/// What the consumer tells the channel once a delivery has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Handled; remove the message from the channel.
    Ack,
    /// Not handled; return the message for redelivery.
    Nack,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("malformed notification: {0}")]
    MalformedNotification(#[from] NotificationError),
    #[error("submission: {0}")]
    Submission(TranscriptionError),
    #[error("poll: {0}")]
    Poll(TranscriptionError),
    #[error("operation did not complete within {0:?}")]
    OperationTimeout(Duration),
    #[error("operation cancelled")]
    OperationCancelled,
    #[error("operation completed without a usable transcript")]
    EmptyResult,
    #[error("summarization: {0}")]
    Summarization(#[from] SummarizationError),
    #[error("store: {0}")]
    Store(#[from] RepositoryError),
}

impl ProcessingError {
    /// An empty transcript will not change on redelivery; every other
    /// failure may be transient and goes back to the channel.
    pub fn ack_decision(&self) -> AckDecision {
        match self {
            ProcessingError::EmptyResult => AckDecision::Ack,
            _ => AckDecision::Nack,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::MalformedNotification(_) => "malformed_notification",
            ProcessingError::Submission(_) => "submission",
            ProcessingError::Poll(_) => "poll",
            ProcessingError::OperationTimeout(_) => "operation_timeout",
            ProcessingError::OperationCancelled => "operation_cancelled",
            ProcessingError::EmptyResult => "empty_result",
            ProcessingError::Summarization(_) => "summarization",
            ProcessingError::Store(_) => "store",
        }
    }
}
