use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    JobStore, OperationHandle, OperationStatus, SummarizationService, TranscriptionOperation,
};
use crate::domain::{JobId, Notification, RecognitionResult};
use crate::infrastructure::observability::sanitize_for_log;

use super::{AckDecision, ProcessingError};

#[derive(Debug, Clone)]
pub struct JobProcessorConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub language_code: String,
}

impl Default for JobProcessorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_wait: Duration::from_secs(30 * 60),
            language_code: "pt-BR".to_string(),
        }
    }
}

struct JobOutput {
    transcript: String,
    interpretation: String,
}

/// Drives one notification through transcription and summarization and
/// decides whether the delivery is acknowledged or rejected.
pub struct JobProcessor {
    job_store: Arc<dyn JobStore>,
    transcription: Arc<dyn TranscriptionOperation>,
    summarizer: Arc<dyn SummarizationService>,
    config: JobProcessorConfig,
}

impl JobProcessor {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        transcription: Arc<dyn TranscriptionOperation>,
        summarizer: Arc<dyn SummarizationService>,
        config: JobProcessorConfig,
    ) -> Self {
        Self {
            job_store,
            transcription,
            summarizer,
            config,
        }
    }

    pub fn config(&self) -> &JobProcessorConfig {
        &self.config
    }

    /// Runs the full job lifecycle. Never fails: every error ends in a
    /// terminal store write and an ack decision.
    pub async fn process(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> AckDecision {
        let job_id = notification.job_id();

        let job = match self
            .job_store
            .upsert_processing(&job_id, &notification.file_path)
            .await
        {
            Ok(job) => job,
            Err(e) => {
                let error = ProcessingError::Store(e);
                tracing::error!(error = %error, kind = error.kind(), "Failed to mark job as processing");
                return AckDecision::Nack;
            }
        };

        if job.is_done() {
            tracing::info!(id = job.id, "Job already done, acknowledging duplicate delivery");
            return AckDecision::Ack;
        }

        tracing::debug!(id = job.id, file_path = %notification.file_path, "Job status transition: processing");

        let result = self
            .run_pipeline(&notification.file_path, cancel)
            .await;

        self.finalize(&job_id, result).await
    }

    async fn run_pipeline(
        &self,
        file_path: &str,
        cancel: &CancellationToken,
    ) -> Result<JobOutput, ProcessingError> {
        if cancel.is_cancelled() {
            return Err(ProcessingError::OperationCancelled);
        }

        let handle = self
            .transcription
            .submit(file_path, &self.config.language_code)
            .await
            .map_err(ProcessingError::Submission)?;

        tracing::debug!(operation = handle.name(), "Transcription operation submitted");

        let recognition = self.await_operation(&handle, cancel).await?;

        let transcript = recognition
            .transcript()
            .ok_or(ProcessingError::EmptyResult)?;

        tracing::debug!(
            segments = recognition.segments.len(),
            transcript = %sanitize_for_log(&transcript),
            "Transcription completed"
        );

        let interpretation = self.summarizer.summarize(&transcript).await?;

        Ok(JobOutput {
            transcript,
            interpretation,
        })
    }

    /// Waits for the operation under `max_wait`, racing the cancellation
    /// token so a cancel interrupts the sleep between polls.
    async fn await_operation(
        &self,
        handle: &OperationHandle,
        cancel: &CancellationToken,
    ) -> Result<RecognitionResult, ProcessingError> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProcessingError::OperationCancelled),
            polled = tokio::time::timeout(self.config.max_wait, self.poll_until_complete(handle)) => {
                match polled {
                    Ok(result) => result,
                    Err(_) => Err(ProcessingError::OperationTimeout(self.config.max_wait)),
                }
            }
        };

        if matches!(
            outcome,
            Err(ProcessingError::OperationCancelled
                | ProcessingError::OperationTimeout(_)
                | ProcessingError::Poll(_))
        ) {
            if let Err(e) = self.transcription.cancel(handle).await {
                tracing::warn!(
                    error = %e,
                    operation = handle.name(),
                    "Failed to cancel abandoned transcription operation"
                );
            }
        }

        outcome
    }

    async fn poll_until_complete(
        &self,
        handle: &OperationHandle,
    ) -> Result<RecognitionResult, ProcessingError> {
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            match self
                .transcription
                .poll(handle)
                .await
                .map_err(ProcessingError::Poll)?
            {
                OperationStatus::Completed(result) => {
                    tracing::debug!(polls, "Transcription operation complete");
                    return Ok(result);
                }
                OperationStatus::Pending => {
                    tracing::trace!(polls, "Transcription operation still running");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Single place that turns a pipeline result into the terminal store
    /// write and the channel decision.
    async fn finalize(
        &self,
        job_id: &JobId,
        result: Result<JobOutput, ProcessingError>,
    ) -> AckDecision {
        let error = match result {
            Ok(output) => {
                match self
                    .job_store
                    .mark_done(job_id, &output.transcript, &output.interpretation)
                    .await
                {
                    Ok(()) => {
                        tracing::info!("Job completed");
                        return AckDecision::Ack;
                    }
                    Err(e) => ProcessingError::Store(e),
                }
            }
            Err(e) => e,
        };

        let decision = error.ack_decision();
        match decision {
            AckDecision::Ack => {
                tracing::warn!(error = %error, kind = error.kind(), "Job failed permanently")
            }
            AckDecision::Nack => {
                tracing::error!(error = %error, kind = error.kind(), "Job failed, message will be redelivered")
            }
        }

        if let Err(e) = self.job_store.mark_failed(job_id).await {
            tracing::error!(error = %e, "Failed to mark job as failed");
            return AckDecision::Nack;
        }

        decision
    }
}
