use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{ChannelError, Delivery, NotificationSource};

use super::{AckDecision, JobProcessor, ProcessingError};

const INITIAL_RECEIVE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_RECEIVE_BACKOFF: Duration = Duration::from_secs(60);

/// Pulls deliveries from the inbound channel and runs each one on its own
/// task. How many run at once is decided by the source's flow control.
pub struct NotificationConsumer {
    source: Arc<dyn NotificationSource>,
    processor: Arc<JobProcessor>,
    shutdown: CancellationToken,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl NotificationConsumer {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        processor: Arc<JobProcessor>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            source,
            processor,
            shutdown,
            initial_backoff: INITIAL_RECEIVE_BACKOFF,
            max_backoff: MAX_RECEIVE_BACKOFF,
        }
    }

    /// Sets the delay after a failed receive. It doubles per consecutive
    /// failure up to `max` and resets after the next successful receive.
    pub fn with_receive_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// Runs until shutdown is requested or the channel closes, then waits
    /// for in-flight jobs. In-flight jobs see the same shutdown signal and
    /// resolve to failure.
    ///
    /// Receive failures are retried with backoff; only
    /// [`ChannelError::Closed`] ends the loop with an error.
    pub async fn run(self) -> Result<(), ChannelError> {
        tracing::info!("Notification consumer started");
        let mut tasks = JoinSet::new();
        let mut backoff = self.initial_backoff;

        let result = loop {
            while let Some(joined) = tasks.try_join_next() {
                log_join_error(joined);
            }

            let received = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break Ok(()),
                received = self.source.receive() => received,
            };

            match received {
                Ok(Some(delivery)) => {
                    backoff = self.initial_backoff;
                    let span = tracing::info_span!(
                        "notification",
                        message_id = %delivery.message_id,
                        attempt = delivery.delivery_attempt,
                        job_id = tracing::field::Empty,
                    );
                    let processor = Arc::clone(&self.processor);
                    let cancel = self.shutdown.child_token();
                    tasks.spawn(handle_delivery(processor, delivery, cancel).instrument(span));
                }
                Ok(None) => {
                    tracing::info!("Notification channel closed");
                    break Ok(());
                }
                Err(ChannelError::Closed) => {
                    tracing::error!("Notification channel closed unexpectedly");
                    break Err(ChannelError::Closed);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = backoff.as_millis() as u64,
                        "Failed to receive from notification channel"
                    );
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => break Ok(()),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(self.max_backoff);
                }
            }
        };

        if !tasks.is_empty() {
            tracing::info!(in_flight = tasks.len(), "Waiting for in-flight jobs");
        }
        while let Some(joined) = tasks.join_next().await {
            log_join_error(joined);
        }

        tracing::info!("Notification consumer stopped");
        result
    }
}

async fn handle_delivery(
    processor: Arc<JobProcessor>,
    delivery: Delivery,
    cancel: CancellationToken,
) {
    let decision = match delivery.notification() {
        Ok(notification) => {
            tracing::Span::current().record("job_id", notification.job_id.as_str());
            tracing::info!(file_path = %notification.file_path, "Received job notification");
            processor.process(&notification, &cancel).await
        }
        Err(e) => {
            let error = ProcessingError::MalformedNotification(e);
            tracing::warn!(error = %error, kind = error.kind(), "Rejecting malformed notification");
            AckDecision::Nack
        }
    };

    let settled = match decision {
        AckDecision::Ack => delivery.ack().await,
        AckDecision::Nack => delivery.nack().await,
    };

    if let Err(e) = settled {
        tracing::warn!(error = %e, decision = ?decision, "Failed to settle delivery");
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Notification task aborted");
    }
}
