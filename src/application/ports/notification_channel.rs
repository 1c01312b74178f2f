use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{Notification, NotificationError};

/// Settles one delivered message with the channel. Consumed on use.
#[async_trait]
pub trait AckHandle: Send {
    async fn ack(self: Box<Self>) -> Result<(), ChannelError>;

    async fn nack(self: Box<Self>) -> Result<(), ChannelError>;
}

/// A message received from the inbound channel.
///
/// `ack` and `nack` take `self`, so a delivery is settled at most once.
pub struct Delivery {
    pub message_id: String,
    pub data: Bytes,
    pub delivery_attempt: u32,
    decode_error: Option<String>,
    handle: Box<dyn AckHandle>,
}

impl Delivery {
    pub fn new(
        message_id: impl Into<String>,
        data: Bytes,
        delivery_attempt: u32,
        handle: Box<dyn AckHandle>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            data,
            delivery_attempt,
            decode_error: None,
            handle,
        }
    }

    /// Marks the payload as undecoded by the transport; `data` is empty.
    pub fn with_decode_error(mut self, error: impl Into<String>) -> Self {
        self.decode_error = Some(error.into());
        self
    }

    pub fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }

    /// Parses the payload, surfacing a transport decode failure first.
    pub fn notification(&self) -> Result<Notification, NotificationError> {
        match &self.decode_error {
            Some(error) => Err(NotificationError::UndecodableData(error.clone())),
            None => Notification::from_slice(&self.data),
        }
    }

    pub async fn ack(self) -> Result<(), ChannelError> {
        self.handle.ack().await
    }

    pub async fn nack(self) -> Result<(), ChannelError> {
        self.handle.nack().await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("message_id", &self.message_id)
            .field("bytes", &self.data.len())
            .field("delivery_attempt", &self.delivery_attempt)
            .field("decode_error", &self.decode_error)
            .finish()
    }
}

/// Inbound at-least-once channel. The source owns flow control: it stops
/// handing out deliveries while too many are unsettled.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Waits for the next delivery. `Ok(None)` means the channel is closed.
    async fn receive(&self) -> Result<Option<Delivery>, ChannelError>;
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publishes one notification and returns the channel's message id.
    async fn publish(&self, notification: &Notification) -> Result<String, ChannelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    #[error("acknowledge failed: {0}")]
    AckFailed(String),
    #[error("channel closed")]
    Closed,
    #[error("serialization failed: {0}")]
    Serialization(String),
}
