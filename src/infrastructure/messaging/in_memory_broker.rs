use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    AckHandle, ChannelError, Delivery, NotificationPublisher, NotificationSource,
};
use crate::domain::Notification;

#[derive(Debug, Clone)]
struct Envelope {
    message_id: String,
    data: Bytes,
    attempt: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    Acked,
    Nacked,
}

/// One settled delivery, in settlement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub message_id: String,
    pub attempt: u32,
    pub kind: SettlementKind,
}

#[derive(Default)]
struct Ledger {
    settlements: Vec<Settlement>,
    dead_letters: Vec<Bytes>,
}

struct Shared {
    sender: mpsc::UnboundedSender<Envelope>,
    ledger: Mutex<Ledger>,
    max_delivery_attempts: u32,
}

impl Shared {
    fn settle(&self, envelope: Envelope, kind: SettlementKind) {
        let exhausted = envelope.attempt >= self.max_delivery_attempts;

        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.settlements.push(Settlement {
                message_id: envelope.message_id.clone(),
                attempt: envelope.attempt,
                kind,
            });
            if kind == SettlementKind::Nacked && exhausted {
                ledger.dead_letters.push(envelope.data.clone());
            }
        }

        if kind == SettlementKind::Acked {
            return;
        }

        if exhausted {
            tracing::warn!(
                message_id = %envelope.message_id,
                attempts = envelope.attempt,
                "Message exceeded max delivery attempts, dead-lettered"
            );
            return;
        }

        tracing::debug!(message_id = %envelope.message_id, attempt = envelope.attempt, "Redelivering message");
        let redelivery = Envelope {
            attempt: envelope.attempt + 1,
            ..envelope
        };
        if self.sender.send(redelivery).is_err() {
            tracing::warn!("In-memory channel closed, dropping redelivery");
        }
    }
}

/// Process-local at-least-once channel used for local runs and tests.
///
/// Rejected messages are redelivered with an incremented attempt count
/// until `max_delivery_attempts`, then moved to the dead-letter list.
/// A delivery dropped without being settled counts as rejected.
pub struct InMemoryBroker {
    shared: Arc<Shared>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope>>,
    flow_control: Arc<Semaphore>,
    next_id: AtomicU64,
    closed: CancellationToken,
}

impl InMemoryBroker {
    pub fn new(max_outstanding_messages: usize, max_delivery_attempts: u32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                sender,
                ledger: Mutex::new(Ledger::default()),
                max_delivery_attempts: max_delivery_attempts.max(1),
            }),
            receiver: tokio::sync::Mutex::new(receiver),
            flow_control: Arc::new(Semaphore::new(max_outstanding_messages.max(1))),
            next_id: AtomicU64::new(1),
            closed: CancellationToken::new(),
        }
    }

    /// Publishes an arbitrary payload, bypassing notification encoding.
    pub fn publish_raw(&self, data: impl Into<Bytes>) -> Result<String, ChannelError> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::Closed);
        }
        let message_id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.shared
            .sender
            .send(Envelope {
                message_id: message_id.clone(),
                data: data.into(),
                attempt: 1,
            })
            .map_err(|_| ChannelError::Closed)?;
        Ok(message_id)
    }

    /// Stops handing out deliveries; `receive` returns `None` afterwards.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.shared
            .ledger
            .lock()
            .map(|l| l.settlements.clone())
            .unwrap_or_default()
    }

    pub fn settlements_for(&self, message_id: &str) -> Vec<Settlement> {
        self.settlements()
            .into_iter()
            .filter(|s| s.message_id == message_id)
            .collect()
    }

    pub fn dead_letters(&self) -> Vec<Bytes> {
        self.shared
            .ledger
            .lock()
            .map(|l| l.dead_letters.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryBroker {
    async fn publish(&self, notification: &Notification) -> Result<String, ChannelError> {
        let data = notification
            .to_vec()
            .map_err(|e| ChannelError::Serialization(e.to_string()))?;
        self.publish_raw(data)
    }
}

#[async_trait]
impl NotificationSource for InMemoryBroker {
    async fn receive(&self) -> Result<Option<Delivery>, ChannelError> {
        let permit = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Ok(None),
            permit = Arc::clone(&self.flow_control).acquire_owned() => {
                permit.map_err(|_| ChannelError::Closed)?
            }
        };

        let envelope = {
            let mut receiver = self.receiver.lock().await;
            tokio::select! {
                biased;
                _ = self.closed.cancelled() => return Ok(None),
                envelope = receiver.recv() => match envelope {
                    Some(envelope) => envelope,
                    None => return Ok(None),
                },
            }
        };

        let handle = InMemoryAck {
            envelope: Some(envelope.clone()),
            shared: Arc::clone(&self.shared),
            _permit: permit,
        };

        Ok(Some(Delivery::new(
            envelope.message_id,
            envelope.data,
            envelope.attempt,
            Box::new(handle),
        )))
    }
}

struct InMemoryAck {
    envelope: Option<Envelope>,
    shared: Arc<Shared>,
    _permit: OwnedSemaphorePermit,
}

#[async_trait]
impl AckHandle for InMemoryAck {
    async fn ack(mut self: Box<Self>) -> Result<(), ChannelError> {
        if let Some(envelope) = self.envelope.take() {
            self.shared.settle(envelope, SettlementKind::Acked);
        }
        Ok(())
    }

    async fn nack(mut self: Box<Self>) -> Result<(), ChannelError> {
        if let Some(envelope) = self.envelope.take() {
            self.shared.settle(envelope, SettlementKind::Nacked);
        }
        Ok(())
    }
}

impl Drop for InMemoryAck {
    fn drop(&mut self) {
        if let Some(envelope) = self.envelope.take() {
            tracing::warn!(message_id = %envelope.message_id, "Delivery dropped without settlement");
            self.shared.settle(envelope, SettlementKind::Nacked);
        }
    }
}
