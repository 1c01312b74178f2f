use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::application::ports::{
    AckHandle, ChannelError, Delivery, NotificationPublisher, NotificationSource,
};
use crate::domain::Notification;

const IDLE_BACKOFF: Duration = Duration::from_secs(1);

/// Minimal Google Pub/Sub REST client shared by publisher and subscription.
#[derive(Clone)]
pub struct PubSubClient {
    client: Client,
    endpoint: String,
    project_id: String,
    access_token: Option<String>,
}

impl PubSubClient {
    pub fn new(endpoint: &str, project_id: &str, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            access_token,
        }
    }

    fn topic_url(&self, topic: &str, action: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:{}",
            self.endpoint, self.project_id, topic, action
        )
    }

    fn subscription_url(&self, subscription: &str, action: &str) -> String {
        format!(
            "{}/v1/projects/{}/subscriptions/{}:{}",
            self.endpoint, self.project_id, subscription, action
        )
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, String> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| format!("request: {}", e))?;

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

    async fn modify_ack_deadline(
        &self,
        subscription: &str,
        ack_id: &str,
        seconds: u32,
    ) -> Result<(), String> {
        let body = ModifyAckDeadlineRequest {
            ack_ids: vec![ack_id.to_string()],
            ack_deadline_seconds: seconds,
        };
        self.post(&self.subscription_url(subscription, "modifyAckDeadline"), &body)
            .await
            .map(|_| ())
    }
}

#[derive(Serialize)]
struct PublishRequest {
    messages: Vec<OutboundMessage>,
}

#[derive(Serialize)]
struct OutboundMessage {
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    max_messages: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<ReceivedMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceivedMessage {
    ack_id: String,
    message: PubsubMessage,
    #[serde(default)]
    delivery_attempt: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PubsubMessage {
    #[serde(default)]
    data: String,
    #[serde(default)]
    message_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest {
    ack_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyAckDeadlineRequest {
    ack_ids: Vec<String>,
    ack_deadline_seconds: u32,
}

pub struct PubSubPublisher {
    client: PubSubClient,
    topic: String,
}

impl PubSubPublisher {
    pub fn new(client: PubSubClient, topic: &str) -> Self {
        Self {
            client,
            topic: topic.to_string(),
        }
    }
}

#[async_trait]
impl NotificationPublisher for PubSubPublisher {
    async fn publish(&self, notification: &Notification) -> Result<String, ChannelError> {
        let data = notification
            .to_vec()
            .map_err(|e| ChannelError::Serialization(e.to_string()))?;
        let body = PublishRequest {
            messages: vec![OutboundMessage {
                data: BASE64.encode(data),
            }],
        };

        let response = self
            .client
            .post(&self.client.topic_url(&self.topic, "publish"), &body)
            .await
            .map_err(ChannelError::PublishFailed)?;

        let published: PublishResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::PublishFailed(format!("parse response: {}", e)))?;

        published
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| ChannelError::PublishFailed("no message id returned".to_string()))
    }
}

/// Streaming-pull style consumer over the REST `pull` call.
///
/// At most `max_outstanding` deliveries are unsettled at once. While a
/// delivery is unsettled its ack deadline is extended in the background,
/// so jobs longer than the subscription deadline are not redelivered.
pub struct PubSubSubscription {
    client: PubSubClient,
    subscription: String,
    buffer: Mutex<VecDeque<ReceivedMessage>>,
    flow_control: Arc<Semaphore>,
    batch_size: u32,
    ack_deadline_secs: u32,
}

impl PubSubSubscription {
    pub fn new(
        client: PubSubClient,
        subscription: &str,
        max_outstanding: usize,
        batch_size: u32,
        ack_deadline_secs: u32,
    ) -> Self {
        Self {
            client,
            subscription: subscription.to_string(),
            buffer: Mutex::new(VecDeque::new()),
            flow_control: Arc::new(Semaphore::new(max_outstanding.max(1))),
            batch_size: batch_size.max(1),
            ack_deadline_secs: ack_deadline_secs.max(10),
        }
    }

    async fn pull(&self) -> Result<Vec<ReceivedMessage>, ChannelError> {
        // Only ask for what can be handed out soon; buffered messages are
        // not lease-extended.
        let wanted = (self.flow_control.available_permits() as u32 + 1).min(self.batch_size);
        let response = self
            .client
            .post(
                &self.client.subscription_url(&self.subscription, "pull"),
                &PullRequest {
                    max_messages: wanted,
                },
            )
            .await
            .map_err(ChannelError::ReceiveFailed)?;

        let pulled: PullResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::ReceiveFailed(format!("parse response: {}", e)))?;

        Ok(pulled.received_messages)
    }

    fn into_delivery(&self, received: ReceivedMessage, permit: OwnedSemaphorePermit) -> Delivery {
        let (data, decode_error) = match BASE64.decode(received.message.data.as_bytes()) {
            Ok(decoded) => (Bytes::from(decoded), None),
            Err(e) => (Bytes::new(), Some(format!("invalid base64: {}", e))),
        };

        let lease = CancellationToken::new();
        spawn_lease_extender(
            self.client.clone(),
            self.subscription.clone(),
            received.ack_id.clone(),
            self.ack_deadline_secs,
            lease.clone(),
        );

        let handle = PubSubAck {
            client: self.client.clone(),
            subscription: self.subscription.clone(),
            ack_id: received.ack_id,
            _lease: lease.drop_guard(),
            _permit: permit,
        };

        let delivery = Delivery::new(
            received.message.message_id,
            data,
            received.delivery_attempt.unwrap_or(1),
            Box::new(handle),
        );
        match decode_error {
            Some(error) => delivery.with_decode_error(error),
            None => delivery,
        }
    }
}

#[async_trait]
impl NotificationSource for PubSubSubscription {
    async fn receive(&self) -> Result<Option<Delivery>, ChannelError> {
        let permit = Arc::clone(&self.flow_control)
            .acquire_owned()
            .await
            .map_err(|_| ChannelError::Closed)?;

        loop {
            let mut buffer = self.buffer.lock().await;
            if let Some(received) = buffer.pop_front() {
                return Ok(Some(self.into_delivery(received, permit)));
            }

            let pulled = self.pull().await?;
            if pulled.is_empty() {
                drop(buffer);
                tokio::time::sleep(IDLE_BACKOFF).await;
                continue;
            }

            tracing::debug!(count = pulled.len(), "Pulled messages");
            buffer.extend(pulled);
        }
    }
}

fn spawn_lease_extender(
    client: PubSubClient,
    subscription: String,
    ack_id: String,
    ack_deadline_secs: u32,
    lease: CancellationToken,
) {
    let every = Duration::from_secs(u64::from(ack_deadline_secs) * 2 / 3);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = lease.cancelled() => return,
                _ = tokio::time::sleep(every) => {}
            }
            if let Err(e) = client
                .modify_ack_deadline(&subscription, &ack_id, ack_deadline_secs)
                .await
            {
                tracing::warn!(error = %e, "Failed to extend ack deadline");
            }
        }
    });
}

struct PubSubAck {
    client: PubSubClient,
    subscription: String,
    ack_id: String,
    _lease: DropGuard,
    _permit: OwnedSemaphorePermit,
}

#[async_trait]
impl AckHandle for PubSubAck {
    async fn ack(self: Box<Self>) -> Result<(), ChannelError> {
        let body = AcknowledgeRequest {
            ack_ids: vec![self.ack_id.clone()],
        };
        self.client
            .post(
                &self.client.subscription_url(&self.subscription, "acknowledge"),
                &body,
            )
            .await
            .map(|_| ())
            .map_err(ChannelError::AckFailed)
    }

    async fn nack(self: Box<Self>) -> Result<(), ChannelError> {
        self.client
            .modify_ack_deadline(&self.subscription, &self.ack_id, 0)
            .await
            .map_err(ChannelError::AckFailed)
    }
}
