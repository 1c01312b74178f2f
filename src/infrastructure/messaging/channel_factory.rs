use std::sync::Arc;

use crate::application::ports::{NotificationPublisher, NotificationSource};
use crate::presentation::config::{MessagingProvider, MessagingSettings};

use super::in_memory_broker::InMemoryBroker;
use super::pubsub_rest::{PubSubClient, PubSubPublisher, PubSubSubscription};

pub struct NotificationChannel {
    pub publisher: Arc<dyn NotificationPublisher>,
    pub source: Arc<dyn NotificationSource>,
}

pub struct NotificationChannelFactory;

impl NotificationChannelFactory {
    pub fn create(settings: &MessagingSettings) -> NotificationChannel {
        match settings.provider {
            MessagingProvider::Memory => {
                let broker = Arc::new(InMemoryBroker::new(
                    settings.max_outstanding_messages,
                    settings.max_delivery_attempts,
                ));
                NotificationChannel {
                    publisher: Arc::clone(&broker) as Arc<dyn NotificationPublisher>,
                    source: broker,
                }
            }
            MessagingProvider::PubSub => {
                let client = PubSubClient::new(
                    &settings.endpoint,
                    &settings.project_id,
                    settings.access_token.clone(),
                );
                NotificationChannel {
                    publisher: Arc::new(PubSubPublisher::new(client.clone(), &settings.topic)),
                    source: Arc::new(PubSubSubscription::new(
                        client,
                        &settings.subscription,
                        settings.max_outstanding_messages,
                        settings.pull_batch_size,
                        settings.ack_deadline_secs,
                    )),
                }
            }
        }
    }
}
