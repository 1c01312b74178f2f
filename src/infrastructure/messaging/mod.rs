mod channel_factory;
mod in_memory_broker;
mod pubsub_rest;

pub use channel_factory::{NotificationChannel, NotificationChannelFactory};
pub use in_memory_broker::{InMemoryBroker, Settlement, SettlementKind};
pub use pubsub_rest::{PubSubClient, PubSubPublisher, PubSubSubscription};
