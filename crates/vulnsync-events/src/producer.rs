//! Kafka event producer.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{debug, info, instrument};

use crate::config::KafkaConfig;
use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::Event;

/// Kafka producer for publishing vulnsync events.
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    /// Create a new event producer with the given configuration.
    pub fn new(config: &KafkaConfig) -> Result<Self, EventError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("security.protocol", &config.security_protocol)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .create()
            .map_err(|e| EventError::ConnectionFailed {
                broker: config.bootstrap_servers.clone(),
                cause: e.to_string(),
            })?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            client_id = %config.client_id,
            "Event producer created"
        );

        Ok(Self { producer })
    }

    /// Wrap an event in an envelope and publish it.
    #[instrument(skip(self, event), fields(event_type = %E::EVENT_TYPE))]
    pub async fn publish<E: Event>(
        &self,
        event: E,
        actor: Option<String>,
    ) -> Result<(), EventError> {
        self.publish_envelope(EventEnvelope::new(event, actor)).await
    }

    /// Publish a pre-constructed envelope.
    #[instrument(skip(self, envelope), fields(
        event_id = %envelope.event_id,
        event_type = %envelope.event_type
    ))]
    pub async fn publish_envelope<E: Event>(
        &self,
        envelope: EventEnvelope<E>,
    ) -> Result<(), EventError> {
        let topic = E::TOPIC;
        let key = envelope.event_id.to_string();
        let payload = envelope.to_json_bytes()?;

        debug!(topic = %topic, payload_size = payload.len(), "Publishing event");

        self.producer
            .send(
                FutureRecord::to(topic).key(&key).payload(&payload),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(err, _)| EventError::PublishFailed {
                topic: topic.to_string(),
                cause: err.to_string(),
            })?;

        Ok(())
    }
}
