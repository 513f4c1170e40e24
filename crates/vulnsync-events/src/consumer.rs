//! Kafka event consumer driving an [`EnvelopeHandler`].

use std::sync::Arc;

use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{debug, error, info, instrument};

use crate::config::KafkaConfig;
use crate::envelope::RawEnvelope;
use crate::error::EventError;
use crate::handler::EnvelopeHandler;

/// Kafka consumer that subscribes to the worker's inbound topics and
/// hands every delivered envelope to a single handler.
///
/// Offsets are committed only after the handler succeeds, so a failed
/// event is redelivered. Handlers are expected to be idempotent under
/// redelivery; the reconciliation operations are designed for exactly
/// that.
pub struct EventConsumer {
    consumer: StreamConsumer,
    group_id: String,
}

impl EventConsumer {
    /// Create a new consumer and subscribe it to the given topics.
    pub fn new(config: &KafkaConfig, topics: &[&str]) -> Result<Self, EventError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("group.id", &config.group_id)
            .set("security.protocol", &config.security_protocol)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .set("session.timeout.ms", "30000")
            .create()
            .map_err(|e| EventError::ConnectionFailed {
                broker: config.bootstrap_servers.clone(),
                cause: e.to_string(),
            })?;

        consumer
            .subscribe(topics)
            .map_err(|e| EventError::ConsumeFailed {
                topic: topics.join(","),
                cause: e.to_string(),
            })?;

        info!(
            group_id = %config.group_id,
            topics = %topics.join(","),
            "Event consumer subscribed"
        );

        Ok(Self {
            consumer,
            group_id: config.group_id.clone(),
        })
    }

    /// Run the consumer loop, dispatching events until the stream ends.
    #[instrument(skip(self, handler), fields(group_id = %self.group_id))]
    pub async fn run<H: EnvelopeHandler>(self, handler: Arc<H>) -> Result<(), EventError> {
        info!("Starting consumer loop");

        let mut stream = self.consumer.stream();

        while let Some(result) = stream.next().await {
            match result {
                Ok(message) => {
                    if let Err(e) = self.process_message(&message, handler.as_ref()).await {
                        // Offset stays uncommitted so the broker redelivers.
                        error!(error = %e, "Failed to process message");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error receiving message");
                }
            }
        }

        info!("Consumer loop ended");
        Ok(())
    }

    async fn process_message<H: EnvelopeHandler>(
        &self,
        message: &rdkafka::message::BorrowedMessage<'_>,
        handler: &H,
    ) -> Result<(), EventError> {
        let payload = message
            .payload()
            .ok_or_else(|| EventError::InvalidEnvelope {
                reason: "Empty payload".to_string(),
            })?;

        let raw = RawEnvelope::from_bytes(payload)?;
        raw.validate()?;

        let event_id = raw.event_id;
        debug!(
            event_id = %event_id,
            event_type = %raw.event_type,
            "Received message"
        );

        handler
            .handle(raw)
            .await
            .map_err(|e| EventError::HandlerFailed {
                event_id,
                cause: e.to_string(),
            })?;

        self.consumer
            .commit_message(message, CommitMode::Async)
            .map_err(|e| EventError::ConsumeFailed {
                topic: message.topic().to_string(),
                cause: e.to_string(),
            })
    }
}
