//! Error types for the vulnsync-events crate.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during event operations.
#[derive(Debug, Error)]
pub enum EventError {
    // Configuration errors (permanent, no retry)
    /// Required configuration variable is missing.
    #[error("Configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("Configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    // Connection errors (transient, retry with backoff)
    /// Failed to connect to the broker.
    #[error("Connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    // Publishing errors
    /// Failed to publish an event to a topic.
    #[error("Failed to publish to topic {topic}: {cause}")]
    PublishFailed { topic: String, cause: String },

    /// Failed to serialize an event.
    #[error("Failed to serialize event type {event_type}: {cause}")]
    SerializationFailed { event_type: String, cause: String },

    // Consuming errors
    /// Failed to consume from a topic.
    #[error("Failed to consume from topic {topic}: {cause}")]
    ConsumeFailed { topic: String, cause: String },

    /// Failed to deserialize an event payload.
    #[error("Failed to deserialize event type {event_type}: {raw}")]
    DeserializationFailed { event_type: String, raw: String },

    /// An event handler reported a failure.
    #[error("Handler failed for event {event_id}: {cause}")]
    HandlerFailed { event_id: Uuid, cause: String },

    // Envelope errors
    /// The envelope is malformed or violates naming conventions.
    #[error("Invalid event envelope: {reason}")]
    InvalidEnvelope { reason: String },

    // Internal Kafka errors
    /// Internal Kafka client error.
    #[cfg(feature = "kafka")]
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

impl EventError {
    /// Returns true if this error is transient and the operation can be
    /// retried by redelivery.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EventError::ConnectionFailed { .. }
                | EventError::PublishFailed { .. }
                | EventError::ConsumeFailed { .. }
        )
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EventError::ConfigMissing { .. } | EventError::ConfigInvalid { .. }
        )
    }
}
