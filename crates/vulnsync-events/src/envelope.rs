//! Event envelope wrapping all events with routing metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;
use crate::event::Event;

/// Standard envelope wrapping every vulnsync event.
///
/// Carries the metadata required for routing, replay and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique identifier for this event instance.
    pub event_id: Uuid,

    /// Fully qualified event type name, e.g. `vulnsync.checklist.updated`.
    pub event_type: String,

    /// User or service that triggered the event. None for
    /// system-generated events such as scheduled refreshes.
    pub actor: Option<String>,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// The actual event payload.
    pub payload: T,
}

impl<T: Event> EventEnvelope<T> {
    /// Wrap a payload in a new envelope.
    pub fn new(payload: T, actor: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: T::EVENT_TYPE.to_string(),
            actor,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The topic this envelope belongs on.
    pub fn topic(&self) -> &'static str {
        T::TOPIC
    }

    /// Serialize the envelope to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            cause: e.to_string(),
        })
    }

    /// Deserialize an envelope from JSON bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|_| EventError::DeserializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            raw: String::from_utf8_lossy(bytes).to_string(),
        })
    }
}

/// Envelope with an opaque payload, for dispatch before the event type
/// is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    pub event_id: Uuid,
    pub event_type: String,
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl RawEnvelope {
    /// Parse from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::InvalidEnvelope {
            reason: e.to_string(),
        })
    }

    /// Validate that the envelope is routable.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.event_type.is_empty() {
            return Err(EventError::InvalidEnvelope {
                reason: "event_type is empty".to_string(),
            });
        }

        if !self.event_type.starts_with("vulnsync.") {
            return Err(EventError::InvalidEnvelope {
                reason: format!(
                    "event_type '{}' does not follow naming convention",
                    self.event_type
                ),
            });
        }

        Ok(())
    }

    /// Try to deserialize the payload into a specific event type.
    pub fn into_typed<T: Event>(self) -> Result<EventEnvelope<T>, EventError> {
        let payload: T = serde_json::from_value(self.payload).map_err(|e| {
            EventError::DeserializationFailed {
                event_type: self.event_type.clone(),
                raw: e.to_string(),
            }
        })?;

        Ok(EventEnvelope {
            event_id: self.event_id,
            event_type: self.event_type,
            actor: self.actor,
            timestamp: self.timestamp,
            payload,
        })
    }
}
