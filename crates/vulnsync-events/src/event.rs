//! Event trait definition for type-safe event publishing/consuming.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be published and consumed as domain events.
///
/// Implementors define the topic the event travels on and the event type
/// name stored in the envelope. Payloads are serialized as JSON.
///
/// # Example
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use vulnsync_events::Event;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// pub struct SystemDeleted {
///     pub system_group_id: String,
/// }
///
/// impl Event for SystemDeleted {
///     const TOPIC: &'static str = "vulnsync.system.deleted";
///     const EVENT_TYPE: &'static str = "vulnsync.system.deleted";
/// }
/// ```
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The topic this event type is published to and consumed from.
    const TOPIC: &'static str;

    /// The fully qualified event type name stored in the envelope.
    ///
    /// Convention: `vulnsync.<entity>.<action>`
    const EVENT_TYPE: &'static str;
}
