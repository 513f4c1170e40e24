//! Handler seam between the transport and the application.

use async_trait::async_trait;

use crate::envelope::RawEnvelope;
use crate::error::EventError;

/// Trait for components that dispatch raw envelopes.
///
/// The transport (Kafka consumer, test harness, replay tool) hands each
/// delivered envelope to a single handler. Returning an error leaves the
/// message unacknowledged so the transport can redeliver it.
#[async_trait]
pub trait EnvelopeHandler: Send + Sync + 'static {
    /// Handle one envelope.
    async fn handle(&self, envelope: RawEnvelope) -> Result<(), EventError>;
}
