//! Event router: maps inbound envelopes to reconciliation operations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use vulnsync_events::envelope::RawEnvelope;
use vulnsync_events::error::EventError;
use vulnsync_events::event::Event;
use vulnsync_events::events::{
    ChecklistCreated, ChecklistDeleted, ChecklistUpdated, FindingUpdated, PatchScanAvailable,
    RefreshPatchScanData, RefreshVulnerabilityData, SystemDeleted,
};
use vulnsync_events::handler::EnvelopeHandler;

use crate::engine::ReconciliationEngine;
use crate::error::ReportError;

/// Dispatches each inbound event to the matching engine operation.
///
/// Recoverable failures (data quality, not-found, parse) mark the event
/// handled after logging; only persistence failures bounce back to the
/// transport for redelivery.
pub struct EventRouter {
    engine: Arc<ReconciliationEngine>,
}

impl EventRouter {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }

    async fn route(&self, envelope: RawEnvelope) -> Result<(), ReportError> {
        let event_type = envelope.event_type.clone();

        match event_type.as_str() {
            SystemDeleted::EVENT_TYPE => {
                let event = payload::<SystemDeleted>(envelope)?;
                self.engine
                    .delete_for_system(&event.system_group_id)
                    .await?;
            }
            ChecklistDeleted::EVENT_TYPE => {
                let event = payload::<ChecklistDeleted>(envelope)?;
                self.engine.delete_for_checklist(&event.artifact_id).await?;
            }
            PatchScanAvailable::EVENT_TYPE => {
                let event = payload::<PatchScanAvailable>(envelope)?;
                self.engine.sync_patch_scan(&event.system_group_id).await?;
            }
            ChecklistCreated::EVENT_TYPE => {
                let event = payload::<ChecklistCreated>(envelope)?;
                self.engine.sync_checklist(&event.artifact_id).await?;
            }
            ChecklistUpdated::EVENT_TYPE => {
                let event = payload::<ChecklistUpdated>(envelope)?;
                self.engine.sync_checklist(&event.artifact_id).await?;
            }
            FindingUpdated::EVENT_TYPE => {
                let event = payload::<FindingUpdated>(envelope)?;
                self.engine.apply_finding_update(&event).await?;
            }
            RefreshVulnerabilityData::EVENT_TYPE => {
                let summary = self.engine.refresh_vulnerability_data().await?;
                info!(finding_rows = summary.finding_rows, "Vulnerability data refreshed");
            }
            RefreshPatchScanData::EVENT_TYPE => {
                let summary = self.engine.refresh_patch_scan_data().await?;
                info!(scan_rows = summary.scan_rows, "Patch scan data refreshed");
            }
            other => {
                warn!(event_type = %other, "Unroutable event type, ignoring");
            }
        }

        Ok(())
    }
}

/// Deserialize an envelope payload, mapping failure to a parse error.
fn payload<T: Event>(envelope: RawEnvelope) -> Result<T, ReportError> {
    envelope
        .into_typed::<T>()
        .map(|e| e.payload)
        .map_err(|e| ReportError::Parse {
            reason: e.to_string(),
        })
}

#[async_trait]
impl EnvelopeHandler for EventRouter {
    async fn handle(&self, envelope: RawEnvelope) -> Result<(), EventError> {
        let event_id = envelope.event_id;
        let event_type = envelope.event_type.clone();

        match self.route(envelope).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                // Redelivery cannot fix missing upstream data or a
                // malformed document; log and mark handled.
                warn!(event_id = %event_id, event_type = %event_type, error = %e,
                    "Event handled with a recoverable failure");
                Ok(())
            }
            Err(e) => {
                error!(event_id = %event_id, event_type = %event_type, error = %e,
                    "Event handling failed");
                Err(EventError::HandlerFailed {
                    event_id,
                    cause: e.to_string(),
                })
            }
        }
    }
}
