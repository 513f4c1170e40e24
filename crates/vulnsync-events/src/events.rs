//! Domain event definitions consumed by the report worker.
//!
//! One type per inbound event. The payloads are the contract with the
//! upstream services that own checklists, systems and scan uploads.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A system group was deleted; all report data for it must go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDeleted {
    pub system_group_id: String,
}

impl Event for SystemDeleted {
    const TOPIC: &'static str = "vulnsync.system.deleted";
    const EVENT_TYPE: &'static str = "vulnsync.system.deleted";
}

/// A checklist was deleted; its report rows must go (scan data stays,
/// it is keyed by system, not by checklist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistDeleted {
    pub artifact_id: String,
}

impl Event for ChecklistDeleted {
    const TOPIC: &'static str = "vulnsync.checklist.deleted";
    const EVENT_TYPE: &'static str = "vulnsync.checklist.deleted";
}

/// A fresh patch scan was uploaded for a system group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchScanAvailable {
    pub system_group_id: String,
}

impl Event for PatchScanAvailable {
    const TOPIC: &'static str = "vulnsync.system.patchscan";
    const EVENT_TYPE: &'static str = "vulnsync.system.patchscan";
}

/// A new checklist was saved. The worker fetches the full checklist by
/// artifact id and materializes its findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistCreated {
    pub artifact_id: String,
}

impl Event for ChecklistCreated {
    const TOPIC: &'static str = "vulnsync.checklist.created";
    const EVENT_TYPE: &'static str = "vulnsync.checklist.created";
}

/// An existing checklist was updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistUpdated {
    pub artifact_id: String,
}

impl Event for ChecklistUpdated {
    const TOPIC: &'static str = "vulnsync.checklist.updated";
    const EVENT_TYPE: &'static str = "vulnsync.checklist.updated";
}

/// An operator edited a single finding (status, comments, details or a
/// severity override). Only the fields that are `Some` were touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingUpdated {
    pub system_group_id: String,
    pub artifact_id: String,
    pub vuln_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub severity_override: Option<String>,
    #[serde(default)]
    pub severity_justification: Option<String>,
    pub updated_by: String,
}

impl Event for FindingUpdated {
    const TOPIC: &'static str = "vulnsync.finding.updated";
    const EVENT_TYPE: &'static str = "vulnsync.finding.updated";
}

/// Rebuild the vulnerability report projection for every system group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshVulnerabilityData {}

impl Event for RefreshVulnerabilityData {
    const TOPIC: &'static str = "vulnsync.report.refresh";
    const EVENT_TYPE: &'static str = "vulnsync.report.refresh";
}

/// Rebuild the patch-scan projection for every system group that has a
/// raw scan on file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshPatchScanData {}

impl Event for RefreshPatchScanData {
    const TOPIC: &'static str = "vulnsync.report.refreshscan";
    const EVENT_TYPE: &'static str = "vulnsync.report.refreshscan";
}

/// All topics the report worker subscribes to.
pub const INBOUND_TOPICS: &[&str] = &[
    SystemDeleted::TOPIC,
    ChecklistDeleted::TOPIC,
    PatchScanAvailable::TOPIC,
    ChecklistCreated::TOPIC,
    ChecklistUpdated::TOPIC,
    FindingUpdated::TOPIC,
    RefreshVulnerabilityData::TOPIC,
    RefreshPatchScanData::TOPIC,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_updated_tolerates_sparse_payloads() {
        let json = serde_json::json!({
            "system_group_id": "sg-1",
            "artifact_id": "art-1",
            "vuln_id": "V-1070",
            "status": "NotAFinding",
            "updated_by": "operator"
        });

        let event: FindingUpdated = serde_json::from_value(json).unwrap();
        assert_eq!(event.status.as_deref(), Some("NotAFinding"));
        assert!(event.comments.is_none());
        assert!(event.severity_override.is_none());
    }

    #[test]
    fn inbound_topics_are_distinct() {
        let mut topics: Vec<&str> = INBOUND_TOPICS.to_vec();
        topics.sort_unstable();
        topics.dedup();
        assert_eq!(topics.len(), INBOUND_TOPICS.len());
    }
}
