//! Projection record models.
//!
//! `VulnerabilityReportRecord` and `PatchScanRecord` are owned by this
//! worker; `SystemGroup` and `Artifact` are read-only snapshots of
//! upstream state used for enumeration and checklist retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Business identity of one finding row, as opposed to the
/// storage-assigned surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub system_group_id: String,
    pub artifact_id: String,
    pub vuln_id: String,
}

impl NaturalKey {
    pub fn new(
        system_group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        vuln_id: impl Into<String>,
    ) -> Self {
        Self {
            system_group_id: system_group_id.into(),
            artifact_id: artifact_id.into(),
            vuln_id: vuln_id.into(),
        }
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.system_group_id, self.artifact_id, self.vuln_id
        )
    }
}

/// One materialized finding row: flat, queryable, one per
/// (system group, checklist, vulnerability number).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VulnerabilityReportRecord {
    /// Storage-internal surrogate id.
    pub id: Uuid,

    pub system_group_id: String,
    pub artifact_id: String,
    /// Finding identifier (vulnerability number) within the checklist.
    pub vuln_id: String,

    pub hostname: String,
    pub checklist_version: String,
    pub checklist_release: String,
    pub checklist_type: String,

    pub severity: String,
    pub severity_override: String,
    pub severity_justification: String,
    pub status: String,
    pub comments: String,
    pub details: String,
    pub check_content: String,
    pub discussion: String,
    pub fix_text: String,
    pub rule_title: String,

    /// Compliance control references, in source order. Duplicates are
    /// permitted; empty entries are not.
    pub cci_list: Vec<String>,

    pub created: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl VulnerabilityReportRecord {
    /// The natural key of this row.
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(
            self.system_group_id.clone(),
            self.artifact_id.clone(),
            self.vuln_id.clone(),
        )
    }
}

/// One patch-scan row per (system group, plugin). The whole set for a
/// system group is replaced as a unit on every refresh.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PatchScanRecord {
    /// Storage-internal surrogate id.
    pub id: Uuid,

    pub system_group_id: String,

    pub report_name: String,
    pub hostname: String,
    pub operating_system: String,
    pub system_type: String,
    pub ip_address: String,
    pub credentialed: bool,

    pub plugin_id: String,
    pub plugin_name: String,
    pub family: String,
    pub severity: i32,
    /// Number of distinct hosts the plugin fired on.
    pub host_total: i32,
    /// Total occurrences of the plugin across the scan.
    pub total: i32,

    pub description: String,
    pub publication_date: String,
    pub plugin_type: String,
    pub risk_factor: String,
    pub synopsis: String,

    pub created: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl PatchScanRecord {
    /// Human-readable severity bucket for the scanner's 0-4 scale.
    pub fn severity_name(&self) -> &'static str {
        match self.severity {
            4 => "Critical",
            3 => "High",
            2 => "Medium",
            1 => "Low",
            _ => "Info",
        }
    }
}

/// Upstream system group snapshot. Enumeration source for bulk refresh
/// and the carrier of the raw scan blob.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemGroup {
    pub id: String,
    pub title: String,
    /// Raw vendor scan export, if one has been uploaded.
    pub raw_nessus_file: Option<String>,
}

/// Upstream checklist carrier: the raw CKL blob plus its owning group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub system_group_id: String,
    /// Raw checklist XML.
    pub raw_checklist: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_record(severity: i32) -> PatchScanRecord {
        PatchScanRecord {
            id: Uuid::new_v4(),
            system_group_id: "sg-1".into(),
            report_name: "Weekly scan".into(),
            hostname: "myHost".into(),
            operating_system: "Windows".into(),
            system_type: "production".into(),
            ip_address: "10.10.10.111".into(),
            credentialed: true,
            plugin_id: "9689658".into(),
            plugin_name: "My Plugin".into(),
            family: "My Family".into(),
            severity,
            host_total: 2,
            total: 3,
            description: "This is my description".into(),
            publication_date: "March 31, 2020".into(),
            plugin_type: "local".into(),
            risk_factor: "Critical".into(),
            synopsis: "My synopsis".into(),
            created: Utc::now(),
            updated_on: Some(Utc::now()),
        }
    }

    #[test]
    fn severity_names() {
        assert_eq!(scan_record(4).severity_name(), "Critical");
        assert_eq!(scan_record(3).severity_name(), "High");
        assert_eq!(scan_record(2).severity_name(), "Medium");
        assert_eq!(scan_record(1).severity_name(), "Low");
        assert_eq!(scan_record(0).severity_name(), "Info");
        assert_eq!(scan_record(-1).severity_name(), "Info");
    }

    #[test]
    fn natural_key_display() {
        let key = NaturalKey::new("sg-1", "art-1", "V-1070");
        assert_eq!(key.to_string(), "sg-1/art-1/V-1070");
    }
}
