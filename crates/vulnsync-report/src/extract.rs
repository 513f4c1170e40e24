//! Finding extraction: one checklist snapshot to N flat report drafts.
//!
//! The extractor walks findings in source document order and yields one
//! draft per finding. A finding without a vulnerability number cannot be
//! keyed and is skipped with a warning; it never fails the batch.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::checklist::ChecklistDocument;
use crate::models::VulnerabilityReportRecord;
use crate::sanitize::{sanitize_checklist_release, sanitize_checklist_type};

/// Fallback hostname for checklists whose asset block has no host name.
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

/// Extraction output: drafts in source order plus the count of findings
/// skipped for missing identifiers.
#[derive(Debug)]
pub struct Extraction {
    pub drafts: Vec<VulnerabilityReportRecord>,
    pub skipped: usize,
}

/// Lazily extract report drafts from a checklist snapshot.
///
/// The returned iterator is finite, preserves document order, and can
/// be recreated from the same document at any time. Findings without a
/// vulnerability number are skipped inside the iterator.
pub fn findings<'a>(
    doc: &'a ChecklistDocument,
    system_group_id: &'a str,
    artifact_id: &'a str,
) -> impl Iterator<Item = VulnerabilityReportRecord> + 'a {
    let hostname = doc
        .asset
        .host_name
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or(UNKNOWN_HOSTNAME)
        .to_string();

    let checklist_version = doc
        .info
        .version
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();
    let checklist_release =
        sanitize_checklist_release(doc.info.release_info.as_deref().unwrap_or_default());
    let checklist_type = sanitize_checklist_type(doc.info.title.as_deref().unwrap_or_default());

    doc.findings.iter().filter_map(move |finding| {
        let Some(vuln_id) = finding
            .vuln_num
            .as_deref()
            .filter(|v| !v.trim().is_empty())
        else {
            warn!(
                system_group_id = %system_group_id,
                artifact_id = %artifact_id,
                rule_title = %finding.rule_title.as_deref().unwrap_or(""),
                "Finding has no vulnerability number, skipping"
            );
            return None;
        };

        let cci_list: Vec<String> = finding
            .cci_refs
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect();

        Some(VulnerabilityReportRecord {
            id: Uuid::nil(),
            system_group_id: system_group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            vuln_id: vuln_id.to_string(),
            hostname: hostname.clone(),
            checklist_version: checklist_version.clone(),
            checklist_release: checklist_release.clone(),
            checklist_type: checklist_type.clone(),
            severity: finding.severity.clone().unwrap_or_default(),
            severity_override: finding.severity_override.clone().unwrap_or_default(),
            severity_justification: finding
                .severity_justification
                .clone()
                .unwrap_or_default(),
            status: finding.status.clone().unwrap_or_default(),
            comments: finding.comments.clone().unwrap_or_default(),
            details: finding.finding_details.clone().unwrap_or_default(),
            check_content: finding.check_content.clone().unwrap_or_default(),
            discussion: finding.discussion.clone().unwrap_or_default(),
            fix_text: finding.fix_text.clone().unwrap_or_default(),
            rule_title: finding.rule_title.clone().unwrap_or_default(),
            cci_list,
            created: Utc::now(),
            created_by: None,
            updated_by: None,
            updated_on: None,
        })
    })
}

/// Extract the full draft set, tracking how many findings were skipped.
pub fn extract_all(
    doc: &ChecklistDocument,
    system_group_id: &str,
    artifact_id: &str,
) -> Extraction {
    let drafts: Vec<VulnerabilityReportRecord> =
        findings(doc, system_group_id, artifact_id).collect();
    let skipped = doc.findings.len() - drafts.len();
    Extraction { drafts, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{Asset, ChecklistInfo, Finding};

    fn finding(vuln_num: Option<&str>) -> Finding {
        Finding {
            vuln_num: vuln_num.map(String::from),
            severity: Some("medium".into()),
            status: Some("Open".into()),
            cci_refs: vec!["CCI-000056".into(), String::new(), "CCI-000056".into()],
            ..Finding::default()
        }
    }

    fn doc(findings: Vec<Finding>) -> ChecklistDocument {
        ChecklistDocument {
            asset: Asset {
                host_name: Some("web01".into()),
                ..Asset::default()
            },
            info: ChecklistInfo {
                version: Some("2".into()),
                release_info: Some("Release: 12 Benchmark Date: 25 Oct 2019".into()),
                title: Some(
                    "Windows Server 2016 Security Technical Implementation Guide".into(),
                ),
            },
            findings,
        }
    }

    #[test]
    fn skips_findings_without_vuln_number() {
        let doc = doc(vec![
            finding(Some("V-1")),
            finding(None),
            finding(Some("V-3")),
        ]);

        let extraction = extract_all(&doc, "sg-1", "art-1");
        assert_eq!(extraction.drafts.len(), 2);
        assert_eq!(extraction.skipped, 1);
        assert_eq!(extraction.drafts[0].vuln_id, "V-1");
        assert_eq!(extraction.drafts[1].vuln_id, "V-3");
    }

    #[test]
    fn sanitizes_document_metadata() {
        let doc = doc(vec![finding(Some("V-1"))]);
        let draft = &extract_all(&doc, "sg-1", "art-1").drafts[0];

        assert_eq!(draft.checklist_version, "2");
        assert_eq!(draft.checklist_release, "Release: 12");
        assert_eq!(draft.checklist_type, "Windows Server 2016");
        assert_eq!(draft.hostname, "web01");
    }

    #[test]
    fn empty_hostname_falls_back_to_unknown() {
        let mut d = doc(vec![finding(Some("V-1"))]);
        d.asset.host_name = Some("   ".into());

        let draft = &extract_all(&d, "sg-1", "art-1").drafts[0];
        assert_eq!(draft.hostname, UNKNOWN_HOSTNAME);

        d.asset.host_name = None;
        let draft = &extract_all(&d, "sg-1", "art-1").drafts[0];
        assert_eq!(draft.hostname, UNKNOWN_HOSTNAME);
    }

    #[test]
    fn cci_list_drops_empties_and_keeps_duplicates() {
        let doc = doc(vec![finding(Some("V-1"))]);
        let draft = &extract_all(&doc, "sg-1", "art-1").drafts[0];
        assert_eq!(draft.cci_list, vec!["CCI-000056", "CCI-000056"]);
    }

    #[test]
    fn extraction_is_restartable() {
        let doc = doc(vec![finding(Some("V-1")), finding(Some("V-2"))]);
        let first: Vec<String> = findings(&doc, "sg-1", "art-1")
            .map(|d| d.vuln_id)
            .collect();
        let second: Vec<String> = findings(&doc, "sg-1", "art-1")
            .map(|d| d.vuln_id)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["V-1", "V-2"]);
    }
}
