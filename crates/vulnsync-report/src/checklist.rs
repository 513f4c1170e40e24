//! Checklist (CKL) document model and parser.
//!
//! Parses a raw checklist XML blob into a typed [`ChecklistDocument`]
//! once, so downstream extraction works on named optional fields rather
//! than string-keyed attribute lookups.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{ReportError, ReportResult};

/// Host metadata from the checklist's ASSET block.
#[derive(Debug, Clone, Default)]
pub struct Asset {
    pub host_name: Option<String>,
    pub host_ip: Option<String>,
    pub host_fqdn: Option<String>,
    pub role: Option<String>,
}

/// Document-level STIG metadata, from the STIG_INFO SI_DATA pairs.
#[derive(Debug, Clone, Default)]
pub struct ChecklistInfo {
    /// SI_DATA keyed "version".
    pub version: Option<String>,
    /// SI_DATA keyed "releaseinfo".
    pub release_info: Option<String>,
    /// SI_DATA keyed "title".
    pub title: Option<String>,
}

/// One compliance check result within a checklist.
///
/// Fields are optional because real-world checklists omit attributes;
/// the extractor decides which absences are recoverable.
#[derive(Debug, Clone, Default)]
pub struct Finding {
    /// Vulnerability number, the finding identifier. Required by the
    /// extractor; a finding without one is skipped.
    pub vuln_num: Option<String>,
    pub severity: Option<String>,
    pub rule_title: Option<String>,
    pub discussion: Option<String>,
    pub check_content: Option<String>,
    pub fix_text: Option<String>,
    pub severity_override: Option<String>,
    pub severity_justification: Option<String>,
    pub status: Option<String>,
    pub comments: Option<String>,
    pub finding_details: Option<String>,
    /// CCI references in source order, duplicates preserved.
    pub cci_refs: Vec<String>,
}

/// A parsed checklist snapshot: one asset plus its findings in source
/// document order.
#[derive(Debug, Clone, Default)]
pub struct ChecklistDocument {
    pub asset: Asset,
    pub info: ChecklistInfo,
    pub findings: Vec<Finding>,
}

/// Parse a raw CKL blob into a typed document.
///
/// Malformed XML is a parse failure scoped to this document. Missing
/// elements are not errors here; absence is represented as `None` and
/// judged by the extractor.
pub fn parse_checklist(xml: &str) -> ReportResult<ChecklistDocument> {
    if xml.trim().is_empty() {
        return Err(ReportError::Parse {
            reason: "empty checklist blob".to_string(),
        });
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = ChecklistDocument::default();

    let mut in_asset = false;
    let mut in_stig_info = false;
    let mut in_vuln = false;
    // Pending SID_NAME / VULN_ATTRIBUTE key, waiting for its data element.
    let mut pending_key: Option<String> = None;
    let mut current_element = String::new();
    let mut finding = Finding::default();

    // Open-element depth; Eof with elements still open means the blob
    // was truncated.
    let mut depth = 0usize;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                match local.as_str() {
                    "ASSET" => in_asset = true,
                    "STIG_INFO" => in_stig_info = true,
                    "VULN" => {
                        in_vuln = true;
                        finding = Finding::default();
                    }
                    _ => {}
                }
                current_element = local;
            }
            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ReportError::Parse {
                        reason: e.to_string(),
                    })?
                    .to_string();
                apply_text(
                    &mut doc,
                    &mut finding,
                    &mut pending_key,
                    &current_element,
                    in_asset,
                    in_stig_info,
                    in_vuln,
                    text,
                );
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                match local.as_str() {
                    "ASSET" => in_asset = false,
                    "STIG_INFO" => in_stig_info = false,
                    "SI_DATA" | "STIG_DATA" => pending_key = None,
                    "VULN" => {
                        in_vuln = false;
                        doc.findings.push(std::mem::take(&mut finding));
                    }
                    _ => {}
                }
                current_element.clear();
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    return Err(ReportError::Parse {
                        reason: format!("truncated checklist XML: {depth} unclosed element(s)"),
                    });
                }
                break;
            }
            Err(e) => {
                return Err(ReportError::Parse {
                    reason: format!("malformed checklist XML: {e}"),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

#[allow(clippy::too_many_arguments)]
fn apply_text(
    doc: &mut ChecklistDocument,
    finding: &mut Finding,
    pending_key: &mut Option<String>,
    element: &str,
    in_asset: bool,
    in_stig_info: bool,
    in_vuln: bool,
    text: String,
) {
    if in_asset {
        match element {
            "HOST_NAME" => doc.asset.host_name = Some(text),
            "HOST_IP" => doc.asset.host_ip = Some(text),
            "HOST_FQDN" => doc.asset.host_fqdn = Some(text),
            "ROLE" => doc.asset.role = Some(text),
            _ => {}
        }
        return;
    }

    if in_stig_info {
        match element {
            "SID_NAME" => *pending_key = Some(text),
            "SID_DATA" => {
                if let Some(key) = pending_key.take() {
                    match key.as_str() {
                        "version" => doc.info.version = Some(text),
                        "releaseinfo" => doc.info.release_info = Some(text),
                        "title" => doc.info.title = Some(text),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        return;
    }

    if in_vuln {
        match element {
            "VULN_ATTRIBUTE" => *pending_key = Some(text),
            "ATTRIBUTE_DATA" => {
                if let Some(key) = pending_key.take() {
                    match key.as_str() {
                        "Vuln_Num" => finding.vuln_num = Some(text),
                        "Severity" => finding.severity = Some(text),
                        "Rule_Title" => finding.rule_title = Some(text),
                        "Vuln_Discuss" => finding.discussion = Some(text),
                        "Check_Content" => finding.check_content = Some(text),
                        "Fix_Text" => finding.fix_text = Some(text),
                        "Severity_Override" => finding.severity_override = Some(text),
                        "Severity_Justification" => {
                            finding.severity_justification = Some(text);
                        }
                        "CCI_REF" => finding.cci_refs.push(text),
                        _ => {}
                    }
                }
            }
            "STATUS" => finding.status = Some(text),
            "COMMENTS" => finding.comments = Some(text),
            "FINDING_DETAILS" => finding.finding_details = Some(text),
            "SEVERITY_OVERRIDE" => finding.severity_override = Some(text),
            "SEVERITY_JUSTIFICATION" => finding.severity_justification = Some(text),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CKL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CHECKLIST>
  <ASSET>
    <ROLE>Member Server</ROLE>
    <HOST_NAME>web01</HOST_NAME>
    <HOST_IP>10.0.0.5</HOST_IP>
    <HOST_FQDN>web01.example.mil</HOST_FQDN>
  </ASSET>
  <STIGS>
    <iSTIG>
      <STIG_INFO>
        <SI_DATA><SID_NAME>version</SID_NAME><SID_DATA>2</SID_DATA></SI_DATA>
        <SI_DATA><SID_NAME>releaseinfo</SID_NAME><SID_DATA>Release: 12 Benchmark Date: 25 Oct 2019</SID_DATA></SI_DATA>
        <SI_DATA><SID_NAME>title</SID_NAME><SID_DATA>Windows Server 2016 Security Technical Implementation Guide</SID_DATA></SI_DATA>
      </STIG_INFO>
      <VULN>
        <STIG_DATA><VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE><ATTRIBUTE_DATA>V-1070</ATTRIBUTE_DATA></STIG_DATA>
        <STIG_DATA><VULN_ATTRIBUTE>Severity</VULN_ATTRIBUTE><ATTRIBUTE_DATA>medium</ATTRIBUTE_DATA></STIG_DATA>
        <STIG_DATA><VULN_ATTRIBUTE>Rule_Title</VULN_ATTRIBUTE><ATTRIBUTE_DATA>Session lock required</ATTRIBUTE_DATA></STIG_DATA>
        <STIG_DATA><VULN_ATTRIBUTE>CCI_REF</VULN_ATTRIBUTE><ATTRIBUTE_DATA>CCI-000056</ATTRIBUTE_DATA></STIG_DATA>
        <STIG_DATA><VULN_ATTRIBUTE>CCI_REF</VULN_ATTRIBUTE><ATTRIBUTE_DATA>CCI-000057</ATTRIBUTE_DATA></STIG_DATA>
        <STATUS>Open</STATUS>
        <FINDING_DETAILS>Screen lock disabled</FINDING_DETAILS>
        <COMMENTS>needs GPO change</COMMENTS>
      </VULN>
      <VULN>
        <STIG_DATA><VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE><ATTRIBUTE_DATA>V-2372</ATTRIBUTE_DATA></STIG_DATA>
        <STIG_DATA><VULN_ATTRIBUTE>Severity</VULN_ATTRIBUTE><ATTRIBUTE_DATA>high</ATTRIBUTE_DATA></STIG_DATA>
        <STATUS>NotAFinding</STATUS>
      </VULN>
    </iSTIG>
  </STIGS>
</CHECKLIST>"#;

    #[test]
    fn parses_asset_and_info() {
        let doc = parse_checklist(SAMPLE_CKL).unwrap();
        assert_eq!(doc.asset.host_name.as_deref(), Some("web01"));
        assert_eq!(doc.asset.host_fqdn.as_deref(), Some("web01.example.mil"));
        assert_eq!(doc.info.version.as_deref(), Some("2"));
        assert_eq!(
            doc.info.release_info.as_deref(),
            Some("Release: 12 Benchmark Date: 25 Oct 2019")
        );
        assert!(doc.info.title.as_deref().unwrap().starts_with("Windows"));
    }

    #[test]
    fn parses_findings_in_document_order() {
        let doc = parse_checklist(SAMPLE_CKL).unwrap();
        assert_eq!(doc.findings.len(), 2);

        let first = &doc.findings[0];
        assert_eq!(first.vuln_num.as_deref(), Some("V-1070"));
        assert_eq!(first.severity.as_deref(), Some("medium"));
        assert_eq!(first.status.as_deref(), Some("Open"));
        assert_eq!(first.cci_refs, vec!["CCI-000056", "CCI-000057"]);
        assert_eq!(first.comments.as_deref(), Some("needs GPO change"));

        let second = &doc.findings[1];
        assert_eq!(second.vuln_num.as_deref(), Some("V-2372"));
        assert!(second.cci_refs.is_empty());
        assert!(second.rule_title.is_none());
    }

    #[test]
    fn empty_blob_is_a_parse_failure() {
        let err = parse_checklist("   ").unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn malformed_xml_is_a_parse_failure() {
        let err = parse_checklist("<CHECKLIST><ASSET></CHECKLIST>").unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }

    #[test]
    fn truncated_xml_is_a_parse_failure() {
        let err = parse_checklist("<CHECKLIST><ASSET><HOST_NAME>web01</HOST_NAME>").unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }

    #[test]
    fn parses_severity_override_fields() {
        // The override can arrive as a STIG_DATA attribute pair or as a
        // bare element; both forms must land in the finding.
        let via_attributes = r#"<CHECKLIST><STIGS><iSTIG><VULN>
            <STIG_DATA><VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE><ATTRIBUTE_DATA>V-1</ATTRIBUTE_DATA></STIG_DATA>
            <STIG_DATA><VULN_ATTRIBUTE>Severity_Override</VULN_ATTRIBUTE><ATTRIBUTE_DATA>high</ATTRIBUTE_DATA></STIG_DATA>
            <STIG_DATA><VULN_ATTRIBUTE>Severity_Justification</VULN_ATTRIBUTE><ATTRIBUTE_DATA>exposed to internet</ATTRIBUTE_DATA></STIG_DATA>
            <STATUS>Open</STATUS>
        </VULN></iSTIG></STIGS></CHECKLIST>"#;
        let doc = parse_checklist(via_attributes).unwrap();
        assert_eq!(doc.findings[0].severity_override.as_deref(), Some("high"));
        assert_eq!(
            doc.findings[0].severity_justification.as_deref(),
            Some("exposed to internet")
        );

        let via_elements = r#"<CHECKLIST><STIGS><iSTIG><VULN>
            <STIG_DATA><VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE><ATTRIBUTE_DATA>V-1</ATTRIBUTE_DATA></STIG_DATA>
            <SEVERITY_OVERRIDE>low</SEVERITY_OVERRIDE>
            <SEVERITY_JUSTIFICATION>mitigated by firewall</SEVERITY_JUSTIFICATION>
        </VULN></iSTIG></STIGS></CHECKLIST>"#;
        let doc = parse_checklist(via_elements).unwrap();
        assert_eq!(doc.findings[0].severity_override.as_deref(), Some("low"));
        assert_eq!(
            doc.findings[0].severity_justification.as_deref(),
            Some("mitigated by firewall")
        );
    }
}
