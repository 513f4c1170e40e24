//! Nessus (ACAS) scan parsing and the patch-scan loader adapter.
//!
//! Parses a `.nessus` v2 export into per-plugin [`PatchScanRecord`]
//! drafts stamped with the owning system group. Rows are aggregated per
//! plugin id: `total` counts occurrences across the scan, `host_total`
//! counts distinct hosts.

use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::warn;
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};
use crate::models::PatchScanRecord;

/// One ReportItem occurrence before per-plugin aggregation.
#[derive(Debug, Clone, Default)]
struct ScanItem {
    hostname: String,
    operating_system: String,
    system_type: String,
    ip_address: String,
    credentialed: bool,
    plugin_id: String,
    plugin_name: String,
    family: String,
    severity: i32,
    description: String,
    publication_date: String,
    plugin_type: String,
    risk_factor: String,
    synopsis: String,
}

/// Load patch-scan records for one system group from a raw scan blob.
///
/// An empty or blank blob is a valid "no plugins found" outcome: it
/// yields zero records with a warning, not an error.
pub fn load_patch_data(system_group_id: &str, raw: &str) -> ReportResult<Vec<PatchScanRecord>> {
    if raw.trim().is_empty() {
        warn!(
            system_group_id = %system_group_id,
            "Scan blob is empty, producing no patch data"
        );
        return Ok(Vec::new());
    }

    let (report_name, items) = parse_scan(raw)?;

    if items.is_empty() {
        warn!(
            system_group_id = %system_group_id,
            report_name = %report_name,
            "Scan parsed but contained no plugin results"
        );
        return Ok(Vec::new());
    }

    Ok(aggregate(system_group_id, &report_name, items))
}

/// Fold scan items into one record per plugin id, preserving first-seen
/// order. Descriptive fields come from the first occurrence.
fn aggregate(
    system_group_id: &str,
    report_name: &str,
    items: Vec<ScanItem>,
) -> Vec<PatchScanRecord> {
    let now = Utc::now();
    let mut records: Vec<PatchScanRecord> = Vec::new();
    // (plugin index in `records`, hosts seen for that plugin)
    let mut hosts_per_plugin: Vec<Vec<String>> = Vec::new();

    for item in items {
        match records.iter().position(|r| r.plugin_id == item.plugin_id) {
            Some(idx) => {
                records[idx].total += 1;
                if !hosts_per_plugin[idx].contains(&item.hostname) {
                    hosts_per_plugin[idx].push(item.hostname);
                    records[idx].host_total += 1;
                }
            }
            None => {
                hosts_per_plugin.push(vec![item.hostname.clone()]);
                records.push(PatchScanRecord {
                    id: Uuid::new_v4(),
                    system_group_id: system_group_id.to_string(),
                    report_name: report_name.to_string(),
                    hostname: item.hostname,
                    operating_system: item.operating_system,
                    system_type: item.system_type,
                    ip_address: item.ip_address,
                    credentialed: item.credentialed,
                    plugin_id: item.plugin_id,
                    plugin_name: item.plugin_name,
                    family: item.family,
                    severity: item.severity,
                    host_total: 1,
                    total: 1,
                    description: item.description,
                    publication_date: item.publication_date,
                    plugin_type: item.plugin_type,
                    risk_factor: item.risk_factor,
                    synopsis: item.synopsis,
                    created: now,
                    updated_on: None,
                });
            }
        }
    }

    records
}

/// Parse the scan XML into the report name and raw per-item rows.
fn parse_scan(xml: &str) -> ReportResult<(String, Vec<ScanItem>)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut report_name = String::new();
    let mut items = Vec::new();

    // Per-host properties, carried onto each of the host's items.
    let mut host_name = String::new();
    let mut host_os = String::new();
    let mut host_type = String::new();
    let mut host_ip = String::new();
    let mut credentialed = false;

    let mut in_host_properties = false;
    let mut pending_tag: Option<String> = None;
    let mut current_item: Option<ScanItem> = None;
    let mut current_element = String::new();

    // Open-element depth; Eof with elements still open means the blob
    // was truncated.
    let mut depth = 0usize;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            // Self-closing ReportItems carry everything in attributes;
            // there is no End event to flush them, so push here.
            Ok(Event::Empty(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                if local == "ReportItem" {
                    let item = scan_item_from_attributes(
                        e,
                        &host_name,
                        &host_os,
                        &host_type,
                        &host_ip,
                        credentialed,
                    );
                    if item.plugin_id.is_empty() {
                        warn!(host = %host_name, "ReportItem without pluginID skipped");
                    } else {
                        items.push(item);
                    }
                } else if local == "tag" && in_host_properties {
                    // Self-closing tag has no text; drop any pending key.
                    pending_tag = None;
                }
            }
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                match local.as_str() {
                    "Report" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().into_inner() == b"name" {
                                report_name = String::from_utf8_lossy(&attr.value).to_string();
                            }
                        }
                    }
                    "ReportHost" => {
                        host_name.clear();
                        host_os.clear();
                        host_type.clear();
                        host_ip.clear();
                        credentialed = false;
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().into_inner() == b"name" {
                                host_name = String::from_utf8_lossy(&attr.value).to_string();
                            }
                        }
                    }
                    "HostProperties" => in_host_properties = true,
                    "tag" if in_host_properties => {
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().into_inner() == b"name" {
                                pending_tag = Some(String::from_utf8_lossy(&attr.value).to_string());
                            }
                        }
                    }
                    "ReportItem" => {
                        current_item = Some(scan_item_from_attributes(
                            e,
                            &host_name,
                            &host_os,
                            &host_type,
                            &host_ip,
                            credentialed,
                        ));
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

                if in_host_properties && current_element == "tag" {
                    if let Some(tag) = pending_tag.take() {
                        match tag.as_str() {
                            "operating-system" => host_os = text,
                            "system-type" => host_type = text,
                            "host-ip" => host_ip = text,
                            "Credentialed_Scan" => {
                                credentialed = text.eq_ignore_ascii_case("true");
                            }
                            _ => {}
                        }
                    }
                } else if let Some(item) = current_item.as_mut() {
                    match current_element.as_str() {
                        "description" => item.description = text,
                        "synopsis" => item.synopsis = text,
                        "risk_factor" => item.risk_factor = text,
                        "plugin_type" => item.plugin_type = text,
                        "plugin_publication_date" => item.publication_date = text,
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                match local.as_str() {
                    "HostProperties" => in_host_properties = false,
                    "ReportItem" => {
                        if let Some(item) = current_item.take() {
                            if item.plugin_id.is_empty() {
                                warn!(host = %host_name, "ReportItem without pluginID skipped");
                            } else {
                                items.push(item);
                            }
                        }
                    }
                    _ => {}
                }
                current_element.clear();
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    return Err(ReportError::Parse {
                        reason: format!("truncated scan XML: {depth} unclosed element(s)"),
                    });
                }
                break;
            }
            Err(e) => {
                return Err(ReportError::Parse {
                    reason: format!("malformed scan XML: {e}"),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((report_name, items))
}

/// Build a scan item from a ReportItem's attributes plus the enclosing
/// host's properties.
fn scan_item_from_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    host_name: &str,
    host_os: &str,
    host_type: &str,
    host_ip: &str,
    credentialed: bool,
) -> ScanItem {
    let mut item = ScanItem {
        hostname: host_name.to_string(),
        operating_system: host_os.to_string(),
        system_type: host_type.to_string(),
        ip_address: host_ip.to_string(),
        credentialed,
        ..ScanItem::default()
    };
    for attr in e.attributes().flatten() {
        let key = attr.key.local_name().into_inner();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match key {
            b"pluginID" => item.plugin_id = value,
            b"pluginName" => item.plugin_name = value,
            b"pluginFamily" => item.family = value,
            b"severity" => item.severity = value.parse::<i32>().unwrap_or(0),
            _ => {}
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_NESSUS: &str = r#"<?xml version="1.0"?>
<NessusClientData_v2>
  <Report name="Weekly scan">
    <ReportHost name="host-a">
      <HostProperties>
        <tag name="operating-system">Windows Server 2016</tag>
        <tag name="system-type">general-purpose</tag>
        <tag name="host-ip">10.0.0.5</tag>
        <tag name="Credentialed_Scan">true</tag>
      </HostProperties>
      <ReportItem pluginID="11111" pluginName="SMB check" pluginFamily="Windows" severity="3">
        <description>SMB signing not required</description>
        <synopsis>Signing disabled</synopsis>
        <risk_factor>High</risk_factor>
        <plugin_type>remote</plugin_type>
        <plugin_publication_date>2019/01/15</plugin_publication_date>
      </ReportItem>
      <ReportItem pluginID="22222" pluginName="TLS check" pluginFamily="General" severity="2">
        <risk_factor>Medium</risk_factor>
      </ReportItem>
    </ReportHost>
    <ReportHost name="host-b">
      <HostProperties>
        <tag name="operating-system">Windows 10</tag>
        <tag name="host-ip">10.0.0.6</tag>
        <tag name="Credentialed_Scan">false</tag>
      </HostProperties>
      <ReportItem pluginID="11111" pluginName="SMB check" pluginFamily="Windows" severity="3"/>
    </ReportHost>
  </Report>
</NessusClientData_v2>"#;

    #[test]
    fn aggregates_per_plugin() {
        let records = load_patch_data("sg-1", SAMPLE_NESSUS).unwrap();
        assert_eq!(records.len(), 2);

        let smb = records.iter().find(|r| r.plugin_id == "11111").unwrap();
        assert_eq!(smb.total, 2);
        assert_eq!(smb.host_total, 2);
        assert_eq!(smb.severity, 3);
        assert_eq!(smb.severity_name(), "High");
        assert_eq!(smb.report_name, "Weekly scan");
        assert_eq!(smb.system_group_id, "sg-1");
        // Descriptive fields from the first occurrence.
        assert_eq!(smb.hostname, "host-a");
        assert_eq!(smb.operating_system, "Windows Server 2016");
        assert!(smb.credentialed);
        assert_eq!(smb.publication_date, "2019/01/15");

        let tls = records.iter().find(|r| r.plugin_id == "22222").unwrap();
        assert_eq!(tls.total, 1);
        assert_eq!(tls.host_total, 1);
    }

    #[test]
    fn order_is_first_seen() {
        let records = load_patch_data("sg-1", SAMPLE_NESSUS).unwrap();
        assert_eq!(records[0].plugin_id, "11111");
        assert_eq!(records[1].plugin_id, "22222");
    }

    #[test]
    fn empty_blob_yields_no_records() {
        let records = load_patch_data("sg-1", "   ").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn scan_without_items_yields_no_records() {
        let xml = r#"<NessusClientData_v2><Report name="empty"></Report></NessusClientData_v2>"#;
        let records = load_patch_data("sg-1", xml).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_scan_is_a_parse_failure() {
        let err = load_patch_data("sg-1", "<NessusClientData_v2><Report>").unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }

    #[test]
    fn truncated_scan_is_a_parse_failure() {
        // Cut off mid-document, after well-formed items.
        let idx = SAMPLE_NESSUS.find("<ReportHost name=\"host-b\">").unwrap();
        let err = load_patch_data("sg-1", &SAMPLE_NESSUS[..idx]).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }
}
