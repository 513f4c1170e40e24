//! Reconciliation engine: the orchestration core.
//!
//! One operation per inbound event category. Each operation is atomic
//! at the level of one source document, stateless between invocations,
//! and safe to replay: checklists reconcile via per-finding upsert,
//! scans via delete-then-replace.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use vulnsync_events::events::FindingUpdated;

use crate::checklist::{self, ChecklistDocument};
use crate::error::ReportResult;
use crate::extract;
use crate::identity::{self, IdentityMatch};
use crate::models::{NaturalKey, SystemGroup, VulnerabilityReportRecord};
use crate::nessus;
use crate::store::{ArtifactStore, PatchScanStore, ReportStore, SystemGroupStore};

/// Outcome of a single-record upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(Uuid),
    Updated(Uuid),
}

impl UpsertOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

/// Outcome of a delete operation. Zero matching rows is a valid,
/// non-fatal result; the triggering event is still handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(u64),
    NothingToDelete,
}

/// Per-checklist bulk outcome. Failures are counted, not propagated:
/// one finding's failure never aborts its siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// Findings skipped for missing vulnerability numbers.
    pub skipped: usize,
    /// Findings whose persistence failed.
    pub failed: usize,
}

impl BulkOutcome {
    pub fn upserted(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Summary of a full-corpus refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub system_groups: usize,
    pub checklists: usize,
    pub finding_rows: usize,
    pub scan_rows: usize,
    pub failures: usize,
}

/// Which portions of the corpus a refresh touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshPortion {
    Checklists,
    Scans,
    Both,
}

/// The reconciliation engine. Holds no state of its own beyond the
/// store handles passed in at construction; all projection state lives
/// behind the stores, so any operation can be replayed after a crash.
pub struct ReconciliationEngine {
    reports: Arc<dyn ReportStore>,
    scans: Arc<dyn PatchScanStore>,
    systems: Arc<dyn SystemGroupStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl ReconciliationEngine {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        scans: Arc<dyn PatchScanStore>,
        systems: Arc<dyn SystemGroupStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            reports,
            scans,
            systems,
            artifacts,
        }
    }

    /// Insert or update one report row.
    ///
    /// On update the existing surrogate id and `created`/`created_by`
    /// are preserved; everything else comes from the draft. Replaying
    /// the same draft converges to the same row content.
    pub async fn upsert_finding(
        &self,
        draft: VulnerabilityReportRecord,
    ) -> ReportResult<UpsertOutcome> {
        let key = draft.natural_key();
        let advisory_id = (!draft.id.is_nil()).then_some(draft.id);

        match identity::resolve(self.reports.as_ref(), &key, advisory_id).await? {
            IdentityMatch::Found(existing) => {
                let mut record = draft;
                record.id = existing.id;
                record.created = existing.created;
                record.created_by = existing.created_by.clone();
                self.reports.replace(&record).await?;
                debug!(key = %key, id = %record.id, "Replaced report row");
                Ok(UpsertOutcome::Updated(record.id))
            }
            IdentityMatch::NotFound => {
                let mut record = draft;
                // A claimed id that matched nothing is advisory only;
                // assign a fresh one rather than forcing an update.
                record.id = Uuid::new_v4();
                record.created = Utc::now();
                self.reports.insert(&record).await?;
                debug!(key = %key, id = %record.id, "Inserted report row");
                Ok(UpsertOutcome::Inserted(record.id))
            }
        }
    }

    /// Materialize every finding of one checklist snapshot.
    ///
    /// Used for both "created" and "updated" events; the per-record
    /// upsert tolerates redelivery either way. Rows whose findings
    /// disappeared from this revision are left in place.
    #[instrument(skip(self, doc), fields(system_group_id = %system_group_id, artifact_id = %artifact_id))]
    pub async fn bulk_replace_for_checklist(
        &self,
        system_group_id: &str,
        artifact_id: &str,
        doc: &ChecklistDocument,
    ) -> ReportResult<BulkOutcome> {
        let extraction = extract::extract_all(doc, system_group_id, artifact_id);
        let mut outcome = BulkOutcome {
            skipped: extraction.skipped,
            ..BulkOutcome::default()
        };

        for draft in extraction.drafts {
            let key = draft.natural_key();
            match self.upsert_finding(draft).await {
                Ok(UpsertOutcome::Inserted(_)) => outcome.inserted += 1,
                Ok(UpsertOutcome::Updated(_)) => outcome.updated += 1,
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to persist finding");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Checklist reconciled"
        );
        Ok(outcome)
    }

    /// Fetch a checklist by artifact id, parse it, and reconcile it.
    ///
    /// Returns `Ok(None)` when no artifact exists for the id; that is a
    /// handled outcome, not an error.
    #[instrument(skip(self))]
    pub async fn sync_checklist(&self, artifact_id: &str) -> ReportResult<Option<BulkOutcome>> {
        let Some(artifact) = self.artifacts.get(artifact_id).await? else {
            warn!(artifact_id = %artifact_id, "No checklist found for artifact id");
            return Ok(None);
        };

        let doc = checklist::parse_checklist(&artifact.raw_checklist)?;
        let outcome = self
            .bulk_replace_for_checklist(&artifact.system_group_id, artifact_id, &doc)
            .await?;
        Ok(Some(outcome))
    }

    /// Apply a single-finding edit.
    ///
    /// When a row exists, the event's fields overlay the current row
    /// content. When none exists the edit becomes a new row stamped
    /// with the event's processing time.
    #[instrument(skip(self, event), fields(
        system_group_id = %event.system_group_id,
        artifact_id = %event.artifact_id,
        vuln_id = %event.vuln_id
    ))]
    pub async fn apply_finding_update(&self, event: &FindingUpdated) -> ReportResult<UpsertOutcome> {
        let key = NaturalKey::new(
            event.system_group_id.clone(),
            event.artifact_id.clone(),
            event.vuln_id.clone(),
        );
        let now = Utc::now();

        let mut record = match identity::resolve(self.reports.as_ref(), &key, None).await? {
            IdentityMatch::Found(existing) => *existing,
            IdentityMatch::NotFound => VulnerabilityReportRecord {
                id: Uuid::nil(),
                system_group_id: event.system_group_id.clone(),
                artifact_id: event.artifact_id.clone(),
                vuln_id: event.vuln_id.clone(),
                hostname: extract::UNKNOWN_HOSTNAME.to_string(),
                checklist_version: String::new(),
                checklist_release: String::new(),
                checklist_type: String::new(),
                severity: String::new(),
                severity_override: String::new(),
                severity_justification: String::new(),
                status: String::new(),
                comments: String::new(),
                details: String::new(),
                check_content: String::new(),
                discussion: String::new(),
                fix_text: String::new(),
                rule_title: String::new(),
                cci_list: Vec::new(),
                created: now,
                created_by: Some(event.updated_by.clone()),
                updated_by: None,
                updated_on: None,
            },
        };

        if let Some(status) = &event.status {
            record.status = status.clone();
        }
        if let Some(comments) = &event.comments {
            record.comments = comments.clone();
        }
        if let Some(details) = &event.details {
            record.details = details.clone();
        }
        if let Some(severity_override) = &event.severity_override {
            record.severity_override = severity_override.clone();
        }
        if let Some(justification) = &event.severity_justification {
            record.severity_justification = justification.clone();
        }
        record.updated_by = Some(event.updated_by.clone());
        record.updated_on = Some(now);

        self.upsert_finding(record).await
    }

    /// Delete all patch-scan and report rows for one system group.
    #[instrument(skip(self))]
    pub async fn delete_for_system(&self, system_group_id: &str) -> ReportResult<DeleteOutcome> {
        let scan_rows = self.scans.delete_by_system_group(system_group_id).await?;
        let report_rows = self.reports.delete_by_system_group(system_group_id).await?;
        let total = scan_rows + report_rows;

        if total == 0 {
            warn!(
                system_group_id = %system_group_id,
                "No report data to delete for system group, maybe there is no data yet"
            );
            return Ok(DeleteOutcome::NothingToDelete);
        }

        info!(
            system_group_id = %system_group_id,
            scan_rows = scan_rows,
            report_rows = report_rows,
            "Deleted system group report data"
        );
        Ok(DeleteOutcome::Deleted(total))
    }

    /// Delete all report rows for one checklist. Scan data is untouched;
    /// it is keyed by system, not by checklist.
    #[instrument(skip(self))]
    pub async fn delete_for_checklist(&self, artifact_id: &str) -> ReportResult<DeleteOutcome> {
        let rows = self.reports.delete_by_artifact(artifact_id).await?;

        if rows == 0 {
            warn!(artifact_id = %artifact_id, "No report rows to delete for checklist");
            return Ok(DeleteOutcome::NothingToDelete);
        }

        info!(artifact_id = %artifact_id, rows = rows, "Deleted checklist report rows");
        Ok(DeleteOutcome::Deleted(rows))
    }

    /// Replace the patch-scan generation for one system group:
    /// delete everything, then insert the freshly parsed set. Plugin
    /// ids are not stable enough across vendor exports to merge.
    #[instrument(skip(self, group), fields(system_group_id = %group.id))]
    pub async fn refresh_patch_scan_for_system(&self, group: &SystemGroup) -> ReportResult<usize> {
        // Parse before touching the store; a bad blob must leave the
        // prior generation intact.
        let raw = group.raw_nessus_file.as_deref().unwrap_or("");
        let records = nessus::load_patch_data(&group.id, raw)?;

        let deleted = self.scans.delete_by_system_group(&group.id).await?;
        debug!(deleted = deleted, "Cleared prior scan generation");

        for record in &records {
            self.scans.insert(record).await?;
        }

        info!(rows = records.len(), "Patch scan data replaced");
        Ok(records.len())
    }

    /// Fetch a system group by id and replace its scan generation.
    ///
    /// Returns `Ok(None)` when the system group does not exist.
    #[instrument(skip(self))]
    pub async fn sync_patch_scan(&self, system_group_id: &str) -> ReportResult<Option<usize>> {
        let Some(group) = self.systems.get(system_group_id).await? else {
            warn!(system_group_id = %system_group_id, "No system group found for patch scan update");
            return Ok(None);
        };

        if group.raw_nessus_file.as_deref().unwrap_or("").trim().is_empty() {
            warn!(system_group_id = %system_group_id, "System group has no scan data");
            return Ok(Some(0));
        }

        let rows = self.refresh_patch_scan_for_system(&group).await?;
        Ok(Some(rows))
    }

    /// Rebuild both projections for every system group.
    pub async fn refresh_all(&self) -> ReportResult<RefreshSummary> {
        self.refresh(RefreshPortion::Both).await
    }

    /// Rebuild the vulnerability report projection for every checklist.
    pub async fn refresh_vulnerability_data(&self) -> ReportResult<RefreshSummary> {
        self.refresh(RefreshPortion::Checklists).await
    }

    /// Rebuild the patch-scan projection for every system group with a
    /// scan on file.
    pub async fn refresh_patch_scan_data(&self) -> ReportResult<RefreshSummary> {
        self.refresh(RefreshPortion::Scans).await
    }

    /// Full-corpus refresh. Scans are delete-then-replace per group;
    /// checklists go through per-finding upsert, which keeps the pass
    /// idempotent and safe to run alongside incremental updates.
    #[instrument(skip(self))]
    async fn refresh(&self, portion: RefreshPortion) -> ReportResult<RefreshSummary> {
        let groups = self.systems.list_all().await?;
        let mut summary = RefreshSummary {
            system_groups: groups.len(),
            ..RefreshSummary::default()
        };

        for group in &groups {
            if matches!(portion, RefreshPortion::Scans | RefreshPortion::Both) {
                self.refresh_group_scans(group, &mut summary).await;
            }
            if matches!(portion, RefreshPortion::Checklists | RefreshPortion::Both) {
                self.refresh_group_checklists(group, &mut summary).await;
            }
        }

        info!(
            system_groups = summary.system_groups,
            checklists = summary.checklists,
            finding_rows = summary.finding_rows,
            scan_rows = summary.scan_rows,
            failures = summary.failures,
            "Refresh complete"
        );
        Ok(summary)
    }

    async fn refresh_group_scans(&self, group: &SystemGroup, summary: &mut RefreshSummary) {
        if group.raw_nessus_file.as_deref().unwrap_or("").trim().is_empty() {
            debug!(system_group_id = %group.id, "No scan data on file, skipping");
            return;
        }

        match self.refresh_patch_scan_for_system(group).await {
            Ok(rows) => summary.scan_rows += rows,
            Err(e) if e.is_recoverable() => {
                warn!(system_group_id = %group.id, error = %e, "Scan refresh skipped");
                summary.failures += 1;
            }
            Err(e) => {
                error!(system_group_id = %group.id, error = %e, "Scan refresh failed");
                summary.failures += 1;
            }
        }
    }

    async fn refresh_group_checklists(&self, group: &SystemGroup, summary: &mut RefreshSummary) {
        let artifacts = match self.artifacts.list_by_system_group(&group.id).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                error!(system_group_id = %group.id, error = %e, "Could not enumerate checklists");
                summary.failures += 1;
                return;
            }
        };

        for artifact in artifacts {
            summary.checklists += 1;
            let doc = match checklist::parse_checklist(&artifact.raw_checklist) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(artifact_id = %artifact.id, error = %e, "Unparseable checklist skipped");
                    summary.failures += 1;
                    continue;
                }
            };

            match self
                .bulk_replace_for_checklist(&group.id, &artifact.id, &doc)
                .await
            {
                Ok(outcome) => {
                    summary.finding_rows += outcome.upserted();
                    summary.failures += outcome.failed;
                }
                Err(e) => {
                    error!(artifact_id = %artifact.id, error = %e, "Checklist reconciliation failed");
                    summary.failures += 1;
                }
            }
        }
    }
}

// Engine behavior is covered by the scenario tests in
// tests/engine_scenarios.rs against the in-memory store.
