//! Postgres-backed store implementations.
//!
//! Runtime queries over a shared `PgPool`; schema lives in
//! `migrations/`. Each write is a single-row statement, so atomicity is
//! scoped to one record.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ReportResult;
use crate::models::{
    Artifact, NaturalKey, PatchScanRecord, SystemGroup, VulnerabilityReportRecord,
};
use crate::store::{ArtifactStore, PatchScanStore, ReportStore, SystemGroupStore};

/// Vulnerability report rows in Postgres.
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn find_by_natural_key(
        &self,
        key: &NaturalKey,
    ) -> ReportResult<Option<VulnerabilityReportRecord>> {
        let record = sqlx::query_as(
            r"
            SELECT * FROM vulnerability_reports
            WHERE system_group_id = $1 AND artifact_id = $2 AND vuln_id = $3
            ",
        )
        .bind(&key.system_group_id)
        .bind(&key.artifact_id)
        .bind(&key.vuln_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_by_id(
        &self,
        system_group_id: &str,
        id: Uuid,
    ) -> ReportResult<Option<VulnerabilityReportRecord>> {
        let record = sqlx::query_as(
            r"
            SELECT * FROM vulnerability_reports
            WHERE system_group_id = $1 AND id = $2
            ",
        )
        .bind(system_group_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn insert(&self, record: &VulnerabilityReportRecord) -> ReportResult<()> {
        sqlx::query(
            r"
            INSERT INTO vulnerability_reports (
                id, system_group_id, artifact_id, vuln_id,
                hostname, checklist_version, checklist_release, checklist_type,
                severity, severity_override, severity_justification, status,
                comments, details, check_content, discussion, fix_text, rule_title,
                cci_list, created, created_by, updated_by, updated_on
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            ",
        )
        .bind(record.id)
        .bind(&record.system_group_id)
        .bind(&record.artifact_id)
        .bind(&record.vuln_id)
        .bind(&record.hostname)
        .bind(&record.checklist_version)
        .bind(&record.checklist_release)
        .bind(&record.checklist_type)
        .bind(&record.severity)
        .bind(&record.severity_override)
        .bind(&record.severity_justification)
        .bind(&record.status)
        .bind(&record.comments)
        .bind(&record.details)
        .bind(&record.check_content)
        .bind(&record.discussion)
        .bind(&record.fix_text)
        .bind(&record.rule_title)
        .bind(&record.cci_list)
        .bind(record.created)
        .bind(&record.created_by)
        .bind(&record.updated_by)
        .bind(record.updated_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace(&self, record: &VulnerabilityReportRecord) -> ReportResult<()> {
        sqlx::query(
            r"
            UPDATE vulnerability_reports SET
                system_group_id = $2, artifact_id = $3, vuln_id = $4,
                hostname = $5, checklist_version = $6, checklist_release = $7,
                checklist_type = $8, severity = $9, severity_override = $10,
                severity_justification = $11, status = $12, comments = $13,
                details = $14, check_content = $15, discussion = $16,
                fix_text = $17, rule_title = $18, cci_list = $19,
                created = $20, created_by = $21, updated_by = $22, updated_on = $23
            WHERE id = $1
            ",
        )
        .bind(record.id)
        .bind(&record.system_group_id)
        .bind(&record.artifact_id)
        .bind(&record.vuln_id)
        .bind(&record.hostname)
        .bind(&record.checklist_version)
        .bind(&record.checklist_release)
        .bind(&record.checklist_type)
        .bind(&record.severity)
        .bind(&record.severity_override)
        .bind(&record.severity_justification)
        .bind(&record.status)
        .bind(&record.comments)
        .bind(&record.details)
        .bind(&record.check_content)
        .bind(&record.discussion)
        .bind(&record.fix_text)
        .bind(&record.rule_title)
        .bind(&record.cci_list)
        .bind(record.created)
        .bind(&record.created_by)
        .bind(&record.updated_by)
        .bind(record.updated_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_artifact(&self, artifact_id: &str) -> ReportResult<u64> {
        let result = sqlx::query("DELETE FROM vulnerability_reports WHERE artifact_id = $1")
            .bind(artifact_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_system_group(&self, system_group_id: &str) -> ReportResult<u64> {
        let result = sqlx::query("DELETE FROM vulnerability_reports WHERE system_group_id = $1")
            .bind(system_group_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_by_artifact(
        &self,
        artifact_id: &str,
    ) -> ReportResult<Vec<VulnerabilityReportRecord>> {
        let records = sqlx::query_as(
            "SELECT * FROM vulnerability_reports WHERE artifact_id = $1 ORDER BY vuln_id",
        )
        .bind(artifact_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// Patch-scan rows in Postgres.
#[derive(Clone)]
pub struct PgPatchScanStore {
    pool: PgPool,
}

impl PgPatchScanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatchScanStore for PgPatchScanStore {
    async fn insert(&self, record: &PatchScanRecord) -> ReportResult<()> {
        sqlx::query(
            r"
            INSERT INTO patch_scans (
                id, system_group_id, report_name, hostname, operating_system,
                system_type, ip_address, credentialed, plugin_id, plugin_name,
                family, severity, host_total, total, description,
                publication_date, plugin_type, risk_factor, synopsis,
                created, updated_on
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21)
            ",
        )
        .bind(record.id)
        .bind(&record.system_group_id)
        .bind(&record.report_name)
        .bind(&record.hostname)
        .bind(&record.operating_system)
        .bind(&record.system_type)
        .bind(&record.ip_address)
        .bind(record.credentialed)
        .bind(&record.plugin_id)
        .bind(&record.plugin_name)
        .bind(&record.family)
        .bind(record.severity)
        .bind(record.host_total)
        .bind(record.total)
        .bind(&record.description)
        .bind(&record.publication_date)
        .bind(&record.plugin_type)
        .bind(&record.risk_factor)
        .bind(&record.synopsis)
        .bind(record.created)
        .bind(record.updated_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_system_group(&self, system_group_id: &str) -> ReportResult<u64> {
        let result = sqlx::query("DELETE FROM patch_scans WHERE system_group_id = $1")
            .bind(system_group_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_by_system_group(
        &self,
        system_group_id: &str,
    ) -> ReportResult<Vec<PatchScanRecord>> {
        let records =
            sqlx::query_as("SELECT * FROM patch_scans WHERE system_group_id = $1 ORDER BY plugin_id")
                .bind(system_group_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(records)
    }
}

/// Read-only view over upstream system groups.
#[derive(Clone)]
pub struct PgSystemGroupStore {
    pool: PgPool,
}

impl PgSystemGroupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemGroupStore for PgSystemGroupStore {
    async fn get(&self, id: &str) -> ReportResult<Option<SystemGroup>> {
        let group = sqlx::query_as("SELECT * FROM system_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    async fn list_all(&self) -> ReportResult<Vec<SystemGroup>> {
        let groups = sqlx::query_as("SELECT * FROM system_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }
}

/// Read-only view over upstream checklist artifacts.
#[derive(Clone)]
pub struct PgArtifactStore {
    pool: PgPool,
}

impl PgArtifactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtifactStore for PgArtifactStore {
    async fn get(&self, id: &str) -> ReportResult<Option<Artifact>> {
        let artifact = sqlx::query_as("SELECT * FROM artifacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(artifact)
    }

    async fn list_by_system_group(&self, system_group_id: &str) -> ReportResult<Vec<Artifact>> {
        let artifacts =
            sqlx::query_as("SELECT * FROM artifacts WHERE system_group_id = $1 ORDER BY id")
                .bind(system_group_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(artifacts)
    }
}
