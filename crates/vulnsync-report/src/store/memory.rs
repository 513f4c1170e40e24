//! In-memory store used by tests and local one-shot runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ReportResult;
use crate::models::{
    Artifact, NaturalKey, PatchScanRecord, SystemGroup, VulnerabilityReportRecord,
};
use crate::store::{ArtifactStore, PatchScanStore, ReportStore, SystemGroupStore};

/// One store backing all four seams, so a single instance can serve as
/// projection and upstream snapshot in tests.
#[derive(Default)]
pub struct MemoryStore {
    reports: RwLock<Vec<VulnerabilityReportRecord>>,
    scans: RwLock<Vec<PatchScanRecord>>,
    systems: RwLock<HashMap<String, SystemGroup>>,
    artifacts: RwLock<HashMap<String, Artifact>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an upstream system group snapshot.
    pub async fn put_system_group(&self, group: SystemGroup) {
        self.systems.write().await.insert(group.id.clone(), group);
    }

    /// Seed an upstream checklist artifact.
    pub async fn put_artifact(&self, artifact: Artifact) {
        self.artifacts
            .write()
            .await
            .insert(artifact.id.clone(), artifact);
    }

    /// Total report rows, across all groups.
    pub async fn report_count(&self) -> usize {
        self.reports.read().await.len()
    }

    /// Total scan rows, across all groups.
    pub async fn scan_count(&self) -> usize {
        self.scans.read().await.len()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn find_by_natural_key(
        &self,
        key: &NaturalKey,
    ) -> ReportResult<Option<VulnerabilityReportRecord>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .find(|r| &r.natural_key() == key)
            .cloned())
    }

    async fn find_by_id(
        &self,
        system_group_id: &str,
        id: Uuid,
    ) -> ReportResult<Option<VulnerabilityReportRecord>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .find(|r| r.system_group_id == system_group_id && r.id == id)
            .cloned())
    }

    async fn insert(&self, record: &VulnerabilityReportRecord) -> ReportResult<()> {
        self.reports.write().await.push(record.clone());
        Ok(())
    }

    async fn replace(&self, record: &VulnerabilityReportRecord) -> ReportResult<()> {
        let mut reports = self.reports.write().await;
        if let Some(existing) = reports.iter_mut().find(|r| r.id == record.id) {
            *existing = record.clone();
        }
        Ok(())
    }

    async fn delete_by_artifact(&self, artifact_id: &str) -> ReportResult<u64> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|r| r.artifact_id != artifact_id);
        Ok((before - reports.len()) as u64)
    }

    async fn delete_by_system_group(&self, system_group_id: &str) -> ReportResult<u64> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|r| r.system_group_id != system_group_id);
        Ok((before - reports.len()) as u64)
    }

    async fn list_by_artifact(
        &self,
        artifact_id: &str,
    ) -> ReportResult<Vec<VulnerabilityReportRecord>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .filter(|r| r.artifact_id == artifact_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PatchScanStore for MemoryStore {
    async fn insert(&self, record: &PatchScanRecord) -> ReportResult<()> {
        self.scans.write().await.push(record.clone());
        Ok(())
    }

    async fn delete_by_system_group(&self, system_group_id: &str) -> ReportResult<u64> {
        let mut scans = self.scans.write().await;
        let before = scans.len();
        scans.retain(|s| s.system_group_id != system_group_id);
        Ok((before - scans.len()) as u64)
    }

    async fn list_by_system_group(
        &self,
        system_group_id: &str,
    ) -> ReportResult<Vec<PatchScanRecord>> {
        Ok(self
            .scans
            .read()
            .await
            .iter()
            .filter(|s| s.system_group_id == system_group_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SystemGroupStore for MemoryStore {
    async fn get(&self, id: &str) -> ReportResult<Option<SystemGroup>> {
        Ok(self.systems.read().await.get(id).cloned())
    }

    async fn list_all(&self) -> ReportResult<Vec<SystemGroup>> {
        let mut groups: Vec<SystemGroup> = self.systems.read().await.values().cloned().collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(groups)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn get(&self, id: &str) -> ReportResult<Option<Artifact>> {
        Ok(self.artifacts.read().await.get(id).cloned())
    }

    async fn list_by_system_group(&self, system_group_id: &str) -> ReportResult<Vec<Artifact>> {
        let mut artifacts: Vec<Artifact> = self
            .artifacts
            .read()
            .await
            .values()
            .filter(|a| a.system_group_id == system_group_id)
            .cloned()
            .collect();
        artifacts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(artifacts)
    }
}
