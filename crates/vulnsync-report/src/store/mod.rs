//! Persistence seams for the report projection.
//!
//! The reconciliation engine only sees these traits. Two
//! implementations ship: [`postgres`] over a `PgPool` and [`memory`]
//! for tests and local runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ReportResult;
use crate::models::{
    Artifact, NaturalKey, PatchScanRecord, SystemGroup, VulnerabilityReportRecord,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgArtifactStore, PgPatchScanStore, PgReportStore, PgSystemGroupStore};

/// Projection store for vulnerability report rows.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Exact match on the natural key.
    async fn find_by_natural_key(
        &self,
        key: &NaturalKey,
    ) -> ReportResult<Option<VulnerabilityReportRecord>>;

    /// Fallback match on (system group, surrogate id) for callers that
    /// only hold an id from a prior read.
    async fn find_by_id(
        &self,
        system_group_id: &str,
        id: Uuid,
    ) -> ReportResult<Option<VulnerabilityReportRecord>>;

    async fn insert(&self, record: &VulnerabilityReportRecord) -> ReportResult<()>;

    /// Replace the row with the given id wholesale.
    async fn replace(&self, record: &VulnerabilityReportRecord) -> ReportResult<()>;

    /// Delete every row for one checklist. Returns the rows removed.
    async fn delete_by_artifact(&self, artifact_id: &str) -> ReportResult<u64>;

    /// Delete every row for one system group. Returns the rows removed.
    async fn delete_by_system_group(&self, system_group_id: &str) -> ReportResult<u64>;

    async fn list_by_artifact(
        &self,
        artifact_id: &str,
    ) -> ReportResult<Vec<VulnerabilityReportRecord>>;
}

/// Projection store for patch-scan rows.
#[async_trait]
pub trait PatchScanStore: Send + Sync {
    async fn insert(&self, record: &PatchScanRecord) -> ReportResult<()>;

    /// Delete the whole generation for a system group. Returns the rows
    /// removed.
    async fn delete_by_system_group(&self, system_group_id: &str) -> ReportResult<u64>;

    async fn list_by_system_group(
        &self,
        system_group_id: &str,
    ) -> ReportResult<Vec<PatchScanRecord>>;
}

/// Read-only access to upstream system groups.
#[async_trait]
pub trait SystemGroupStore: Send + Sync {
    async fn get(&self, id: &str) -> ReportResult<Option<SystemGroup>>;

    async fn list_all(&self) -> ReportResult<Vec<SystemGroup>>;
}

/// Read-only access to upstream checklist artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, id: &str) -> ReportResult<Option<Artifact>>;

    async fn list_by_system_group(&self, system_group_id: &str) -> ReportResult<Vec<Artifact>>;
}
