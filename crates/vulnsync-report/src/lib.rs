//! # vulnsync-report
//!
//! Keeps the denormalized vulnerability report projection consistent
//! with its two upstream sources of truth: security checklist documents
//! and vendor patch-scan exports.
//!
//! The flow: inbound event -> [`router::EventRouter`] ->
//! [`engine::ReconciliationEngine`] -> extraction
//! ([`extract`], [`nessus`]) -> identity resolution ([`identity`]) ->
//! persistence ([`store`]).
//!
//! The engine is stateless between invocations; every operation is a
//! one-shot transition that can be replayed safely after a crash.

pub mod checklist;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod identity;
pub mod migrations;
pub mod models;
pub mod nessus;
pub mod router;
pub mod sanitize;
pub mod store;

pub use config::{ConfigError, WorkerConfig};
pub use engine::{
    BulkOutcome, DeleteOutcome, ReconciliationEngine, RefreshSummary, UpsertOutcome,
};
pub use error::{ReportError, ReportResult};
pub use identity::IdentityMatch;
pub use models::{
    Artifact, NaturalKey, PatchScanRecord, SystemGroup, VulnerabilityReportRecord,
};
pub use router::EventRouter;
