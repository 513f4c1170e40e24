//! Identity resolution for report rows.
//!
//! Decides insert-vs-update for a candidate record using a layered
//! policy: exact natural-key match first, then a fallback on
//! (system group, surrogate id) for callers that only hold an id from a
//! prior read. Absence of a match is a valid outcome, never an error.

use uuid::Uuid;

use crate::error::ReportResult;
use crate::models::{NaturalKey, VulnerabilityReportRecord};
use crate::store::ReportStore;

/// Outcome of an identity lookup.
#[derive(Debug, Clone)]
pub enum IdentityMatch {
    /// An existing row was found; carries the row so callers can
    /// preserve its audit fields.
    Found(Box<VulnerabilityReportRecord>),
    /// No existing row. The candidate should be inserted with a newly
    /// assigned id.
    NotFound,
}

impl IdentityMatch {
    pub fn is_found(&self) -> bool {
        matches!(self, IdentityMatch::Found(_))
    }
}

/// Resolve whether a row already exists for the given natural key.
///
/// `advisory_id` is the surrogate id the candidate claims, if any. It
/// is only consulted when the natural key finds nothing, and a stale
/// advisory id that matches no row resolves to [`IdentityMatch::NotFound`]
/// rather than forcing an update against a non-existent row.
pub async fn resolve(
    store: &dyn ReportStore,
    key: &NaturalKey,
    advisory_id: Option<Uuid>,
) -> ReportResult<IdentityMatch> {
    if let Some(existing) = store.find_by_natural_key(key).await? {
        return Ok(IdentityMatch::Found(Box::new(existing)));
    }

    if let Some(id) = advisory_id.filter(|id| !id.is_nil()) {
        if let Some(existing) = store.find_by_id(&key.system_group_id, id).await? {
            return Ok(IdentityMatch::Found(Box::new(existing)));
        }
    }

    Ok(IdentityMatch::NotFound)
}
