//! Error taxonomy for the report projection.
//!
//! Four classes with distinct handling policies:
//! - data-quality: skip the affected unit, warn, keep going
//! - not-found: the triggering event is still considered handled
//! - persistence: abort the individual operation, siblings proceed
//! - parse: data-quality scoped to the owning document

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur while materializing the report projection.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A document or record is missing expected content. Skip the unit.
    #[error("Data quality issue: {reason}")]
    DataQuality { reason: String },

    /// A referenced entity does not exist upstream.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The projection store rejected or could not perform an operation.
    #[error("Persistence failure: {cause}")]
    Persistence { cause: String },

    /// A raw blob could not be parsed. Scoped to its owning document.
    #[error("Parse failure: {reason}")]
    Parse { reason: String },
}

impl ReportError {
    /// True when the failure should only skip its owning unit rather
    /// than abort sibling work in the same batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReportError::DataQuality { .. }
                | ReportError::NotFound { .. }
                | ReportError::Parse { .. }
        )
    }
}

impl From<sqlx::Error> for ReportError {
    fn from(err: sqlx::Error) -> Self {
        ReportError::Persistence {
            cause: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for ReportError {
    fn from(err: quick_xml::Error) -> Self {
        ReportError::Parse {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(ReportError::DataQuality {
            reason: "missing vuln number".into()
        }
        .is_recoverable());
        assert!(ReportError::NotFound {
            entity: "checklist",
            id: "abc".into()
        }
        .is_recoverable());
        assert!(!ReportError::Persistence {
            cause: "connection reset".into()
        }
        .is_recoverable());
    }
}
