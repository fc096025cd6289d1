//! Error handling for graph ↔ document synchronization
//!
//! Fatal conditions are `SyncError` values returned through `Result`.
//! Non-fatal conditions met during a pass are recorded as `PassIssue`s in the
//! pass's `PassReport` and never abort the pass.

use std::fmt;
use std::path::PathBuf;

use needs_types::LinkKind;
use thiserror::Error;

/// Main error type for export and import operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Another export or import is already running")]
    Busy,
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Fatal errors are reported to the user; everything else is a bug in the caller.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_) | SyncError::Io { .. } | SyncError::Parse { .. }
        )
    }
}

/// Structural problems that make a document unusable for import.
///
/// Messages are reported verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("No current version specified in needs file")]
    MissingCurrentVersion,

    #[error("No version data found in needs file")]
    NoVersions,

    #[error("Version data not found for current version: {0}")]
    MissingVersionData(String),

    #[error("No needs found in version data")]
    EmptyNeeds(String),
}

/// Failures reported by the host graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host graph unavailable: {0}")]
    Unavailable(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Property '{property}' cannot be read or written on {element}")]
    UnsupportedProperty { element: String, property: String },

    #[error("Host rejected {operation}: {reason}")]
    Rejected { operation: String, reason: String },
}

impl HostError {
    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        HostError::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(element: impl Into<String>, property: impl Into<String>) -> Self {
        HostError::UnsupportedProperty {
            element: element.into(),
            property: property.into(),
        }
    }
}

// ============================================================================
// PASS REPORT
// ============================================================================

/// A non-fatal condition met during extraction or import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassIssue {
    /// The host graph could not be reached at all; the pass produced an empty result.
    HostUnreachable { reason: String },

    /// One element or connector could not be read, classified or written.
    ElementProcessing { element: String, reason: String },

    /// A relationship endpoint is not among the materialized needs/elements.
    RelationshipSkipped {
        kind: LinkKind,
        from: String,
        to: String,
        reason: String,
    },
}

impl fmt::Display for PassIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassIssue::HostUnreachable { reason } => write!(f, "host unreachable: {}", reason),
            PassIssue::ElementProcessing { element, reason } => {
                write!(f, "element {}: {}", element, reason)
            }
            PassIssue::RelationshipSkipped {
                kind,
                from,
                to,
                reason,
            } => write!(f, "{} {} -> {} skipped: {}", kind, from, to, reason),
        }
    }
}

/// Everything a pass chose to skip or degrade, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    issues: Vec<PassIssue>,
}

impl PassReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element_warning(&mut self, element: impl Into<String>, reason: impl fmt::Display) {
        let element = element.into();
        let reason = reason.to_string();
        tracing::warn!(element = %element, reason = %reason, "element skipped or degraded");
        self.issues
            .push(PassIssue::ElementProcessing { element, reason });
    }

    /// Record a dropped relationship. `expected` drops (filtered extraction) log at debug.
    pub fn relationship_skipped(
        &mut self,
        kind: LinkKind,
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
        expected: bool,
    ) {
        let (from, to, reason) = (from.into(), to.into(), reason.into());
        if expected {
            tracing::debug!(%kind, %from, %to, %reason, "relationship dropped");
        } else {
            tracing::warn!(%kind, %from, %to, %reason, "relationship skipped");
        }
        self.issues.push(PassIssue::RelationshipSkipped {
            kind,
            from,
            to,
            reason,
        });
    }

    pub fn host_unreachable(&mut self, reason: impl fmt::Display) {
        let reason = reason.to_string();
        tracing::warn!(reason = %reason, "host graph unreachable");
        self.issues.push(PassIssue::HostUnreachable { reason });
    }

    /// Append another pass's issues, keeping their order.
    pub fn extend(&mut self, other: PassReport) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[PassIssue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn element_warnings(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, PassIssue::ElementProcessing { .. }))
            .count()
    }

    pub fn skipped_relationships(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, PassIssue::RelationshipSkipped { .. }))
            .count()
    }

    pub fn host_was_unreachable(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| matches!(issue, PassIssue::HostUnreachable { .. }))
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_verbatim() {
        assert_eq!(
            ValidationFailure::MissingVersionData("2.0".into()).to_string(),
            "Version data not found for current version: 2.0"
        );
        let err: SyncError = ValidationFailure::MissingCurrentVersion.into();
        assert!(err.is_user_facing());
        assert!(err
            .to_string()
            .ends_with("No current version specified in needs file"));
    }

    #[test]
    fn test_report_counts() {
        let mut report = PassReport::new();
        assert!(report.is_clean());
        report.element_warning("el-1", "no name");
        report.relationship_skipped(LinkKind::Derive, "A", "Z", "unknown target", true);
        report.relationship_skipped(LinkKind::Includes, "A", "Y", "unknown target", false);
        assert_eq!(report.element_warnings(), 1);
        assert_eq!(report.skipped_relationships(), 2);
        assert!(!report.host_was_unreachable());
        assert_eq!(
            report.issues()[1].to_string(),
            "derive A -> Z skipped: unknown target"
        );
    }
}
