//! Document checks
//!
//! `check_importable` is the fail-fast gate in front of an import.
//! `validate_document` runs every rule and reports errors and warnings together.

use needs_types::{IssueSeverity, LinkKind, NeedsDocument, VersionData};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::ValidationFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub rule: String,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ValidationIssue {
    fn error(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity: IssueSeverity::Error,
            message,
        }
    }

    fn warning(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity: IssueSeverity::Warning,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.severity, self.message)
    }
}

/// Conventional need id format
static NEED_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+$").unwrap());

/// The fail-fast check run before an import touches the graph.
///
/// Returns the current version's data, or the first structural problem.
pub fn check_importable(doc: &NeedsDocument) -> Result<&VersionData, ValidationFailure> {
    let version = doc
        .current_version
        .as_ref()
        .ok_or(ValidationFailure::MissingCurrentVersion)?;
    if doc.versions.is_empty() {
        return Err(ValidationFailure::NoVersions);
    }
    let data = doc
        .versions
        .get(version)
        .ok_or_else(|| ValidationFailure::MissingVersionData(version.clone()))?;
    if data.is_empty() {
        return Err(ValidationFailure::EmptyNeeds(version.clone()));
    }
    Ok(data)
}

/// Check a document. Returns all issues found, errors and warnings mixed,
/// in rule order per version.
///
/// N1 and N2 concern the current version and stop the check. The per-need
/// rules run over every version in the file.
pub fn validate_document(doc: &NeedsDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    // N1 + N2: current version resolves to a non-empty version
    match check_importable(doc) {
        Ok(_) => {}
        Err(failure @ ValidationFailure::EmptyNeeds(_)) => {
            issues.push(ValidationIssue::error("N2", failure.to_string()));
            return issues;
        }
        Err(failure) => {
            issues.push(ValidationIssue::error("N1", failure.to_string()));
            return issues;
        }
    }

    for (version, data) in &doc.versions {
        check_version(version, data, &mut issues);
    }
    issues
}

fn check_version(version: &str, data: &VersionData, issues: &mut Vec<ValidationIssue>) {
    // N3: needs_amount matches the map
    if !data.is_consistent() {
        issues.push(ValidationIssue::warning(
            "N3",
            format!(
                "Version '{}': needs_amount is {} but {} needs are present",
                version,
                data.needs_amount(),
                data.len()
            ),
        ));
    }

    // N4: map key equals need id
    for (key, need) in data.needs() {
        if key != &need.id {
            issues.push(ValidationIssue::error(
                "N4",
                format!(
                    "Version '{}': need stored under '{}' has id '{}'",
                    version, key, need.id
                ),
            ));
        }
    }

    // N5: id format
    for need in data.iter() {
        if !NEED_ID_RE.is_match(&need.id) {
            issues.push(ValidationIssue::warning(
                "N5",
                format!(
                    "Version '{}': need id '{}' should match ^[A-Z0-9_]+$",
                    version, need.id
                ),
            ));
        }
    }

    // N6 + N7: link targets exist within the version, no duplicates
    for need in data.iter() {
        for kind in LinkKind::ALL {
            let mut seen = HashSet::new();
            for target in need.links(kind) {
                if !data.contains(target) {
                    issues.push(ValidationIssue::warning(
                        "N6",
                        format!(
                            "Version '{}': {}.{} references unknown need '{}'",
                            version, need.id, kind, target
                        ),
                    ));
                }
                if !seen.insert(target.as_str()) {
                    issues.push(ValidationIssue::warning(
                        "N7",
                        format!(
                            "Version '{}': {}.{} lists '{}' more than once",
                            version, need.id, kind, target
                        ),
                    ));
                }
            }
        }
    }

    // N8: type classifiable
    for need in data.iter() {
        if need.resolved_type().is_none() {
            issues.push(ValidationIssue::warning(
                "N8",
                format!(
                    "Version '{}': need '{}' has unrecognized type '{}'",
                    version, need.id, need.need_type
                ),
            ));
        }
    }
}
