//! Fixed translation tables between host enumeration codes and document strings.
//!
//! The host stores use-case status, use-case rank and requirement priority as
//! small integer codes. The document carries lowercase strings. Requirement
//! status is free text on both sides.

use std::fmt;

/// Use-case status. Codes 0..=6 on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UseCaseStatus {
    #[default]
    Identify,
    Discuss,
    Elaborate,
    Design,
    Consent,
    Develop,
    Complete,
}

impl UseCaseStatus {
    pub const ALL: [UseCaseStatus; 7] = [
        UseCaseStatus::Identify,
        UseCaseStatus::Discuss,
        UseCaseStatus::Elaborate,
        UseCaseStatus::Design,
        UseCaseStatus::Consent,
        UseCaseStatus::Develop,
        UseCaseStatus::Complete,
    ];

    /// Unknown codes read as `Identify`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => UseCaseStatus::Discuss,
            2 => UseCaseStatus::Elaborate,
            3 => UseCaseStatus::Design,
            4 => UseCaseStatus::Consent,
            5 => UseCaseStatus::Develop,
            6 => UseCaseStatus::Complete,
            _ => UseCaseStatus::Identify,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            UseCaseStatus::Identify => 0,
            UseCaseStatus::Discuss => 1,
            UseCaseStatus::Elaborate => 2,
            UseCaseStatus::Design => 3,
            UseCaseStatus::Consent => 4,
            UseCaseStatus::Develop => 5,
            UseCaseStatus::Complete => 6,
        }
    }

    /// Case-insensitive; `None` for strings outside the table.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCaseStatus::Identify => "identify",
            UseCaseStatus::Discuss => "discuss",
            UseCaseStatus::Elaborate => "elaborate",
            UseCaseStatus::Design => "design",
            UseCaseStatus::Consent => "consent",
            UseCaseStatus::Develop => "develop",
            UseCaseStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for UseCaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Use-case rank, exported as the need's priority. Code 0 means unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseCaseRank {
    High,
    Medium,
    Low,
}

impl UseCaseRank {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(UseCaseRank::High),
            2 => Some(UseCaseRank::Medium),
            3 => Some(UseCaseRank::Low),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            UseCaseRank::High => 1,
            UseCaseRank::Medium => 2,
            UseCaseRank::Low => 3,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(UseCaseRank::High),
            "medium" => Some(UseCaseRank::Medium),
            "low" => Some(UseCaseRank::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCaseRank::High => "high",
            UseCaseRank::Medium => "medium",
            UseCaseRank::Low => "low",
        }
    }
}

/// Priority string for an optional rank code; empty when unspecified.
pub fn rank_priority(code: Option<i32>) -> String {
    code.and_then(UseCaseRank::from_code)
        .map(|rank| rank.as_str().to_string())
        .unwrap_or_default()
}

/// Requirement priority. Code 0 means unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl RequirementPriority {
    pub const UNSPECIFIED_CODE: i32 = 0;

    /// `None` for the unspecified code; other unknown codes read as `Medium`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::UNSPECIFIED_CODE => None,
            1 => Some(RequirementPriority::Critical),
            2 => Some(RequirementPriority::High),
            4 => Some(RequirementPriority::Low),
            _ => Some(RequirementPriority::Medium),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            RequirementPriority::Critical => 1,
            RequirementPriority::High => 2,
            RequirementPriority::Medium => 3,
            RequirementPriority::Low => 4,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(RequirementPriority::Critical),
            "high" => Some(RequirementPriority::High),
            "medium" => Some(RequirementPriority::Medium),
            "low" => Some(RequirementPriority::Low),
            _ => None,
        }
    }

    /// Host code for a document string; unknown or empty strings are unspecified.
    pub fn code_for(value: &str) -> i32 {
        Self::parse(value)
            .map(|priority| priority.code())
            .unwrap_or(Self::UNSPECIFIED_CODE)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementPriority::Critical => "critical",
            RequirementPriority::High => "high",
            RequirementPriority::Medium => "medium",
            RequirementPriority::Low => "low",
        }
    }
}

/// Priority string for an optional requirement code; empty when unspecified.
pub fn requirement_priority(code: Option<i32>) -> String {
    code.and_then(RequirementPriority::from_code)
        .map(|priority| priority.as_str().to_string())
        .unwrap_or_default()
}

pub const DEFAULT_REQUIREMENT_STATUS: &str = "open";

/// Requirement status as exported; blank reads as "open".
pub fn requirement_status(status: Option<&str>) -> String {
    match status.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_REQUIREMENT_STATUS.to_string(),
    }
}

/// Actors carry no lifecycle on the host; they always export as "identify".
pub const ACTOR_STATUS: &str = "identify";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_case_status_table() {
        for status in UseCaseStatus::ALL {
            assert_eq!(UseCaseStatus::from_code(status.code()), status);
            assert_eq!(UseCaseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(UseCaseStatus::from_code(42), UseCaseStatus::Identify);
        assert_eq!(UseCaseStatus::parse("Design"), Some(UseCaseStatus::Design));
        assert_eq!(UseCaseStatus::parse("shipped"), None);
    }

    #[test]
    fn test_rank_priority() {
        assert_eq!(rank_priority(Some(1)), "high");
        assert_eq!(rank_priority(Some(3)), "low");
        assert_eq!(rank_priority(Some(0)), "");
        assert_eq!(rank_priority(None), "");
        assert_eq!(UseCaseRank::parse("MEDIUM").map(|r| r.code()), Some(2));
    }

    #[test]
    fn test_requirement_priority() {
        assert_eq!(requirement_priority(Some(1)), "critical");
        assert_eq!(requirement_priority(Some(4)), "low");
        assert_eq!(requirement_priority(Some(0)), "");
        assert_eq!(requirement_priority(Some(9)), "medium");
        assert_eq!(requirement_priority(None), "");
        assert_eq!(RequirementPriority::code_for("high"), 2);
        assert_eq!(RequirementPriority::code_for("urgent"), 0);
        assert_eq!(RequirementPriority::code_for(""), 0);
    }

    #[test]
    fn test_requirement_status_defaults_to_open() {
        assert_eq!(requirement_status(None), "open");
        assert_eq!(requirement_status(Some("  ")), "open");
        assert_eq!(requirement_status(Some("approved")), "approved");
    }
}
