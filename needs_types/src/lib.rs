//! Needs Types - Level 1 Foundation Types
//!
//! Pure, serializable data structures for the needs document: the file format
//! exchanged with the requirements-tracking toolchain.
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! Extraction (graph → document) and import (document → graph) both build on
//! these types. This crate depends on nothing else in the workspace.
//!
//! ## Contents
//!
//! - `Need` - one exportable element (use case, actor, requirement)
//! - `VersionData` - the needs of one labeled revision
//! - `NeedsDocument` - the top-level file
//! - `NeedType` / `LinkKind` - wire enumerations
//! - `IssueSeverity` - severity levels for document checks
//!
//! ## Rules
//!
//! 1. **NO HOST KNOWLEDGE** - nothing here knows about the model graph
//! 2. **DATA INVARIANTS ONLY** - `needs_amount` bookkeeping, link uniqueness
//! 3. **SERIALIZABLE** - field names are the normative wire names
//! 4. **LENIENT READS** - unknown fields are ignored, missing link lists are empty

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version label used when nothing else pins one.
pub const DEFAULT_VERSION: &str = "1.0";

/// Current time as an ISO-8601 timestamp.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ============================================================================
// NEED TYPE
// ============================================================================

/// The kind of element a need was exported from.
///
/// Serialized as `"uc"`, `"act"` or `"req"`. Reads also accept the long
/// aliases `"usecase"`, `"actor"` and `"requirement"`; anything else is kept
/// verbatim in `Other` so a foreign document still parses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NeedType {
    UseCase,
    Actor,
    Requirement,
    Other(String),
}

impl NeedType {
    /// Parse a wire value, returning `None` for unrecognized types.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uc" | "usecase" | "use_case" => Some(NeedType::UseCase),
            "act" | "actor" => Some(NeedType::Actor),
            "req" | "requirement" => Some(NeedType::Requirement),
            _ => None,
        }
    }

    /// Classify an `element_type` origin label ("UseCase", "Actor", "Requirement").
    pub fn from_element_type(label: &str) -> Option<Self> {
        match label.trim() {
            "UseCase" => Some(NeedType::UseCase),
            "Actor" => Some(NeedType::Actor),
            "Requirement" => Some(NeedType::Requirement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NeedType::UseCase => "uc",
            NeedType::Actor => "act",
            NeedType::Requirement => "req",
            NeedType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NeedType::Other(_))
    }
}

impl Default for NeedType {
    fn default() -> Self {
        NeedType::Other(String::new())
    }
}

impl From<String> for NeedType {
    fn from(value: String) -> Self {
        NeedType::parse(&value).unwrap_or(NeedType::Other(value))
    }
}

impl From<NeedType> for String {
    fn from(value: NeedType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LINK KINDS
// ============================================================================

/// The six typed link lists a need carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Includes,
    Extends,
    Associates,
    Contains,
    Derive,
    Refines,
}

impl LinkKind {
    /// All kinds, in the order they are replayed.
    pub const ALL: [LinkKind; 6] = [
        LinkKind::Includes,
        LinkKind::Extends,
        LinkKind::Associates,
        LinkKind::Contains,
        LinkKind::Derive,
        LinkKind::Refines,
    ];

    /// Wire field name of the list.
    pub fn field_name(&self) -> &'static str {
        match self {
            LinkKind::Includes => "includes",
            LinkKind::Extends => "extends",
            LinkKind::Associates => "associates",
            LinkKind::Contains => "contains",
            LinkKind::Derive => "derive",
            LinkKind::Refines => "refines",
        }
    }

    /// Associations are stored on both endpoints.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, LinkKind::Associates)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ============================================================================
// NEED
// ============================================================================

/// One exportable graph element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Need {
    /// Public, document-unique identifier
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub need_type: NeedType,
    #[serde(default)]
    pub status: String,
    /// Omitted from the file when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Untyped links; carried through, never populated by extraction
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub associates: Vec<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub derive: Vec<String>,
    #[serde(default)]
    pub refines: Vec<String>,
    /// Free-form origin label ("UseCase", "Actor", "Requirement")
    #[serde(default)]
    pub element_type: String,
    /// Opaque internal graph identifier this need was derived from
    #[serde(
        rename = "vp_model_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_ref: Option<String>,
}

impl Need {
    pub fn new(id: impl Into<String>, title: impl Into<String>, need_type: NeedType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            need_type,
            ..Default::default()
        }
    }

    pub fn with_internal_ref(mut self, internal_ref: impl Into<String>) -> Self {
        self.internal_ref = Some(internal_ref.into());
        self
    }

    /// The internal ref, treating blank values as absent.
    pub fn internal_ref(&self) -> Option<&str> {
        self.internal_ref
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    /// Known type, falling back to `element_type` when `type` is unrecognized.
    pub fn resolved_type(&self) -> Option<NeedType> {
        if self.need_type.is_known() {
            Some(self.need_type.clone())
        } else {
            NeedType::from_element_type(&self.element_type)
        }
    }

    pub fn links(&self, kind: LinkKind) -> &[String] {
        match kind {
            LinkKind::Includes => &self.includes,
            LinkKind::Extends => &self.extends,
            LinkKind::Associates => &self.associates,
            LinkKind::Contains => &self.contains,
            LinkKind::Derive => &self.derive,
            LinkKind::Refines => &self.refines,
        }
    }

    fn links_mut(&mut self, kind: LinkKind) -> &mut Vec<String> {
        match kind {
            LinkKind::Includes => &mut self.includes,
            LinkKind::Extends => &mut self.extends,
            LinkKind::Associates => &mut self.associates,
            LinkKind::Contains => &mut self.contains,
            LinkKind::Derive => &mut self.derive,
            LinkKind::Refines => &mut self.refines,
        }
    }

    /// Append `target` to a link list unless already present.
    ///
    /// Returns `true` when the list changed.
    pub fn push_link(&mut self, kind: LinkKind, target: impl Into<String>) -> bool {
        let target = target.into();
        let list = self.links_mut(kind);
        if list.contains(&target) {
            return false;
        }
        list.push(target);
        true
    }

    /// Add a tag unless already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Total number of typed link entries.
    pub fn link_count(&self) -> usize {
        LinkKind::ALL.iter().map(|kind| self.links(*kind).len()).sum()
    }
}

// ============================================================================
// VERSION DATA
// ============================================================================

/// Tool that produced a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub version: String,
}

impl Default for Creator {
    fn default() -> Self {
        Self {
            name: "Visual Paradigm Sphinx-Needs Plugin".to_string(),
            program: None,
            version: "1.0.0".to_string(),
        }
    }
}

/// The needs of one labeled revision.
///
/// `needs` is private so every mutation goes through methods that keep
/// `needs_amount` equal to the map size. A deserialized file keeps whatever
/// amount it declared until the first mutation; see [`VersionData::is_consistent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionData {
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub creator: Creator,
    #[serde(default)]
    needs: IndexMap<String, Need>,
    #[serde(default)]
    needs_amount: usize,
}

impl Default for VersionData {
    fn default() -> Self {
        Self::new(Creator::default())
    }
}

impl VersionData {
    pub fn new(creator: Creator) -> Self {
        Self {
            created: timestamp_now(),
            creator,
            needs: IndexMap::new(),
            needs_amount: 0,
        }
    }

    /// Insert a need under its own id, replacing any need with that id.
    pub fn add_need(&mut self, need: Need) -> Option<Need> {
        let previous = self.needs.insert(need.id.clone(), need);
        self.needs_amount = self.needs.len();
        previous
    }

    pub fn remove_need(&mut self, id: &str) -> Option<Need> {
        let removed = self.needs.shift_remove(id);
        self.needs_amount = self.needs.len();
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Need> {
        self.needs.get(id)
    }

    /// Mutable access to one need. Its id must not be changed through this.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Need> {
        self.needs.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.needs.contains_key(id)
    }

    pub fn needs(&self) -> &IndexMap<String, Need> {
        &self.needs
    }

    /// Needs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Need> {
        self.needs.values()
    }

    pub fn len(&self) -> usize {
        self.needs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    /// Declared count, as written in the file.
    pub fn needs_amount(&self) -> usize {
        self.needs_amount
    }

    pub fn is_consistent(&self) -> bool {
        self.needs_amount == self.needs.len()
    }

    /// Re-establish `needs_amount` after reading a file that declared a wrong count.
    pub fn recount(&mut self) {
        self.needs_amount = self.needs.len();
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// Top-level needs file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeedsDocument {
    #[serde(default)]
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub versions: IndexMap<String, VersionData>,
}

impl NeedsDocument {
    /// A fresh document whose current version points at `data`.
    pub fn new(project: impl Into<String>, version: impl Into<String>, data: VersionData) -> Self {
        let version = version.into();
        let mut versions = IndexMap::new();
        versions.insert(version.clone(), data);
        Self {
            created: timestamp_now(),
            current_version: Some(version),
            project: project.into(),
            versions,
        }
    }

    pub fn current(&self) -> Option<&VersionData> {
        self.current_version
            .as_ref()
            .and_then(|version| self.versions.get(version))
    }

    pub fn current_mut(&mut self) -> Option<&mut VersionData> {
        match self.current_version.as_ref() {
            Some(version) => self.versions.get_mut(version),
            None => None,
        }
    }

    /// Number of needs in the current version, zero when there is none.
    pub fn needs_amount(&self) -> usize {
        self.current().map(VersionData::len).unwrap_or(0)
    }
}

// ============================================================================
// ISSUE SEVERITY
// ============================================================================

/// Severity of a document check finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Suspicious but importable
    Warning,
    /// Structurally broken
    Error,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
