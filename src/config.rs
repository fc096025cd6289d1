//! Sync configuration, loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use anyhow::{Context, Result};
use needs_types::{Creator, DEFAULT_VERSION};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::extract::ExportOptions;
use crate::host::ElementKind;
use crate::layout::LayoutConfig;
use crate::reconcile::IdPrefixes;

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Root configuration for export and import passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Stamped into every exported version.
    pub creator: Creator,
    /// Version label when an export does not pin one.
    pub default_version: String,
    /// Project label when the host has no project name.
    pub default_project: String,
    /// Base diagram name for imports of documents without a project.
    pub import_diagram_base: String,
    pub placeholders: Placeholders,
    pub id_prefixes: IdPrefixes,
    pub layout: LayoutConfig,
    pub export: ExportOptions,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            creator: Creator::default(),
            default_version: DEFAULT_VERSION.to_string(),
            default_project: "Untitled Project".to_string(),
            import_diagram_base: "Imported Use Cases".to_string(),
            placeholders: Placeholders::default(),
            id_prefixes: IdPrefixes::default(),
            layout: LayoutConfig::default(),
            export: ExportOptions::default(),
        }
    }
}

impl SyncConfig {
    /// Load from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Parsing {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SyncConfig = serde_yaml::from_str(content)?;
        tracing::debug!(
            version = %config.default_version,
            creator = %config.creator.name,
            "sync config loaded"
        );
        Ok(config)
    }
}

/// Titles for elements without a usable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub use_case: String,
    pub actor: String,
    pub requirement: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            use_case: "Unnamed Use Case".to_string(),
            actor: "Unnamed Actor".to_string(),
            requirement: "Untitled Requirement".to_string(),
        }
    }
}

impl Placeholders {
    pub fn for_kind(&self, kind: ElementKind) -> &str {
        match kind {
            ElementKind::UseCase => &self.use_case,
            ElementKind::Actor => &self.actor,
            ElementKind::Requirement => &self.requirement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(SyncConfig::from_yaml("").unwrap(), SyncConfig::default());
        assert_eq!(SyncConfig::from_yaml("  \n").unwrap(), SyncConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
default_version: "2.0"
creator:
  name: Needs Bridge
  version: "0.3.0"
layout:
  margin: 10
export:
  include_actors: false
"#;
        let config = SyncConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.default_version, "2.0");
        assert_eq!(config.creator.name, "Needs Bridge");
        assert_eq!(config.creator.program, None);
        assert_eq!(config.layout.margin, 10);
        assert_eq!(config.layout.element_width, 120);
        assert!(!config.export.include_actors);
        assert!(config.export.include_use_cases);
        assert_eq!(config.placeholders.actor, "Unnamed Actor");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_project: Demo").unwrap();
        let config = SyncConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.default_project, "Demo");
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = SyncConfig::load_from_file(Path::new("/nonexistent/sync.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("Reading /nonexistent/sync.yaml"));
    }
}
