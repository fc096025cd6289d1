//! Extraction: host graph → needs document.
//!
//! Elements are enumerated project-wide (or from the union of a set of
//! diagrams for a scoped export), turned into needs through the
//! [`IdReconciler`], and then the connectors reachable from the scoped
//! diagrams are projected onto the needs' link lists by the
//! [`RelationshipResolver`]. One pass shares one reconciler and one resolver,
//! so an element shown on several diagrams is emitted once with the links
//! from all of them.
//!
//! Extraction never fails as a whole. A bad element or connector is skipped
//! and reported; an unreadable optional property is reported and read as
//! unset. An unreachable host yields an empty document.

use needs_types::{Need, NeedsDocument, VersionData, DEFAULT_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::SyncConfig;
use crate::error::{HostError, PassReport};
use crate::host::{
    ConnectorScope, ElementKind, ElementRef, HostGraph, RequirementElement, UseCaseElement,
};
use crate::properties::{self, UseCaseStatus};
use crate::reconcile::IdReconciler;
use crate::relationships::{RelationshipResolver, StageOutcome};

/// What goes into an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub include_use_cases: bool,
    pub include_actors: bool,
    pub include_requirements: bool,
    /// Project connectors onto link lists
    pub include_connections: bool,
    /// When off, content, status and priority are blanked
    pub include_metadata: bool,
    /// Version label to pin instead of the configured default
    pub version: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_use_cases: true,
            include_actors: true,
            include_requirements: true,
            include_connections: true,
            include_metadata: true,
            version: None,
        }
    }
}

impl ExportOptions {
    pub fn kinds(&self) -> Vec<ElementKind> {
        let mut kinds = Vec::with_capacity(3);
        if self.include_use_cases {
            kinds.push(ElementKind::UseCase);
        }
        if self.include_actors {
            kinds.push(ElementKind::Actor);
        }
        if self.include_requirements {
            kinds.push(ElementKind::Requirement);
        }
        kinds
    }
}

/// Which part of the graph an extraction reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractScope<'a> {
    /// Every element and every connector shown on any diagram
    Project,
    /// Elements and connectors shown on one diagram
    Diagram(&'a str),
    /// Elements and connectors shown on any of these diagrams
    Diagrams(&'a [String]),
}

impl<'a> ExtractScope<'a> {
    /// Diagram ids the scope is limited to; `None` for the whole project.
    fn diagram_ids(self) -> Option<Vec<&'a str>> {
        match self {
            ExtractScope::Project => None,
            ExtractScope::Diagram(id) => Some(vec![id]),
            ExtractScope::Diagrams(ids) => Some(ids.iter().map(String::as_str).collect()),
        }
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: NeedsDocument,
    pub report: PassReport,
}

impl Extraction {
    pub fn needs_amount(&self) -> usize {
        self.document.needs_amount()
    }
}

pub struct Extractor<'a> {
    config: &'a SyncConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Version label for an export: the pinned one unless blank, else the
    /// configured default, else `1.0`.
    pub fn version_label(&self, options: &ExportOptions) -> String {
        options
            .version
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                if self.config.default_version.is_empty() {
                    DEFAULT_VERSION.to_string()
                } else {
                    self.config.default_version.clone()
                }
            })
    }

    fn empty_document(&self, project: String, options: &ExportOptions) -> NeedsDocument {
        NeedsDocument::new(
            project,
            self.version_label(options),
            VersionData::new(self.config.creator.clone()),
        )
    }

    /// Run one extraction pass.
    pub fn extract<G: HostGraph>(
        &self,
        graph: &G,
        scope: ExtractScope<'_>,
        options: &ExportOptions,
    ) -> Extraction {
        let mut report = PassReport::new();

        let project = match self.project_label(graph, scope) {
            Ok(project) => project,
            Err(e) => {
                report.host_unreachable(e);
                return Extraction {
                    document: self.empty_document(String::new(), options),
                    report,
                };
            }
        };

        let elements = match self.enumerate(graph, scope, options) {
            Ok(elements) => elements,
            Err(e) => {
                report.host_unreachable(e);
                return Extraction {
                    document: self.empty_document(project, options),
                    report,
                };
            }
        };

        let mut reconciler = IdReconciler::new(self.config.id_prefixes.clone());
        let mut version = VersionData::new(self.config.creator.clone());

        for element in &elements {
            let internal_id = element.internal_id();
            if reconciler.is_registered(internal_id) {
                tracing::debug!(internal_id, "element already extracted");
                continue;
            }
            match self.build_need(element, options, &reconciler, &mut report) {
                Ok(mut need) => {
                    let id = reconciler.register_and_deduplicate(internal_id, &need.id, &version);
                    need.id = id;
                    version.add_need(need);
                }
                Err(e) => report.element_warning(internal_id, e),
            }
        }

        if options.include_connections {
            let resolver = self.stage_connectors(graph, scope, &mut report);
            let projected = resolver.project(&reconciler, &mut version, &mut report);
            tracing::debug!(projected, "relationships projected");
        }

        tracing::info!(
            project = %project,
            needs = version.len(),
            warnings = report.element_warnings(),
            skipped_relationships = report.skipped_relationships(),
            "extraction finished"
        );

        Extraction {
            document: NeedsDocument::new(project, self.version_label(options), version),
            report,
        }
    }

    fn project_label<G: HostGraph>(
        &self,
        graph: &G,
        scope: ExtractScope<'_>,
    ) -> Result<String, HostError> {
        let project = graph.project_name()?;
        // A scoped export is labelled after its first diagram
        let first_diagram = scope.diagram_ids().and_then(|ids| ids.first().copied());
        if let Some(diagram_id) = first_diagram {
            let diagram = graph
                .diagrams()?
                .into_iter()
                .find(|d| d.id == diagram_id)
                .ok_or_else(|| HostError::ElementNotFound(diagram_id.to_string()))?;
            return Ok(diagram.name);
        }
        Ok(project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.config.default_project.clone()))
    }

    fn enumerate<'g, G: HostGraph>(
        &self,
        graph: &'g G,
        scope: ExtractScope<'_>,
        options: &ExportOptions,
    ) -> Result<Vec<ElementRef<'g, G>>, HostError> {
        let kinds = options.kinds();
        if kinds.is_empty() {
            return Ok(Vec::new());
        }
        let elements = graph.elements(&kinds)?;
        let Some(diagram_ids) = scope.diagram_ids() else {
            return Ok(elements);
        };
        let mut shown = HashSet::new();
        for diagram_id in diagram_ids {
            shown.extend(graph.diagram_elements(diagram_id)?);
        }
        Ok(elements
            .into_iter()
            .filter(|e| shown.contains(e.internal_id()))
            .collect())
    }

    fn build_need<G: HostGraph>(
        &self,
        element: &ElementRef<'_, G>,
        options: &ExportOptions,
        reconciler: &IdReconciler,
        report: &mut PassReport,
    ) -> Result<Need, HostError> {
        let kind = element.kind();
        let model = element.as_model();
        let internal_id = model.internal_id();

        let title = model
            .name()?
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.config.placeholders.for_kind(kind).to_string());

        // Only the name is required; other properties degrade to unset
        let user_id = or_unset(model.user_id(), internal_id, report);
        let candidate = reconciler.resolve_need_id(kind, internal_id, user_id.as_deref());

        let mut need = Need::new(candidate, title, kind.need_type());
        need.content = description(or_unset(model.description(), internal_id, report));
        need.element_type = kind.element_type().to_string();
        need.internal_ref = Some(internal_id.to_string());
        for tag in kind.tags() {
            need.add_tag(tag);
        }

        match element {
            ElementRef::UseCase(use_case) => {
                need.status = or_unset(use_case.status_code(), internal_id, report)
                    .map(UseCaseStatus::from_code)
                    .unwrap_or_default()
                    .as_str()
                    .to_string();
                let rank = or_unset(use_case.rank_code(), internal_id, report);
                need.priority = properties::rank_priority(rank);
            }
            ElementRef::Actor(_) => {
                need.status = properties::ACTOR_STATUS.to_string();
            }
            ElementRef::Requirement(requirement) => {
                let status = or_unset(requirement.status(), internal_id, report);
                need.status = properties::requirement_status(status.as_deref());
                let priority = or_unset(requirement.priority_code(), internal_id, report);
                need.priority = properties::requirement_priority(priority);
            }
        }

        if !options.include_metadata {
            need.content.clear();
            need.status.clear();
            need.priority.clear();
        }
        Ok(need)
    }

    fn stage_connectors<G: HostGraph>(
        &self,
        graph: &G,
        scope: ExtractScope<'_>,
        report: &mut PassReport,
    ) -> RelationshipResolver {
        let mut resolver = RelationshipResolver::new();

        let diagram_ids: Vec<String> = match scope.diagram_ids() {
            Some(ids) => ids.into_iter().map(str::to_string).collect(),
            None => match graph.diagrams() {
                Ok(diagrams) => diagrams.into_iter().map(|d| d.id).collect(),
                Err(e) => {
                    report.element_warning("diagrams", e);
                    return resolver;
                }
            },
        };

        for diagram_id in &diagram_ids {
            let connectors = match graph.connectors(ConnectorScope::Diagram(diagram_id)) {
                Ok(connectors) => connectors,
                Err(e) => {
                    report.element_warning(diagram_id.as_str(), e);
                    continue;
                }
            };
            for connector in &connectors {
                match resolver.stage(connector) {
                    StageOutcome::Dangling => report.element_warning(
                        connector.id.as_str(),
                        format!("{} connector has a missing endpoint", connector.kind),
                    ),
                    StageOutcome::Unclassified => {
                        tracing::debug!(connector = %connector.id, kind = %connector.kind, "connector kind not synchronized");
                    }
                    StageOutcome::Staged | StageOutcome::Duplicate => {}
                }
            }
        }
        resolver
    }
}

/// An optional property that cannot be read is reported and treated as unset.
fn or_unset<T>(
    read: Result<Option<T>, HostError>,
    internal_id: &str,
    report: &mut PassReport,
) -> Option<T> {
    read.unwrap_or_else(|e| {
        report.element_warning(internal_id, e);
        None
    })
}

/// Description as content; missing or blank descriptions read as empty.
fn description(description: Option<String>) -> String {
    description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_default()
}
