//! Import: needs document → host graph.
//!
//! 1. Validate the document (fatal on failure).
//! 2. Create the target diagram, falling back to a use case diagram when the
//!    host cannot create a requirements diagram.
//! 3. Lay out every importable need.
//! 4. Reuse the element named by `vp_model_id` when it exists with the right
//!    kind, otherwise create one and fill it through the setters. Each setter
//!    is attempted on its own.
//! 5. Replay link lists as connectors, reusing connectors that already exist.
//!
//! Once materialization starts nothing is fatal and nothing is rolled back.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use needs_types::{LinkKind, Need, NeedsDocument};

use crate::config::SyncConfig;
use crate::error::{HostError, PassReport, SyncError, SyncResult};
use crate::host::{
    ConnectorScope, DiagramKind, ElementKind, ElementMut, HostGraph, RequirementElement,
    UseCaseElement,
};
use crate::layout::{LayoutEngine, Point};
use crate::properties::{self, RequirementPriority, UseCaseRank, UseCaseStatus};
use crate::reconcile::IdReconciler;
use crate::relationships::{relationship_key, replay_plan};
use crate::validate::check_importable;

/// Kind of diagram to import into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportTarget {
    #[default]
    UseCaseDiagram,
    RequirementsDiagram,
}

impl ImportTarget {
    fn diagram_kind(&self) -> DiagramKind {
        match self {
            ImportTarget::UseCaseDiagram => DiagramKind::UseCase,
            ImportTarget::RequirementsDiagram => DiagramKind::Requirements,
        }
    }
}

/// Per-import settings.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub target: ImportTarget,
    /// File the document came from; its stem goes into the diagram name
    pub source_name: Option<String>,
}

/// How a need was materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Reused,
    Created,
}

/// Result of one import pass.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub diagram_id: String,
    pub diagram_name: String,
    pub diagram_kind: DiagramKind,
    /// need id → (internal id, how), in document order
    pub elements: Vec<(String, String, Materialized)>,
    pub connectors_created: usize,
    pub connectors_reused: usize,
    pub report: PassReport,
}

impl ImportOutcome {
    pub fn created(&self) -> usize {
        self.count(Materialized::Created)
    }

    pub fn reused(&self) -> usize {
        self.count(Materialized::Reused)
    }

    fn count(&self, how: Materialized) -> usize {
        self.elements.iter().filter(|(_, _, m)| *m == how).count()
    }

    /// Internal id an imported need ended up on.
    pub fn internal_id(&self, need_id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|(id, _, _)| id == need_id)
            .map(|(_, internal, _)| internal.as_str())
    }
}

/// Diagram name for an import: `<project> (<file stem>)`.
pub fn diagram_name(project: &str, default_base: &str, source_name: Option<&str>) -> String {
    let base = if project.trim().is_empty() {
        default_base
    } else {
        project
    };
    let Some(source_name) = source_name else {
        return base.to_string();
    };
    let file_name = Path::new(source_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source_name);
    let stem = if file_name.to_ascii_lowercase().ends_with(".json") {
        &file_name[..file_name.len() - 5]
    } else {
        file_name
    };
    format!("{} ({})", base, stem)
}

pub struct Importer<'a> {
    config: &'a SyncConfig,
    layout: LayoutEngine,
}

impl<'a> Importer<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self {
            config,
            layout: LayoutEngine::with_config(config.layout.clone()),
        }
    }

    /// Run one import pass.
    pub fn import<G: HostGraph>(
        &self,
        graph: &mut G,
        doc: &NeedsDocument,
        request: &ImportRequest,
    ) -> SyncResult<ImportOutcome> {
        let data = check_importable(doc)?;
        let mut report = PassReport::new();

        let name = diagram_name(
            &doc.project,
            &self.config.import_diagram_base,
            request.source_name.as_deref(),
        );
        let (diagram_id, diagram_kind) = self.create_diagram(graph, request.target, &name)?;
        tracing::info!(diagram = %name, needs = data.len(), "import started");

        // Needs we know how to materialize, in document order
        let mut importable: Vec<(&Need, ElementKind)> = Vec::with_capacity(data.len());
        for need in data.iter() {
            match need.resolved_type().as_ref().and_then(ElementKind::from_need_type) {
                Some(kind) => importable.push((need, kind)),
                None => report.element_warning(
                    need.id.as_str(),
                    format!("unrecognized need type '{}'", need.need_type),
                ),
            }
        }

        let positions = self.layout.positions(importable.iter().map(|(need, _)| *need));

        let mut session = IdReconciler::new(self.config.id_prefixes.clone());
        let mut elements = Vec::with_capacity(importable.len());

        for (need, kind) in &importable {
            let Some((internal_id, how)) = self.materialize(graph, need, *kind, &mut report) else {
                continue;
            };
            let point = positions.get(&need.id).copied().unwrap_or(Point { x: 0, y: 0 });
            let size = self.config.layout.views.for_kind(*kind);
            if let Err(e) = graph.add_view(&internal_id, &diagram_id, point.bounds(size)) {
                report.element_warning(need.id.as_str(), format!("view not added: {}", e));
            }
            session.register(&internal_id, &need.id);
            elements.push((need.id.clone(), internal_id, how));
        }

        let (connectors_created, connectors_reused) =
            self.replay_relationships(graph, doc, &diagram_id, &session, &mut report);

        let outcome = ImportOutcome {
            diagram_id,
            diagram_name: name,
            diagram_kind,
            elements,
            connectors_created,
            connectors_reused,
            report,
        };
        tracing::info!(
            diagram = %outcome.diagram_name,
            created = outcome.created(),
            reused = outcome.reused(),
            connectors_created,
            connectors_reused,
            warnings = outcome.report.issues().len(),
            "import finished"
        );
        Ok(outcome)
    }

    fn create_diagram<G: HostGraph>(
        &self,
        graph: &mut G,
        target: ImportTarget,
        name: &str,
    ) -> SyncResult<(String, DiagramKind)> {
        let kind = target.diagram_kind();
        match graph.create_diagram(kind, name) {
            Ok(id) => Ok((id, kind)),
            Err(e) if kind == DiagramKind::Requirements => {
                tracing::warn!(error = %e, "requirements diagram unavailable, using a use case diagram");
                let id = graph
                    .create_diagram(DiagramKind::UseCase, name)
                    .map_err(SyncError::Host)?;
                Ok((id, DiagramKind::UseCase))
            }
            Err(e) => Err(SyncError::Host(e)),
        }
    }

    /// Reuse or create the element for one need.
    fn materialize<G: HostGraph>(
        &self,
        graph: &mut G,
        need: &Need,
        kind: ElementKind,
        report: &mut PassReport,
    ) -> Option<(String, Materialized)> {
        if let Some(internal_ref) = need.internal_ref() {
            match graph.find_element(internal_ref) {
                Some(existing) if existing.kind() == kind => {
                    tracing::debug!(need = %need.id, internal_ref, "reusing element");
                    return Some((internal_ref.to_string(), Materialized::Reused));
                }
                Some(existing) => {
                    tracing::debug!(
                        need = %need.id,
                        internal_ref,
                        found = %existing.kind(),
                        wanted = %kind,
                        "element kind differs, creating a new one"
                    );
                }
                None => {
                    tracing::debug!(need = %need.id, internal_ref, "referenced element not found");
                }
            }
        }

        let internal_id = match graph.create_element(kind) {
            Ok(id) => id,
            Err(e) => {
                report.element_warning(need.id.as_str(), format!("element not created: {}", e));
                return None;
            }
        };

        match graph.element_mut(&internal_id) {
            Some(element) => populate(element, need, report),
            None => report.element_warning(
                need.id.as_str(),
                HostError::ElementNotFound(internal_id.clone()),
            ),
        }
        tracing::debug!(need = %need.id, internal_id = %internal_id, "element created");
        Some((internal_id, Materialized::Created))
    }

    fn replay_relationships<G: HostGraph>(
        &self,
        graph: &mut G,
        doc: &NeedsDocument,
        diagram_id: &str,
        session: &IdReconciler,
        report: &mut PassReport,
    ) -> (usize, usize) {
        let Some(data) = doc.current() else {
            return (0, 0);
        };

        let mut existing: HashMap<(LinkKind, String, String), String> = HashMap::new();
        match graph.connectors(ConnectorScope::Project) {
            Ok(connectors) => {
                for connector in connectors {
                    let (Some(link), Some(from), Some(to)) =
                        (connector.kind.link_kind(), connector.from, connector.to)
                    else {
                        continue;
                    };
                    existing
                        .entry(relationship_key(link, &from, &to))
                        .or_insert(connector.id);
                }
            }
            Err(e) => report.element_warning("connectors", e),
        }

        let mut created = 0;
        let mut reused = 0;
        let mut shown: HashSet<String> = HashSet::new();

        for planned in replay_plan(data) {
            let from = session.internal_id(&planned.from);
            let to = session.internal_id(&planned.to);
            let (Some(from), Some(to)) = (from, to) else {
                let missing = if from.is_none() {
                    &planned.from
                } else {
                    &planned.to
                };
                report.relationship_skipped(
                    planned.link,
                    planned.from.as_str(),
                    planned.to.as_str(),
                    format!("need {} was not imported", missing),
                    false,
                );
                continue;
            };

            let key = relationship_key(planned.link, from, to);
            if let Some(connector_id) = existing.get(&key) {
                if shown.insert(connector_id.clone()) {
                    if let Err(e) = graph.add_connector_view(connector_id, diagram_id) {
                        report.element_warning(connector_id.as_str(), e);
                    }
                    reused += 1;
                }
                continue;
            }

            match graph.create_connector(planned.kind.clone(), from, to, diagram_id) {
                Ok(connector_id) => {
                    existing.insert(key, connector_id.clone());
                    shown.insert(connector_id);
                    created += 1;
                }
                Err(e) => report.element_warning(
                    format!("{} {} -> {}", planned.kind, planned.from, planned.to),
                    e,
                ),
            }
        }
        (created, reused)
    }
}

/// Fill a freshly created element. Each property is attempted independently.
fn populate<G: HostGraph + ?Sized>(mut element: ElementMut<'_, G>, need: &Need, report: &mut PassReport) {
    let mut attempt = |property: &str, result: Result<(), HostError>| {
        if let Err(e) = result {
            report.element_warning(need.id.as_str(), format!("{} not set: {}", property, e));
        }
    };

    {
        let model = element.as_model_mut();
        attempt("name", model.set_name(&need.title));
        attempt("description", model.set_description(&need.content));
        attempt("user id", model.set_user_id(&need.id));
    }

    match element {
        ElementMut::UseCase(use_case) => {
            if let Some(status) = UseCaseStatus::parse(&need.status) {
                attempt("status", use_case.set_status_code(status.code()));
            }
            if let Some(rank) = UseCaseRank::parse(&need.priority) {
                attempt("rank", use_case.set_rank_code(rank.code()));
            }
        }
        ElementMut::Actor(_) => {}
        ElementMut::Requirement(requirement) => {
            attempt(
                "priority",
                requirement.set_priority_code(RequirementPriority::code_for(&need.priority)),
            );
            attempt(
                "status",
                requirement.set_status(&properties::requirement_status(Some(&need.status))),
            );
        }
    }
}
