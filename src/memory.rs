//! In-memory host graph.
//!
//! A complete [`HostGraph`] kept in plain maps. It backs the command-line
//! tool (as a JSON snapshot on disk) and the test suites. Failure injection
//! hooks let tests exercise the degraded paths of a pass.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{HostError, SyncError, SyncResult};
use crate::host::{
    ActorElement, Bounds, ConnectorKind, ConnectorRecord, ConnectorScope, DiagramInfo,
    DiagramKind, ElementKind, ElementMut, ElementRef, HostGraph, ModelElement,
    RequirementElement, UseCaseElement,
};

// ── Elements ─────────────────────────────────────────────────────────

/// Properties shared by every stored element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCommon {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Reads fail with `UnsupportedProperty` when set
    #[serde(skip)]
    pub unreadable: bool,
    /// Property names whose getters fail
    #[serde(skip)]
    pub unreadable_properties: HashSet<String>,
    /// Property names whose setters fail
    #[serde(skip)]
    pub locked: HashSet<String>,
}

impl ElementCommon {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    fn read<T: Clone>(&self, property: &str, value: &Option<T>) -> Result<Option<T>, HostError> {
        if self.unreadable || self.unreadable_properties.contains(property) {
            return Err(HostError::unsupported(&self.id, property));
        }
        Ok(value.clone())
    }

    fn check_writable(&self, property: &str) -> Result<(), HostError> {
        if self.locked.contains(property) {
            return Err(HostError::unsupported(&self.id, property));
        }
        Ok(())
    }
}

macro_rules! impl_model_element {
    ($ty:ty) => {
        impl ModelElement for $ty {
            fn internal_id(&self) -> &str {
                &self.common.id
            }

            fn name(&self) -> Result<Option<String>, HostError> {
                self.common.read("name", &self.common.name)
            }

            fn description(&self) -> Result<Option<String>, HostError> {
                self.common.read("description", &self.common.description)
            }

            fn user_id(&self) -> Result<Option<String>, HostError> {
                self.common.read("user_id", &self.common.user_id)
            }

            fn set_name(&mut self, name: &str) -> Result<(), HostError> {
                self.common.check_writable("name")?;
                self.common.name = Some(name.to_string());
                Ok(())
            }

            fn set_description(&mut self, description: &str) -> Result<(), HostError> {
                self.common.check_writable("description")?;
                self.common.description = Some(description.to_string());
                Ok(())
            }

            fn set_user_id(&mut self, user_id: &str) -> Result<(), HostError> {
                self.common.check_writable("user_id")?;
                self.common.user_id = Some(user_id.to_string());
                Ok(())
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemUseCase {
    #[serde(flatten)]
    pub common: ElementCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_code: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemActor {
    #[serde(flatten)]
    pub common: ElementCommon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemRequirement {
    #[serde(flatten)]
    pub common: ElementCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl_model_element!(MemUseCase);
impl_model_element!(MemActor);
impl_model_element!(MemRequirement);

impl UseCaseElement for MemUseCase {
    fn status_code(&self) -> Result<Option<i32>, HostError> {
        self.common.read("status", &self.status_code)
    }

    fn rank_code(&self) -> Result<Option<i32>, HostError> {
        self.common.read("rank", &self.rank_code)
    }

    fn set_status_code(&mut self, code: i32) -> Result<(), HostError> {
        self.common.check_writable("status")?;
        self.status_code = Some(code);
        Ok(())
    }

    fn set_rank_code(&mut self, code: i32) -> Result<(), HostError> {
        self.common.check_writable("rank")?;
        self.rank_code = Some(code);
        Ok(())
    }
}

impl ActorElement for MemActor {}

impl RequirementElement for MemRequirement {
    fn priority_code(&self) -> Result<Option<i32>, HostError> {
        self.common.read("priority", &self.priority_code)
    }

    fn status(&self) -> Result<Option<String>, HostError> {
        self.common.read("status", &self.status)
    }

    fn set_priority_code(&mut self, code: i32) -> Result<(), HostError> {
        self.common.check_writable("priority")?;
        self.priority_code = Some(code);
        Ok(())
    }

    fn set_status(&mut self, status: &str) -> Result<(), HostError> {
        self.common.check_writable("status")?;
        self.status = Some(status.to_string());
        Ok(())
    }
}

/// A stored element of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MemElement {
    UseCase(MemUseCase),
    Actor(MemActor),
    Requirement(MemRequirement),
}

impl MemElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            MemElement::UseCase(_) => ElementKind::UseCase,
            MemElement::Actor(_) => ElementKind::Actor,
            MemElement::Requirement(_) => ElementKind::Requirement,
        }
    }

    pub fn common(&self) -> &ElementCommon {
        match self {
            MemElement::UseCase(element) => &element.common,
            MemElement::Actor(element) => &element.common,
            MemElement::Requirement(element) => &element.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ElementCommon {
        match self {
            MemElement::UseCase(element) => &mut element.common,
            MemElement::Actor(element) => &mut element.common,
            MemElement::Requirement(element) => &mut element.common,
        }
    }

    fn empty(kind: ElementKind, id: String) -> Self {
        let common = ElementCommon::new(id);
        match kind {
            ElementKind::UseCase => MemElement::UseCase(MemUseCase {
                common,
                ..Default::default()
            }),
            ElementKind::Actor => MemElement::Actor(MemActor { common }),
            ElementKind::Requirement => MemElement::Requirement(MemRequirement {
                common,
                ..Default::default()
            }),
        }
    }
}

// ── Diagrams and connectors ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemConnector {
    pub id: String,
    pub kind: ConnectorKind,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemView {
    pub element: String,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemDiagram {
    pub id: String,
    pub name: String,
    pub kind: DiagramKind,
    #[serde(default)]
    pub views: Vec<MemView>,
    #[serde(default)]
    pub connectors: Vec<String>,
}

// ── Graph ────────────────────────────────────────────────────────────

/// Test and CLI host. Serializes to a JSON snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryGraph {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    elements: IndexMap<String, MemElement>,
    #[serde(default)]
    connectors: IndexMap<String, MemConnector>,
    #[serde(default)]
    diagrams: IndexMap<String, MemDiagram>,

    // ── Failure injection (never persisted) ──
    #[serde(skip)]
    unavailable: bool,
    #[serde(skip)]
    rejected_diagram_kinds: HashSet<DiagramKind>,
    #[serde(skip)]
    locked_properties: HashSet<String>,
}

impl InMemoryGraph {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            ..Default::default()
        }
    }

    /// Load a snapshot written by [`InMemoryGraph::save`].
    pub fn load(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| SyncError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> SyncResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
        std::fs::write(path, json).map_err(|e| SyncError::io(path, e))
    }

    fn fresh_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    // ── Builders ──

    /// Insert an element under its own id, replacing any previous one.
    pub fn insert(&mut self, element: MemElement) -> String {
        let id = element.common().id.clone();
        self.elements.insert(id.clone(), element);
        id
    }

    pub fn add_use_case(&mut self, id: &str, name: &str) -> String {
        let mut element = MemElement::empty(ElementKind::UseCase, id.to_string());
        element.common_mut().name = Some(name.to_string());
        self.insert(element)
    }

    pub fn add_actor(&mut self, id: &str, name: &str) -> String {
        let mut element = MemElement::empty(ElementKind::Actor, id.to_string());
        element.common_mut().name = Some(name.to_string());
        self.insert(element)
    }

    pub fn add_requirement(&mut self, id: &str, name: &str) -> String {
        let mut element = MemElement::empty(ElementKind::Requirement, id.to_string());
        element.common_mut().name = Some(name.to_string());
        self.insert(element)
    }

    pub fn set_user_id(&mut self, element_id: &str, user_id: &str) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element.common_mut().user_id = Some(user_id.to_string());
        }
    }

    pub fn add_diagram(&mut self, id: &str, name: &str, kind: DiagramKind) -> String {
        self.diagrams.insert(
            id.to_string(),
            MemDiagram {
                id: id.to_string(),
                name: name.to_string(),
                kind,
                views: Vec::new(),
                connectors: Vec::new(),
            },
        );
        id.to_string()
    }

    /// Place an element on a diagram at the origin.
    pub fn show(&mut self, diagram_id: &str, element_id: &str) {
        if let Some(diagram) = self.diagrams.get_mut(diagram_id) {
            diagram.views.push(MemView {
                element: element_id.to_string(),
                bounds: Bounds {
                    x: 0,
                    y: 0,
                    width: 0,
                    height: 0,
                },
            });
        }
    }

    /// Add a connector and show it on `diagram_id`.
    pub fn connect(
        &mut self,
        diagram_id: &str,
        id: &str,
        kind: ConnectorKind,
        from: &str,
        to: &str,
    ) -> String {
        self.connectors.insert(
            id.to_string(),
            MemConnector {
                id: id.to_string(),
                kind,
                from: Some(from.to_string()),
                to: Some(to.to_string()),
            },
        );
        if let Some(diagram) = self.diagrams.get_mut(diagram_id) {
            diagram.connectors.push(id.to_string());
        }
        id.to_string()
    }

    // ── Failure injection ──

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub fn reject_diagram_kind(&mut self, kind: DiagramKind) {
        self.rejected_diagram_kinds.insert(kind);
    }

    /// Setters for `property` fail on elements created from now on.
    pub fn lock_property(&mut self, property: &str) {
        self.locked_properties.insert(property.to_string());
    }

    pub fn make_unreadable(&mut self, element_id: &str) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element.common_mut().unreadable = true;
        }
    }

    /// Reads of one property fail on an existing element.
    pub fn make_property_unreadable(&mut self, element_id: &str, property: &str) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element
                .common_mut()
                .unreadable_properties
                .insert(property.to_string());
        }
    }

    // ── Inspection ──

    pub fn element(&self, id: &str) -> Option<&MemElement> {
        self.elements.get(id)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn connector_records(&self) -> Vec<ConnectorRecord> {
        self.connectors.values().map(MemConnector::record).collect()
    }

    pub fn diagram(&self, id: &str) -> Option<&MemDiagram> {
        self.diagrams.get(id)
    }

    fn ensure_available(&self) -> Result<(), HostError> {
        if self.unavailable {
            return Err(HostError::Unavailable("project is not open".to_string()));
        }
        Ok(())
    }
}

impl MemConnector {
    fn record(&self) -> ConnectorRecord {
        ConnectorRecord {
            id: self.id.clone(),
            kind: self.kind.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

fn element_ref(element: &MemElement) -> ElementRef<'_, InMemoryGraph> {
    match element {
        MemElement::UseCase(e) => ElementRef::UseCase(e),
        MemElement::Actor(e) => ElementRef::Actor(e),
        MemElement::Requirement(e) => ElementRef::Requirement(e),
    }
}

impl HostGraph for InMemoryGraph {
    type UseCase = MemUseCase;
    type Actor = MemActor;
    type Requirement = MemRequirement;

    fn project_name(&self) -> Result<Option<String>, HostError> {
        self.ensure_available()?;
        Ok(self.project.clone())
    }

    fn elements(&self, kinds: &[ElementKind]) -> Result<Vec<ElementRef<'_, Self>>, HostError> {
        self.ensure_available()?;
        Ok(self
            .elements
            .values()
            .filter(|e| kinds.contains(&e.kind()))
            .map(element_ref)
            .collect())
    }

    fn find_element(&self, internal_id: &str) -> Option<ElementRef<'_, Self>> {
        if self.unavailable {
            return None;
        }
        self.elements.get(internal_id).map(element_ref)
    }

    fn element_mut(&mut self, internal_id: &str) -> Option<ElementMut<'_, Self>> {
        if self.unavailable {
            return None;
        }
        self.elements
            .get_mut(internal_id)
            .map(|element| match element {
                MemElement::UseCase(e) => ElementMut::UseCase(e),
                MemElement::Actor(e) => ElementMut::Actor(e),
                MemElement::Requirement(e) => ElementMut::Requirement(e),
            })
    }

    fn diagrams(&self) -> Result<Vec<DiagramInfo>, HostError> {
        self.ensure_available()?;
        Ok(self
            .diagrams
            .values()
            .map(|d| DiagramInfo {
                id: d.id.clone(),
                name: d.name.clone(),
                kind: d.kind,
            })
            .collect())
    }

    fn diagram_elements(&self, diagram_id: &str) -> Result<Vec<String>, HostError> {
        self.ensure_available()?;
        let diagram = self
            .diagrams
            .get(diagram_id)
            .ok_or_else(|| HostError::ElementNotFound(diagram_id.to_string()))?;
        Ok(diagram.views.iter().map(|v| v.element.clone()).collect())
    }

    fn connectors(&self, scope: ConnectorScope<'_>) -> Result<Vec<ConnectorRecord>, HostError> {
        self.ensure_available()?;
        match scope {
            ConnectorScope::Project => Ok(self.connector_records()),
            ConnectorScope::Diagram(diagram_id) => {
                let diagram = self
                    .diagrams
                    .get(diagram_id)
                    .ok_or_else(|| HostError::ElementNotFound(diagram_id.to_string()))?;
                Ok(diagram
                    .connectors
                    .iter()
                    .filter_map(|id| self.connectors.get(id))
                    .map(MemConnector::record)
                    .collect())
            }
        }
    }

    fn create_element(&mut self, kind: ElementKind) -> Result<String, HostError> {
        self.ensure_available()?;
        let id = Self::fresh_id();
        let mut element = MemElement::empty(kind, id.clone());
        element.common_mut().locked = self.locked_properties.clone();
        self.elements.insert(id.clone(), element);
        Ok(id)
    }

    fn create_connector(
        &mut self,
        kind: ConnectorKind,
        from: &str,
        to: &str,
        diagram_id: &str,
    ) -> Result<String, HostError> {
        self.ensure_available()?;
        for endpoint in [from, to] {
            if !self.elements.contains_key(endpoint) {
                return Err(HostError::ElementNotFound(endpoint.to_string()));
            }
        }
        let diagram = self
            .diagrams
            .get_mut(diagram_id)
            .ok_or_else(|| HostError::ElementNotFound(diagram_id.to_string()))?;
        let id = Self::fresh_id();
        diagram.connectors.push(id.clone());
        self.connectors.insert(
            id.clone(),
            MemConnector {
                id: id.clone(),
                kind,
                from: Some(from.to_string()),
                to: Some(to.to_string()),
            },
        );
        Ok(id)
    }

    fn create_diagram(&mut self, kind: DiagramKind, name: &str) -> Result<String, HostError> {
        self.ensure_available()?;
        if self.rejected_diagram_kinds.contains(&kind) {
            return Err(HostError::rejected(
                "create_diagram",
                format!("{:?} diagrams are not supported", kind),
            ));
        }
        let id = Self::fresh_id();
        self.add_diagram(&id, name, kind);
        Ok(id)
    }

    fn add_view(
        &mut self,
        element_id: &str,
        diagram_id: &str,
        bounds: Bounds,
    ) -> Result<(), HostError> {
        self.ensure_available()?;
        if !self.elements.contains_key(element_id) {
            return Err(HostError::ElementNotFound(element_id.to_string()));
        }
        let diagram = self
            .diagrams
            .get_mut(diagram_id)
            .ok_or_else(|| HostError::ElementNotFound(diagram_id.to_string()))?;
        diagram.views.push(MemView {
            element: element_id.to_string(),
            bounds,
        });
        Ok(())
    }

    fn add_connector_view(
        &mut self,
        connector_id: &str,
        diagram_id: &str,
    ) -> Result<(), HostError> {
        self.ensure_available()?;
        if !self.connectors.contains_key(connector_id) {
            return Err(HostError::ElementNotFound(connector_id.to_string()));
        }
        let diagram = self
            .diagrams
            .get_mut(diagram_id)
            .ok_or_else(|| HostError::ElementNotFound(diagram_id.to_string()))?;
        if !diagram.connectors.iter().any(|c| c == connector_id) {
            diagram.connectors.push(connector_id.to_string());
        }
        Ok(())
    }
}
