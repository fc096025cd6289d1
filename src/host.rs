//! Host graph interface
//!
//! The model graph (elements, connectors, diagrams) is owned by the host
//! application. The sync engine only sees it through [`HostGraph`].
//!
//! Each element kind exposes a fixed capability set through its own trait
//! ([`UseCaseElement`], [`ActorElement`], [`RequirementElement`]) on top of
//! the shared [`ModelElement`] properties. Getters return `Ok(None)` when the
//! host legitimately has no value and `Err` when the element cannot be read.

use needs_types::{LinkKind, NeedType};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HostError;

// ── Kinds ────────────────────────────────────────────────────────────

/// Element kinds the engine exports and imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    UseCase,
    Actor,
    Requirement,
}

impl ElementKind {
    pub const ALL: [ElementKind; 3] = [
        ElementKind::UseCase,
        ElementKind::Actor,
        ElementKind::Requirement,
    ];

    /// Origin label written to `element_type`.
    pub fn element_type(&self) -> &'static str {
        match self {
            ElementKind::UseCase => "UseCase",
            ElementKind::Actor => "Actor",
            ElementKind::Requirement => "Requirement",
        }
    }

    pub fn need_type(&self) -> NeedType {
        match self {
            ElementKind::UseCase => NeedType::UseCase,
            ElementKind::Actor => NeedType::Actor,
            ElementKind::Requirement => NeedType::Requirement,
        }
    }

    pub fn from_need_type(need_type: &NeedType) -> Option<Self> {
        match need_type {
            NeedType::UseCase => Some(ElementKind::UseCase),
            NeedType::Actor => Some(ElementKind::Actor),
            NeedType::Requirement => Some(ElementKind::Requirement),
            NeedType::Other(_) => None,
        }
    }

    /// Fixed tags per kind.
    pub fn tags(&self) -> [&'static str; 2] {
        match self {
            ElementKind::UseCase => ["usecase", "functional"],
            ElementKind::Actor => ["act", "stakeholder"],
            ElementKind::Requirement => ["requirement", "functional"],
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_type())
    }
}

/// Connector kinds found on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    Include,
    Extend,
    Associate,
    Derive,
    Refine,
    Contains,
    Trace,
    /// Anything the engine does not synchronize (generalization, dependency, ...)
    Other(String),
}

impl ConnectorKind {
    /// Link list a connector of this kind feeds; `None` for unsynchronized kinds.
    pub fn link_kind(&self) -> Option<LinkKind> {
        match self {
            ConnectorKind::Include => Some(LinkKind::Includes),
            ConnectorKind::Extend => Some(LinkKind::Extends),
            ConnectorKind::Associate => Some(LinkKind::Associates),
            ConnectorKind::Derive => Some(LinkKind::Derive),
            ConnectorKind::Refine => Some(LinkKind::Refines),
            ConnectorKind::Contains | ConnectorKind::Trace => Some(LinkKind::Contains),
            ConnectorKind::Other(_) => None,
        }
    }

    /// Connector created when replaying a link list.
    pub fn for_link(kind: LinkKind) -> Self {
        match kind {
            LinkKind::Includes => ConnectorKind::Include,
            LinkKind::Extends => ConnectorKind::Extend,
            LinkKind::Associates => ConnectorKind::Associate,
            LinkKind::Contains => ConnectorKind::Contains,
            LinkKind::Derive => ConnectorKind::Derive,
            LinkKind::Refines => ConnectorKind::Refine,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConnectorKind::Include => "Include",
            ConnectorKind::Extend => "Extend",
            ConnectorKind::Associate => "Associate",
            ConnectorKind::Derive => "Derive",
            ConnectorKind::Refine => "Refine",
            ConnectorKind::Contains => "Contains",
            ConnectorKind::Trace => "Trace",
            ConnectorKind::Other(label) => label,
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramKind {
    UseCase,
    Requirements,
}

// ── Records ──────────────────────────────────────────────────────────

/// A connector as read from the host. Endpoints are internal element ids;
/// either may be missing when the connector is dangling on the host side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub id: String,
    pub kind: ConnectorKind,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramInfo {
    pub id: String,
    pub name: String,
    pub kind: DiagramKind,
}

/// Placement of a view on a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Where connectors are enumerated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorScope<'a> {
    Project,
    Diagram(&'a str),
}

// ── Element capabilities ─────────────────────────────────────────────

/// Properties every synchronized element exposes.
pub trait ModelElement {
    /// Opaque host identifier, never user-visible.
    fn internal_id(&self) -> &str;
    fn name(&self) -> Result<Option<String>, HostError>;
    fn description(&self) -> Result<Option<String>, HostError>;
    /// Human-assigned identifier.
    fn user_id(&self) -> Result<Option<String>, HostError>;

    fn set_name(&mut self, name: &str) -> Result<(), HostError>;
    fn set_description(&mut self, description: &str) -> Result<(), HostError>;
    fn set_user_id(&mut self, user_id: &str) -> Result<(), HostError>;
}

pub trait UseCaseElement: ModelElement {
    /// Status code, see [`crate::properties::UseCaseStatus`].
    fn status_code(&self) -> Result<Option<i32>, HostError>;
    /// Rank code, see [`crate::properties::UseCaseRank`].
    fn rank_code(&self) -> Result<Option<i32>, HostError>;

    fn set_status_code(&mut self, code: i32) -> Result<(), HostError>;
    fn set_rank_code(&mut self, code: i32) -> Result<(), HostError>;
}

pub trait ActorElement: ModelElement {}

pub trait RequirementElement: ModelElement {
    /// Priority code, see [`crate::properties::RequirementPriority`].
    fn priority_code(&self) -> Result<Option<i32>, HostError>;
    fn status(&self) -> Result<Option<String>, HostError>;

    fn set_priority_code(&mut self, code: i32) -> Result<(), HostError>;
    fn set_status(&mut self, status: &str) -> Result<(), HostError>;
}

/// Borrowed element, typed by kind.
pub enum ElementRef<'a, G: HostGraph + ?Sized> {
    UseCase(&'a G::UseCase),
    Actor(&'a G::Actor),
    Requirement(&'a G::Requirement),
}

impl<'a, G: HostGraph + ?Sized> ElementRef<'a, G> {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementRef::UseCase(_) => ElementKind::UseCase,
            ElementRef::Actor(_) => ElementKind::Actor,
            ElementRef::Requirement(_) => ElementKind::Requirement,
        }
    }

    pub fn as_model(&self) -> &'a dyn ModelElement {
        match *self {
            ElementRef::UseCase(element) => element,
            ElementRef::Actor(element) => element,
            ElementRef::Requirement(element) => element,
        }
    }

    pub fn internal_id(&self) -> &'a str {
        self.as_model().internal_id()
    }
}

/// Mutably borrowed element, typed by kind.
pub enum ElementMut<'a, G: HostGraph + ?Sized> {
    UseCase(&'a mut G::UseCase),
    Actor(&'a mut G::Actor),
    Requirement(&'a mut G::Requirement),
}

impl<'a, G: HostGraph + ?Sized> ElementMut<'a, G> {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementMut::UseCase(_) => ElementKind::UseCase,
            ElementMut::Actor(_) => ElementKind::Actor,
            ElementMut::Requirement(_) => ElementKind::Requirement,
        }
    }

    pub fn as_model_mut(&mut self) -> &mut dyn ModelElement {
        match self {
            ElementMut::UseCase(element) => &mut **element,
            ElementMut::Actor(element) => &mut **element,
            ElementMut::Requirement(element) => &mut **element,
        }
    }
}

// ── Graph ────────────────────────────────────────────────────────────

/// The host's project graph.
///
/// Enumeration methods fail only when the graph as a whole is unreachable.
/// The engine never deletes anything through this interface.
pub trait HostGraph {
    type UseCase: UseCaseElement + 'static;
    type Actor: ActorElement + 'static;
    type Requirement: RequirementElement + 'static;

    fn project_name(&self) -> Result<Option<String>, HostError>;

    /// Every element of the given kinds, project-wide, in host order.
    fn elements(&self, kinds: &[ElementKind]) -> Result<Vec<ElementRef<'_, Self>>, HostError>;

    fn find_element(&self, internal_id: &str) -> Option<ElementRef<'_, Self>>;
    fn element_mut(&mut self, internal_id: &str) -> Option<ElementMut<'_, Self>>;

    fn diagrams(&self) -> Result<Vec<DiagramInfo>, HostError>;

    /// Internal ids of the elements shown on a diagram.
    fn diagram_elements(&self, diagram_id: &str) -> Result<Vec<String>, HostError>;

    fn connectors(&self, scope: ConnectorScope<'_>) -> Result<Vec<ConnectorRecord>, HostError>;

    /// Create an element and return its internal id.
    fn create_element(&mut self, kind: ElementKind) -> Result<String, HostError>;

    /// Create a connector shown on `diagram_id` and return its id.
    fn create_connector(
        &mut self,
        kind: ConnectorKind,
        from: &str,
        to: &str,
        diagram_id: &str,
    ) -> Result<String, HostError>;

    fn create_diagram(&mut self, kind: DiagramKind, name: &str) -> Result<String, HostError>;

    /// Add an auxiliary view of an existing element to a diagram.
    fn add_view(&mut self, element_id: &str, diagram_id: &str, bounds: Bounds)
        -> Result<(), HostError>;

    /// Show an existing connector on a diagram.
    fn add_connector_view(&mut self, connector_id: &str, diagram_id: &str)
        -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_and_contains_share_a_link_list() {
        assert_eq!(ConnectorKind::Trace.link_kind(), Some(LinkKind::Contains));
        assert_eq!(ConnectorKind::Contains.link_kind(), Some(LinkKind::Contains));
        assert_eq!(
            ConnectorKind::for_link(LinkKind::Contains),
            ConnectorKind::Contains
        );
        assert_eq!(
            ConnectorKind::Other("Generalization".into()).link_kind(),
            None
        );
    }

    #[test]
    fn test_link_kinds_round_trip_through_connectors() {
        for kind in LinkKind::ALL {
            assert_eq!(ConnectorKind::for_link(kind).link_kind(), Some(kind));
        }
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ElementKind::Actor.element_type(), "Actor");
        assert_eq!(ElementKind::Requirement.need_type(), NeedType::Requirement);
        assert_eq!(
            ElementKind::from_need_type(&NeedType::UseCase),
            Some(ElementKind::UseCase)
        );
        assert_eq!(ElementKind::UseCase.tags(), ["usecase", "functional"]);
    }
}
