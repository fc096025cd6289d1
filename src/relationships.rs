//! Relationship resolution between host connectors and need link lists.
//!
//! Connector kind to link list, with staging direction:
//!
//! | Connector | Staged as              | List         |
//! |-----------|------------------------|--------------|
//! | Include   | from → to              | `includes`   |
//! | Extend    | to → from (inverted)   | `extends`    |
//! | Associate | from → to and to → from| `associates` |
//! | Derive    | from → to              | `derive`     |
//! | Refine    | from → to              | `refines`    |
//! | Contains  | from → to              | `contains`   |
//! | Trace     | from → to              | `contains`   |
//!
//! A connector `A → B` meaning "A extends B" therefore gives `B.extends = [A]`:
//! the base element accumulates the elements extending it. [`replay_plan`]
//! applies the inverse so an import recreates `A → B`.

use std::collections::HashSet;

use indexmap::IndexMap;
use needs_types::{LinkKind, VersionData};

use crate::error::PassReport;
use crate::host::{ConnectorKind, ConnectorRecord};
use crate::reconcile::IdReconciler;

/// What [`RelationshipResolver::stage`] did with a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// New entries were staged
    Staged,
    /// Same connector, or same relationship, seen before
    Duplicate,
    /// Connector kind is not synchronized
    Unclassified,
    /// An endpoint is missing on the host side
    Dangling,
}

/// Staging maps `owner internal id → [target internal id]`, one per link
/// kind, in encounter order.
#[derive(Debug, Default)]
pub struct RelationshipResolver {
    staging: IndexMap<LinkKind, IndexMap<String, Vec<String>>>,
    seen_connectors: HashSet<String>,
    seen_edges: HashSet<(LinkKind, String, String)>,
}

impl RelationshipResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one connector and stage its link entries.
    pub fn stage(&mut self, connector: &ConnectorRecord) -> StageOutcome {
        if !self.seen_connectors.insert(connector.id.clone()) {
            return StageOutcome::Duplicate;
        }
        let Some(kind) = connector.kind.link_kind() else {
            return StageOutcome::Unclassified;
        };
        let (Some(from), Some(to)) = (connector.from.as_deref(), connector.to.as_deref()) else {
            return StageOutcome::Dangling;
        };

        let staged = match connector.kind {
            ConnectorKind::Extend => self.stage_edge(kind, to, from),
            ConnectorKind::Associate => {
                let forward = self.stage_edge(kind, from, to);
                let backward = self.stage_edge(kind, to, from);
                forward || backward
            }
            _ => self.stage_edge(kind, from, to),
        };

        if staged {
            StageOutcome::Staged
        } else {
            StageOutcome::Duplicate
        }
    }

    fn stage_edge(&mut self, kind: LinkKind, owner: &str, target: &str) -> bool {
        let key = (kind, owner.to_string(), target.to_string());
        if !self.seen_edges.insert(key) {
            return false;
        }
        self.staging
            .entry(kind)
            .or_default()
            .entry(owner.to_string())
            .or_default()
            .push(target.to_string());
        true
    }

    /// Number of staged `(kind, owner, target)` entries.
    pub fn staged_len(&self) -> usize {
        self.seen_edges.len()
    }

    /// Copy staged entries onto the needs, translating internal ids through
    /// the reconciler. Entries whose owner or target never became a need are
    /// dropped and recorded.
    pub fn project(
        self,
        reconciler: &IdReconciler,
        needs: &mut VersionData,
        report: &mut PassReport,
    ) -> usize {
        let mut projected = 0;
        for (kind, owners) in self.staging {
            for (owner, targets) in owners {
                for target in targets {
                    let owner_need = reconciler.need_id(&owner).map(str::to_string);
                    let target_need = reconciler.need_id(&target).map(str::to_string);
                    match (owner_need, target_need) {
                        (Some(owner_need), Some(target_need)) => {
                            if let Some(need) = needs.get_mut(&owner_need) {
                                if need.push_link(kind, target_need) {
                                    projected += 1;
                                }
                            }
                        }
                        (owner_need, target_need) => {
                            let missing = if owner_need.is_none() {
                                &owner
                            } else {
                                &target
                            };
                            report.relationship_skipped(
                                kind,
                                owner_need.unwrap_or_else(|| owner.clone()),
                                target_need.unwrap_or_else(|| target.clone()),
                                format!("element {} was not extracted", missing),
                                true,
                            );
                        }
                    }
                }
            }
        }
        projected
    }
}

// ── Import direction ─────────────────────────────────────────────────

/// A connector to create on import, endpoints given as need ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConnector {
    pub link: LinkKind,
    pub kind: ConnectorKind,
    pub from: String,
    pub to: String,
}

/// Connectors implied by the link lists, in need order then link-kind order.
///
/// `B.extends = [A]` becomes `Extend A → B`. Each association pair is
/// planned once, from the first need that lists it.
pub fn replay_plan(needs: &VersionData) -> Vec<PlannedConnector> {
    let mut plan = Vec::new();
    let mut associated: HashSet<(String, String)> = HashSet::new();

    for need in needs.iter() {
        for link in LinkKind::ALL {
            for target in need.links(link) {
                let (from, to) = match link {
                    LinkKind::Extends => (target.clone(), need.id.clone()),
                    _ => (need.id.clone(), target.clone()),
                };
                if link.is_symmetric() {
                    let pair = if from <= to {
                        (from.clone(), to.clone())
                    } else {
                        (to.clone(), from.clone())
                    };
                    if !associated.insert(pair) {
                        continue;
                    }
                }
                plan.push(PlannedConnector {
                    link,
                    kind: ConnectorKind::for_link(link),
                    from,
                    to,
                });
            }
        }
    }
    plan
}

/// Key identifying a relationship independent of how the host spells it:
/// Trace and Contains coincide, association endpoints are unordered.
pub fn relationship_key(link: LinkKind, from: &str, to: &str) -> (LinkKind, String, String) {
    if link.is_symmetric() && to < from {
        (link, to.to_string(), from.to_string())
    } else {
        (link, from.to_string(), to.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use needs_types::{Need, NeedType};

    fn connector(id: &str, kind: ConnectorKind, from: &str, to: &str) -> ConnectorRecord {
        ConnectorRecord {
            id: id.to_string(),
            kind,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        }
    }

    fn needs_for(ids: &[(&str, &str)]) -> (IdReconciler, VersionData) {
        let mut reconciler = IdReconciler::default();
        let mut needs = VersionData::default();
        for (internal, need_id) in ids {
            reconciler.register(internal, need_id);
            needs.add_need(Need::new(*need_id, *need_id, NeedType::UseCase));
        }
        (reconciler, needs)
    }

    #[test]
    fn test_extend_is_staged_on_the_base() {
        let (reconciler, mut needs) = needs_for(&[("a", "A"), ("b", "B")]);
        let mut resolver = RelationshipResolver::new();
        assert_eq!(
            resolver.stage(&connector("c1", ConnectorKind::Extend, "a", "b")),
            StageOutcome::Staged
        );
        resolver.project(&reconciler, &mut needs, &mut PassReport::new());
        assert_eq!(needs.get("B").unwrap().extends, vec!["A".to_string()]);
        assert!(needs.get("A").unwrap().extends.is_empty());
    }

    #[test]
    fn test_associate_is_symmetric() {
        let (reconciler, mut needs) = needs_for(&[("a", "A"), ("b", "B")]);
        let mut resolver = RelationshipResolver::new();
        resolver.stage(&connector("c1", ConnectorKind::Associate, "a", "b"));
        resolver.project(&reconciler, &mut needs, &mut PassReport::new());
        assert_eq!(needs.get("A").unwrap().associates, vec!["B".to_string()]);
        assert_eq!(needs.get("B").unwrap().associates, vec!["A".to_string()]);
    }

    #[test]
    fn test_duplicates_are_merged() {
        let mut resolver = RelationshipResolver::new();
        let c = connector("c1", ConnectorKind::Include, "a", "b");
        assert_eq!(resolver.stage(&c), StageOutcome::Staged);
        assert_eq!(resolver.stage(&c), StageOutcome::Duplicate);
        // Different connector, same relationship
        let twin = connector("c2", ConnectorKind::Include, "a", "b");
        assert_eq!(resolver.stage(&twin), StageOutcome::Duplicate);
        // Trace and Contains land in the same list
        resolver.stage(&connector("c3", ConnectorKind::Trace, "a", "b"));
        assert_eq!(
            resolver.stage(&connector("c4", ConnectorKind::Contains, "a", "b")),
            StageOutcome::Duplicate
        );
        assert_eq!(resolver.staged_len(), 2);
    }

    #[test]
    fn test_unclassified_and_dangling() {
        let mut resolver = RelationshipResolver::new();
        assert_eq!(
            resolver.stage(&connector(
                "g",
                ConnectorKind::Other("Generalization".into()),
                "a",
                "b"
            )),
            StageOutcome::Unclassified
        );
        let dangling = ConnectorRecord {
            id: "d".into(),
            kind: ConnectorKind::Derive,
            from: Some("a".into()),
            to: None,
        };
        assert_eq!(resolver.stage(&dangling), StageOutcome::Dangling);
    }

    #[test]
    fn test_unextracted_endpoint_is_dropped() {
        let (reconciler, mut needs) = needs_for(&[("a", "A")]);
        let mut resolver = RelationshipResolver::new();
        resolver.stage(&connector("c1", ConnectorKind::Derive, "a", "z"));
        let mut report = PassReport::new();
        let projected = resolver.project(&reconciler, &mut needs, &mut report);
        assert_eq!(projected, 0);
        assert!(needs.get("A").unwrap().derive.is_empty());
        assert_eq!(report.skipped_relationships(), 1);
    }

    #[test]
    fn test_replay_plan_inverts_extend_and_pairs_associations() {
        let mut needs = VersionData::default();
        let mut a = Need::new("A", "A", NeedType::UseCase);
        a.push_link(LinkKind::Associates, "B");
        a.push_link(LinkKind::Includes, "B");
        let mut b = Need::new("B", "B", NeedType::UseCase);
        b.push_link(LinkKind::Associates, "A");
        b.push_link(LinkKind::Extends, "A");
        needs.add_need(a);
        needs.add_need(b);

        let plan = replay_plan(&needs);
        let summary: Vec<_> = plan
            .iter()
            .map(|p| (p.kind.clone(), p.from.as_str(), p.to.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ConnectorKind::Include, "A", "B"),
                (ConnectorKind::Associate, "A", "B"),
                (ConnectorKind::Extend, "A", "B"),
            ]
        );
    }

    #[test]
    fn test_relationship_key_normalizes_associations() {
        assert_eq!(
            relationship_key(LinkKind::Associates, "b", "a"),
            relationship_key(LinkKind::Associates, "a", "b")
        );
        assert_ne!(
            relationship_key(LinkKind::Includes, "b", "a"),
            relationship_key(LinkKind::Includes, "a", "b")
        );
    }
}
