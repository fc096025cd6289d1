//! Identifier reconciliation between internal graph ids and need ids.
//!
//! One [`IdReconciler`] lives for exactly one extraction or import pass.

use std::collections::HashMap;

use needs_types::VersionData;
use serde::{Deserialize, Serialize};

use crate::host::ElementKind;

/// Prefixes for synthesized need ids (`<PREFIX>_<internal id>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdPrefixes {
    pub use_case: String,
    pub actor: String,
    pub requirement: String,
}

impl Default for IdPrefixes {
    fn default() -> Self {
        Self {
            use_case: "UC".to_string(),
            actor: "AC".to_string(),
            requirement: "REQ".to_string(),
        }
    }
}

impl IdPrefixes {
    pub fn for_kind(&self, kind: ElementKind) -> &str {
        match kind {
            ElementKind::UseCase => &self.use_case,
            ElementKind::Actor => &self.actor,
            ElementKind::Requirement => &self.requirement,
        }
    }
}

/// Bidirectional `internal id ⇄ need id` map for one pass.
#[derive(Debug, Clone, Default)]
pub struct IdReconciler {
    prefixes: IdPrefixes,
    need_by_internal: HashMap<String, String>,
    internal_by_need: HashMap<String, String>,
}

impl IdReconciler {
    pub fn new(prefixes: IdPrefixes) -> Self {
        Self {
            prefixes,
            ..Default::default()
        }
    }

    /// Candidate need id: the user id verbatim when it has content, else
    /// `<PREFIX>_<internal id>`.
    pub fn resolve_need_id(
        &self,
        kind: ElementKind,
        internal_id: &str,
        user_id: Option<&str>,
    ) -> String {
        match user_id {
            Some(user_id) if !user_id.trim().is_empty() => user_id.to_string(),
            _ => format!("{}_{}", self.prefixes.for_kind(kind), internal_id),
        }
    }

    /// Make `candidate` unique within `needs` and bind it to `internal_id`.
    ///
    /// A taken id gets `_1`, `_2`, ... appended to the original candidate,
    /// first free suffix wins. The returned id is final for the pass.
    pub fn register_and_deduplicate(
        &mut self,
        internal_id: &str,
        candidate: &str,
        needs: &VersionData,
    ) -> String {
        let taken = |id: &str| needs.contains(id) || self.internal_by_need.contains_key(id);

        let need_id = if !taken(candidate) {
            candidate.to_string()
        } else {
            let mut counter = 1usize;
            loop {
                let attempt = format!("{}_{}", candidate, counter);
                if !taken(&attempt) {
                    break attempt;
                }
                counter += 1;
            }
        };

        if need_id != candidate {
            tracing::debug!(
                internal_id,
                candidate,
                need_id = %need_id,
                "need id collision resolved"
            );
        }
        self.register(internal_id, &need_id);
        need_id
    }

    /// Bind an internal id to a need id without deduplication.
    pub fn register(&mut self, internal_id: &str, need_id: &str) {
        self.need_by_internal
            .insert(internal_id.to_string(), need_id.to_string());
        self.internal_by_need
            .insert(need_id.to_string(), internal_id.to_string());
    }

    pub fn is_registered(&self, internal_id: &str) -> bool {
        self.need_by_internal.contains_key(internal_id)
    }

    pub fn need_id(&self, internal_id: &str) -> Option<&str> {
        self.need_by_internal.get(internal_id).map(String::as_str)
    }

    pub fn internal_id(&self, need_id: &str) -> Option<&str> {
        self.internal_by_need.get(need_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.need_by_internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.need_by_internal.is_empty()
    }
}
