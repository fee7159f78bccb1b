// registry.rs — Named-module registry and the per-run export
//
// Accumulates, for one compilation run, the semantic identities that came
// from dependency directories and the identity → final id mapping recorded
// when identities are re-hashed. Exported once, when the run finishes.
//
// Postconditions: ordering of the export is deterministic (sorted).
// Side effects: none.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::layout::DEPENDENCY_CONTAINER;

/// Whether a semantic digest names a file inside a dependency directory
/// (`/node_modules/...`).
pub fn is_dependency_sourced(identity: &str) -> bool {
    identity
        .strip_prefix('/')
        .and_then(|rest| rest.strip_prefix(DEPENDENCY_CONTAINER))
        .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NamedModuleRegistry {
    named: BTreeSet<String>,
    hashed: BTreeMap<String, String>,
}

impl NamedModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_named(&mut self, identity: impl Into<String>) {
        self.named.insert(identity.into());
    }

    /// Keeps the first mapping for an identity.
    pub fn record_hashed(&mut self, identity: impl Into<String>, id: impl Into<String>) {
        self.hashed.entry(identity.into()).or_insert_with(|| id.into());
    }

    pub fn named(&self) -> &BTreeSet<String> {
        &self.named
    }

    pub fn hashed(&self) -> &BTreeMap<String, String> {
        &self.hashed
    }

    pub fn into_export(self) -> RunExport {
        RunExport {
            named: self.named,
            hashed: self.hashed,
        }
    }
}

/// What the host receives when a run completes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunExport {
    /// Dependency-sourced semantic identities.
    pub named: BTreeSet<String>,
    /// Semantic or pure identity → final id.
    pub hashed: BTreeMap<String, String>,
}

impl RunExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
