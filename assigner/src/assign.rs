// assign.rs — Collision-resolving id assignment
//
// One `AssignmentRun` per compilation run. For every pending module without
// an id: derive and hash its identity, truncate the digest to the configured
// length, and grow the prefix one character at a time until it is unused.
//
// Preconditions: the deriver and algorithm come from a validated configuration.
// Postconditions: ids assigned within a run are pairwise distinct; an id slot
//                 is written at most once, with the final value.
// Failure modes: per-module `AssignError`s are collected in the report and do
//                not stop the rest of the batch.
// Side effects: writes module id slots; manifest reads through the deriver.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::DigestEncoding;
use crate::context::ResolutionContext;
use crate::error::{AssignError, IdError};
use crate::hash::fast::fast_digest;
use crate::hash::{create_hash, Algorithm};
use crate::identity::IdentityDeriver;
use crate::registry::{is_dependency_sourced, NamedModuleRegistry, RunExport};

// ── Pending modules ─────────────────────────────────────────────────────────

/// A module owned by the host graph that may need an id.
pub trait PendingModule {
    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
    /// Raw identity for `context`, or `None` if the module has none.
    fn lib_ident(&self, context: &ResolutionContext) -> Option<String>;
}

impl<M: PendingModule + ?Sized> PendingModule for Box<M> {
    fn id(&self) -> Option<&str> {
        (**self).id()
    }

    fn set_id(&mut self, id: String) {
        (**self).set_id(id)
    }

    fn lib_ident(&self, context: &ResolutionContext) -> Option<String> {
        (**self).lib_ident(context)
    }
}

/// A module identified by its request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    pub request: String,
    pub id: Option<String>,
}

impl SourceModule {
    pub fn new(request: impl Into<String>) -> Self {
        SourceModule {
            request: request.into(),
            id: None,
        }
    }
}

impl PendingModule for SourceModule {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn lib_ident(&self, _context: &ResolutionContext) -> Option<String> {
        Some(self.request.clone())
    }
}

// ── Run state ───────────────────────────────────────────────────────────────

/// Final ids already handed out in the current run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsedIds(HashSet<String>);

impl UsedIds {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns false if `id` was already present.
    pub fn insert(&mut self, id: String) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct AssignReport {
    pub assigned: usize,
    /// Modules that already had an id or expose no identity.
    pub skipped: usize,
    pub failures: Vec<AssignError>,
}

impl AssignReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct AssignmentRun<'a> {
    algorithm: &'a Algorithm,
    deriver: &'a IdentityDeriver,
    encoding: DigestEncoding,
    digest_length: usize,
    used: UsedIds,
    /// Semantic identity → unrewritten path of the dependency that holds it.
    claimed: HashMap<String, String>,
    registry: NamedModuleRegistry,
    assigned: usize,
    skipped: usize,
}

impl<'a> AssignmentRun<'a> {
    pub fn new(
        algorithm: &'a Algorithm,
        deriver: &'a IdentityDeriver,
        encoding: DigestEncoding,
        digest_length: usize,
    ) -> Self {
        AssignmentRun {
            algorithm,
            deriver,
            encoding,
            digest_length,
            used: UsedIds::default(),
            claimed: HashMap::new(),
            registry: NamedModuleRegistry::new(),
            assigned: 0,
            skipped: 0,
        }
    }

    /// Assign ids to every module in `modules` whose slot is empty.
    pub fn assign<'m, I, M>(&mut self, modules: I) -> AssignReport
    where
        I: IntoIterator<Item = &'m mut M>,
        M: PendingModule + ?Sized + 'm,
    {
        let mut report = AssignReport::default();
        for module in modules {
            if module.id().is_some() {
                report.skipped += 1;
                continue;
            }
            let Some(identity) = module.lib_ident(self.deriver.context()) else {
                report.skipped += 1;
                continue;
            };
            match self.assign_one(&identity) {
                Ok(id) => {
                    module.set_id(id);
                    report.assigned += 1;
                }
                Err(source) => {
                    let err = AssignError { identity, source };
                    warn!(error = %err, "module left without id");
                    report.failures.push(err);
                }
            }
        }
        debug!(
            assigned = report.assigned,
            skipped = report.skipped,
            failed = report.failures.len(),
            "batch assigned"
        );
        self.assigned += report.assigned;
        self.skipped += report.skipped;
        report
    }

    /// Compute, reserve and return the final id for one raw identity.
    pub fn assign_one(&mut self, identity: &str) -> Result<String, IdError> {
        let mut hash = create_hash(self.algorithm, self.deriver);
        hash.update_str(identity)?;
        if !hash.is_semantic() {
            let digest = hash.digest(self.encoding);
            return self.reserve_prefix(identity, &digest);
        }
        let pure = hash.pure_identity().map(str::to_owned);
        let fallback = hash.fallback_identity().map(str::to_owned);
        let mut semantic = hash.digest(self.encoding);

        if let Some(pure) = pure {
            // already the fast digest of the pure identity
            let id = self.reserve_prefix(identity, &semantic)?;
            self.registry.record_hashed(pure, id.as_str());
            return Ok(id);
        }

        // two installs of one package can blur to the same identity
        if let Some(own) = &fallback {
            if self.claimed.get(&semantic).is_some_and(|owner| owner != own) {
                debug!(identity = %semantic, fallback = %own, "identity taken by another install");
                semantic = own.clone();
            }
        }

        let id = if self.deriver.context().named_to_hash {
            let digest = fast_digest(&semantic, self.encoding);
            let id = self.reserve_prefix(identity, &digest)?;
            self.registry.record_hashed(semantic.as_str(), id.as_str());
            id
        } else {
            if !self.used.insert(semantic.clone()) {
                return Err(IdError::DuplicateIdentity { identity: semantic });
            }
            semantic.clone()
        };

        if let Some(own) = fallback {
            self.claimed.entry(semantic.clone()).or_insert(own);
        }
        if is_dependency_sourced(&semantic) {
            self.registry.record_named(semantic);
        }
        Ok(id)
    }

    fn reserve_prefix(&mut self, identity: &str, digest: &str) -> Result<String, IdError> {
        let id = self.shortest_free_prefix(identity, digest)?;
        self.used.insert(id.clone());
        Ok(id)
    }

    /// Shortest prefix of `digest`, at least `digest_length` characters long
    /// (or the whole digest, if shorter), that no earlier module received.
    fn shortest_free_prefix(&self, identity: &str, digest: &str) -> Result<String, IdError> {
        let chars: Vec<char> = digest.chars().collect();
        let mut len = self.digest_length.min(chars.len());
        while len <= chars.len() {
            let candidate: String = chars[..len].iter().collect();
            if !self.used.contains(&candidate) {
                if len > self.digest_length {
                    debug!(identity, id = %candidate, len, "prefix grown after collision");
                }
                return Ok(candidate);
            }
            len += 1;
        }
        Err(IdError::DigestExhausted {
            identity: identity.to_string(),
            digest: digest.to_string(),
            length: chars.len(),
        })
    }

    pub fn used_ids(&self) -> &UsedIds {
        &self.used
    }

    pub fn registry(&self) -> &NamedModuleRegistry {
        &self.registry
    }

    /// End the run and hand back its export.
    pub fn finish(self) -> RunExport {
        info!(
            assigned = self.assigned,
            skipped = self.skipped,
            named = self.registry.named().len(),
            "run finished"
        );
        self.registry.into_export()
    }
}
