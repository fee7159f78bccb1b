// plugin.rs — Host-facing orchestrator
//
// `NamedModuleIds` owns one validated configuration: options, resolved hash
// algorithm, identity deriver, and the optional run-completion callback.
// Each compilation run borrows it through an `AssignmentRun`; finishing the
// run exports the named-module registry and fires the callback once.
//
// Preconditions: options pass `IdOptions::validate`.
// Postconditions: the callback sees every run's export exactly once, after
//                 all of that run's modules are finalised.
// Failure modes: configuration errors at construction; callback failures
//                from `finish_run`.
// Side effects: manifest reads, with the reader's cache cleared at the start
//               of each run; whatever the callback does with the output
//               filesystem.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::assign::{AssignReport, AssignmentRun, PendingModule};
use crate::config::IdOptions;
use crate::context::ResolutionContext;
use crate::error::{ExportError, IdError};
use crate::hash::{Algorithm, HashPrimitive};
use crate::identity::IdentityDeriver;
use crate::layout::LayoutPolicy;
use crate::manifest::{FsManifestReader, ManifestReader};
use crate::registry::RunExport;

// ── Output filesystem ───────────────────────────────────────────────────────

/// Where export callbacks may write files.
pub trait OutputFileSystem {
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), ExportError>;
}

/// Writes through `std::fs`, creating parent directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl OutputFileSystem for StdFileSystem {
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), ExportError> {
        let write = |path: &Path| -> std::io::Result<()> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)
        };
        write(path).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Invoked once per run with (dependency-sourced identities, identity → id,
/// output filesystem).
pub type ExportCallback = Box<
    dyn FnMut(
        &BTreeSet<String>,
        &BTreeMap<String, String>,
        &dyn OutputFileSystem,
    ) -> Result<(), ExportError>,
>;

/// Write `export` as pretty JSON through `fs`.
pub fn write_export(
    fs: &dyn OutputFileSystem,
    path: &Path,
    export: &RunExport,
) -> Result<(), ExportError> {
    let mut json = export.to_json()?;
    json.push('\n');
    fs.write_file(path, json.as_bytes())
}

// ── Plugin ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CompilationOutcome {
    pub report: AssignReport,
    pub export: RunExport,
}

pub struct NamedModuleIds {
    options: IdOptions,
    algorithm: Algorithm,
    deriver: IdentityDeriver,
    callback: RefCell<Option<ExportCallback>>,
    output_fs: Box<dyn OutputFileSystem>,
}

impl NamedModuleIds {
    /// Configure against the filesystem, with `host_root` as the default
    /// project root.
    pub fn new(options: IdOptions, host_root: &Path) -> Result<Self, IdError> {
        Self::with_manifests(options, host_root, Box::new(FsManifestReader::new()))
    }

    pub fn with_manifests(
        options: IdOptions,
        host_root: &Path,
        manifests: Box<dyn ManifestReader>,
    ) -> Result<Self, IdError> {
        let algorithm = options.validate()?;
        let context = ResolutionContext::from_options(&options, host_root, manifests.as_ref())?;
        Ok(NamedModuleIds {
            options,
            algorithm,
            deriver: IdentityDeriver::new(context, manifests),
            callback: RefCell::new(None),
            output_fs: Box::new(StdFileSystem),
        })
    }

    /// Replace the named algorithm with a custom incremental primitive.
    pub fn with_hash_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn HashPrimitive> + Send + Sync + 'static,
    {
        self.algorithm = Algorithm::custom(constructor);
        self
    }

    pub fn with_callback<F>(self, callback: F) -> Self
    where
        F: FnMut(
                &BTreeSet<String>,
                &BTreeMap<String, String>,
                &dyn OutputFileSystem,
            ) -> Result<(), ExportError>
            + 'static,
    {
        self.callback.replace(Some(Box::new(callback)));
        self
    }

    pub fn with_output_fs(mut self, fs: impl OutputFileSystem + 'static) -> Self {
        self.output_fs = Box::new(fs);
        self
    }

    pub fn with_layout(mut self, layout: LayoutPolicy) -> Self {
        self.deriver = self.deriver.with_layout(layout);
        self
    }

    pub fn options(&self) -> &IdOptions {
        &self.options
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn deriver(&self) -> &IdentityDeriver {
        &self.deriver
    }

    /// Start a compilation run with empty used-id and registry state.
    /// Manifests are read afresh in every run.
    pub fn compilation(&self) -> AssignmentRun<'_> {
        self.deriver.reset_manifests();
        AssignmentRun::new(
            &self.algorithm,
            &self.deriver,
            self.options.hash_digest,
            self.options.hash_digest_length,
        )
    }

    /// End `run`, deliver its export to the callback, and return it.
    pub fn finish_run(&self, run: AssignmentRun<'_>) -> Result<RunExport, ExportError> {
        let export = run.finish();
        if let Some(callback) = self.callback.borrow_mut().as_mut() {
            callback(&export.named, &export.hashed, self.output_fs.as_ref())?;
        }
        Ok(export)
    }

    /// One full run over `modules`.
    pub fn compile<'m, I, M>(&self, modules: I) -> Result<CompilationOutcome, ExportError>
    where
        I: IntoIterator<Item = &'m mut M>,
        M: PendingModule + ?Sized + 'm,
    {
        let mut run = self.compilation();
        let report = run.assign(modules);
        let export = self.finish_run(run)?;
        Ok(CompilationOutcome { report, export })
    }
}
