// error.rs — Error taxonomy for identity derivation and id assignment
//
// Configuration errors are fatal at construction. Manifest, input and
// exhaustion errors abort assignment for one module only; the run collects
// them into `AssignError`s and keeps going.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid option shape. Surfaced before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hashDigestLength must be at least 1")]
    ZeroDigestLength,

    #[error("hashFunction must not be empty")]
    EmptyHashFunction,

    #[error("unknown hash algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("unknown digest encoding '{0}' (expected hex, base64 or base64url)")]
    UnknownDigestEncoding(String),

    #[error("unknown input encoding '{0}' (expected utf8, hex, base64 or latin1)")]
    UnknownInputEncoding(String),

    #[error("enforceModules entries must not be empty")]
    EmptyEnforcedModule,

    #[error("project root {} is not an absolute path", .0.display())]
    RelativeRoot(PathBuf),

    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot determine project root: {0}")]
    ProjectRoot(std::io::Error),
}

/// A dependency (or project) directory without a usable `package.json`.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("manifest {} has no '{field}' field", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("no manifest registered for {}", dir.display())]
    NotFound { dir: PathBuf },
}

/// Failure while deriving, hashing or assigning one identifier.
#[derive(Debug, Error)]
pub enum IdError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{source} (while resolving {path})")]
    Manifest {
        path: String,
        #[source]
        source: ManifestError,
    },

    #[error("cannot decode {encoding} input: {message}")]
    InvalidInput {
        encoding: &'static str,
        message: String,
    },

    #[error(
        "digest '{digest}' exhausted at length {length} without a free prefix for '{identity}'"
    )]
    DigestExhausted {
        identity: String,
        digest: String,
        length: usize,
    },

    #[error("identity '{identity}' is already assigned in this run")]
    DuplicateIdentity { identity: String },
}

/// A per-module failure reported back to the host.
#[derive(Debug, Error)]
#[error("cannot assign id to '{identity}': {source}")]
pub struct AssignError {
    pub identity: String,
    #[source]
    pub source: IdError,
}

/// The run-completion callback could not deliver the export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write export {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot serialise export: {0}")]
    Json(#[from] serde_json::Error),
}
