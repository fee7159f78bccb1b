// modid — Stable, collision-free module identifiers
//
// Library root. Leaves first: paths and layouts, manifests and context,
// identity derivation, hash strategies, then assignment and the host plugin.

pub mod assign;
pub mod config;
pub mod context;
pub mod error;
pub mod hash;
pub mod identity;
pub mod layout;
pub mod manifest;
pub mod path;
pub mod plugin;
pub mod registry;

pub use assign::{AssignReport, AssignmentRun, PendingModule, SourceModule};
pub use config::{DigestEncoding, IdOptions, InputEncoding};
pub use error::{AssignError, ConfigError, ExportError, IdError, ManifestError};
pub use plugin::{NamedModuleIds, OutputFileSystem, StdFileSystem};
pub use registry::RunExport;
