// manifest.rs — Package manifest lookup
//
// The identity deriver only needs `{name, version}` from a package directory.
// Hosts supply that through `ManifestReader`; the filesystem reader parses
// `package.json` with serde_json and caches successful reads.
//
// Preconditions: `dir` is the package directory, not the manifest file.
// Postconditions: a returned manifest has a non-empty name and version.
// Failure modes: missing, unreadable or incomplete manifests → `ManifestError`.
// Side effects: `FsManifestReader` reads files.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ManifestError;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
}

#[derive(Deserialize)]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
}

/// Synchronous "read manifest by directory" capability.
pub trait ManifestReader {
    fn read_manifest(&self, dir: &Path) -> Result<Manifest, ManifestError>;

    /// Forget anything remembered from earlier reads. Called when a
    /// compilation run starts.
    fn reset(&self) {}
}

impl<R: ManifestReader + ?Sized> ManifestReader for Box<R> {
    fn read_manifest(&self, dir: &Path) -> Result<Manifest, ManifestError> {
        (**self).read_manifest(dir)
    }

    fn reset(&self) {
        (**self).reset()
    }
}

/// Parse the text of a `package.json`.
pub fn parse_manifest(text: &str, path: &Path) -> Result<Manifest, ManifestError> {
    let raw: RawManifest = serde_json::from_str(text).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let field = |value: Option<String>, field: &'static str| {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ManifestError::MissingField {
                path: path.to_path_buf(),
                field,
            })
    };
    Ok(Manifest {
        name: field(raw.name, "name")?,
        version: field(raw.version, "version")?,
    })
}

// ── Filesystem reader ───────────────────────────────────────────────────────

/// Reads `<dir>/package.json`. Successful reads are cached until `reset`.
#[derive(Debug, Default)]
pub struct FsManifestReader {
    cache: RefCell<HashMap<PathBuf, Manifest>>,
}

impl FsManifestReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl ManifestReader for FsManifestReader {
    fn read_manifest(&self, dir: &Path) -> Result<Manifest, ManifestError> {
        if let Some(hit) = self.cache.borrow().get(dir) {
            return Ok(hit.clone());
        }
        let path = dir.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let manifest = parse_manifest(&text, &path)?;
        tracing::trace!(dir = %dir.display(), name = %manifest.name, "manifest loaded");
        self.cache
            .borrow_mut()
            .insert(dir.to_path_buf(), manifest.clone());
        Ok(manifest)
    }

    fn reset(&self) {
        self.cache.borrow_mut().clear();
    }
}

// ── In-memory reader ────────────────────────────────────────────────────────

/// Manifests registered up front, keyed by package directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryManifestReader {
    manifests: HashMap<PathBuf, Manifest>,
}

impl MemoryManifestReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dir: impl Into<PathBuf>, name: &str, version: &str) {
        self.manifests.insert(
            dir.into(),
            Manifest {
                name: name.to_string(),
                version: version.to_string(),
            },
        );
    }

    pub fn with(mut self, dir: impl Into<PathBuf>, name: &str, version: &str) -> Self {
        self.insert(dir, name, version);
        self
    }
}

impl ManifestReader for MemoryManifestReader {
    fn read_manifest(&self, dir: &Path) -> Result<Manifest, ManifestError> {
        self.manifests
            .get(dir)
            .cloned()
            .ok_or_else(|| ManifestError::NotFound {
                dir: dir.to_path_buf(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_complete_manifest() {
        let m = parse_manifest(
            r#"{"name": "@babel/core", "version": "7.22.5", "main": "lib/index.js"}"#,
            Path::new("package.json"),
        )
        .unwrap();
        assert_eq!(m.name, "@babel/core");
        assert_eq!(m.version, "7.22.5");
    }

    #[test]
    fn missing_version_is_an_error() {
        let err = parse_manifest(r#"{"name": "foo"}"#, Path::new("package.json")).unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { field: "version", .. }));

        let err = parse_manifest(r#"{"name": "", "version": "1.0.0"}"#, Path::new("package.json"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { field: "name", .. }));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_manifest("{ name: foo", Path::new("package.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn fs_reader_caches_successful_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"name": "foo", "version": "1.2.3"}"#,
        )
        .unwrap();

        let reader = FsManifestReader::new();
        let first = reader.read_manifest(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(MANIFEST_FILE)).unwrap();
        let second = reader.read_manifest(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(reader.cached(), 1);
    }

    #[test]
    fn fs_reader_rereads_after_reset() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join(MANIFEST_FILE);
        std::fs::write(&manifest, r#"{"name": "foo", "version": "2.14.3"}"#).unwrap();

        let reader = FsManifestReader::new();
        assert_eq!(reader.read_manifest(dir.path()).unwrap().version, "2.14.3");
        std::fs::write(&manifest, r#"{"name": "foo", "version": "3.0.0"}"#).unwrap();
        assert_eq!(reader.read_manifest(dir.path()).unwrap().version, "2.14.3");

        reader.reset();
        assert_eq!(reader.cached(), 0);
        assert_eq!(reader.read_manifest(dir.path()).unwrap().version, "3.0.0");
    }

    #[test]
    fn fs_reader_reports_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsManifestReader::new().read_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn memory_reader_lookup() {
        let reader = MemoryManifestReader::new().with("/app/node_modules/foo", "foo", "2.14.3");
        assert_eq!(
            reader
                .read_manifest(Path::new("/app/node_modules/foo"))
                .unwrap()
                .version,
            "2.14.3"
        );
        assert!(matches!(
            reader.read_manifest(Path::new("/app/node_modules/bar")),
            Err(ManifestError::NotFound { .. })
        ));
    }
}
