// identity.rs — Semantic path identity derivation
//
// Rewrites a module's raw identity (usually an absolute or project-relative
// path) into a canonical, environment-independent identity string:
//
//   global install dir   →  @npm-global-dir/<suffix>
//   project dependency   →  /node_modules/<name>@<blurred version>/<file>
//   project source       →  /<relative path>   (optionally <project name>/…)
//   elsewhere on disk    →  pure identity `*/node_modules/<name>/<file>`
//   not a path           →  opaque
//
// Preconditions: the context's roots are canonical absolute paths.
// Postconditions: output is a pure function of (raw, context, manifests).
// Failure modes: a dependency directory without a readable manifest aborts
//                derivation with `IdError::Manifest`.
// Side effects: manifest reads through the configured reader.

use tracing::debug;

use crate::context::ResolutionContext;
use crate::error::IdError;
use crate::layout::{LayoutPolicy, DEPENDENCY_CONTAINER};
use crate::manifest::{Manifest, ManifestReader};
use crate::path::{rooted, CanonicalPath};

/// Replaces the global install directory in identities.
pub const GLOBAL_DIR_MARKER: &str = "@npm-global-dir";

/// Replaces everything before a dependency boundary in pure identities.
pub const WILDCARD_MARKER: &str = "*";

/// Result of deriving one raw identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Under the global install directory.
    Global(String),
    /// Under the project root. `dependency` carries the manifest of the
    /// rewritten dependency, if any; `fallback` is then the unrewritten
    /// project-relative path, used when two installs collapse onto one
    /// identity.
    Project {
        identity: String,
        dependency: Option<Manifest>,
        fallback: Option<String>,
    },
    /// Absolute path outside both roots; hashed by the caller.
    OutOfTree { pure: String },
    /// Not a filesystem path.
    Opaque,
}

impl Identity {
    /// The canonical string, for the variants that produce one verbatim.
    pub fn canonical(&self) -> Option<&str> {
        match self {
            Identity::Global(s) => Some(s),
            Identity::Project { identity, .. } => Some(identity),
            Identity::OutOfTree { .. } | Identity::Opaque => None,
        }
    }
}

/// Keep the first dot-separated component, replace the rest with `x`.
pub fn blur_version(version: &str) -> String {
    version
        .split('.')
        .enumerate()
        .map(|(i, part)| if i == 0 { part } else { "x" })
        .collect::<Vec<_>>()
        .join(".")
}

/// Loader chains, queries and multi-part requests are never plain paths.
fn has_request_syntax(raw: &str) -> bool {
    raw.contains(['!', '|', '?'])
}

pub struct IdentityDeriver {
    context: ResolutionContext,
    layout: LayoutPolicy,
    manifests: Box<dyn ManifestReader>,
}

impl IdentityDeriver {
    pub fn new(context: ResolutionContext, manifests: Box<dyn ManifestReader>) -> Self {
        IdentityDeriver {
            context,
            layout: LayoutPolicy::default(),
            manifests,
        }
    }

    pub fn with_layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    pub fn layout(&self) -> &LayoutPolicy {
        &self.layout
    }

    /// Drop cached manifests so a new run sees upgraded dependencies.
    pub fn reset_manifests(&self) {
        self.manifests.reset();
    }

    pub fn derive(&self, raw: &str) -> Result<Identity, IdError> {
        if has_request_syntax(raw) {
            return Ok(Identity::Opaque);
        }
        let Some(path) = CanonicalPath::resolve(raw, &self.context.project_root) else {
            return Ok(Identity::Opaque);
        };

        if let Some(global) = &self.context.global_dir {
            if let Some(rest) = path.strip_prefix(global) {
                return Ok(Identity::Global(format!("{}{}", GLOBAL_DIR_MARKER, rooted(rest))));
            }
        }

        if let Some(rest) = path.strip_prefix(&self.context.project_root) {
            return self.derive_in_project(&path, rest);
        }

        let pure = self.pure_identity(&path);
        debug!(path = %path, pure = %pure, "out-of-tree module");
        Ok(Identity::OutOfTree { pure })
    }

    fn derive_in_project(
        &self,
        path: &CanonicalPath,
        rest: &[String],
    ) -> Result<Identity, IdError> {
        let Some(dep) = self.layout.find(rest) else {
            let relative = rooted(rest);
            let identity = match (&self.context.project_name, self.context.add_source_prefix) {
                (Some(name), true) => format!("{}{}", name, relative),
                _ => relative,
            };
            return Ok(Identity::Project {
                identity,
                dependency: None,
                fallback: None,
            });
        };

        let package_dir = self.context.project_root.join(&rest[..dep.package_end]);
        let manifest = self
            .manifests
            .read_manifest(&package_dir.to_path_buf())
            .map_err(|source| IdError::Manifest {
                path: path.to_string(),
                source,
            })?;

        let version = if self.context.is_enforced(&manifest.name) {
            manifest.version.clone()
        } else {
            blur_version(&manifest.version)
        };
        let versioned = format!("{}@{}", manifest.name, version);

        let mut parts: Vec<&str> = rest[..dep.container].iter().map(String::as_str).collect();
        parts.push(DEPENDENCY_CONTAINER);
        parts.push(&versioned);
        parts.extend(rest[dep.package_end..].iter().map(String::as_str));
        let identity = rooted(&parts);

        debug!(
            path = %path,
            convention = ?dep.convention,
            package = %manifest.name,
            identity = %identity,
            "dependency identity"
        );
        Ok(Identity::Project {
            identity,
            dependency: Some(manifest),
            fallback: Some(rooted(rest)),
        })
    }

    /// Collapse everything before the dependency boundary into `*`. Paths
    /// with no recognisable dependency keep their full canonical form.
    fn pure_identity(&self, path: &CanonicalPath) -> String {
        let components = path.components();
        match self.layout.find(components) {
            Some(dep) => {
                let mut parts = vec![DEPENDENCY_CONTAINER, dep.name_hint.as_str()];
                parts.extend(components[dep.package_end..].iter().map(String::as_str));
                format!("{}{}", WILDCARD_MARKER, rooted(&parts))
            }
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MemoryManifestReader;
    use std::path::Path;

    fn deriver(reader: MemoryManifestReader) -> IdentityDeriver {
        let ctx = ResolutionContext::new(Path::new("/app"))
            .unwrap()
            .with_global_dir(Path::new("/usr/local/lib/node_modules"))
            .unwrap();
        IdentityDeriver::new(ctx, Box::new(reader))
    }

    fn canonical(d: &IdentityDeriver, raw: &str) -> String {
        d.derive(raw).unwrap().canonical().unwrap().to_string()
    }

    #[test]
    fn blur_keeps_major_only() {
        assert_eq!(blur_version("2.14.3"), "2.x.x");
        assert_eq!(blur_version("1.0.0-beta.1"), "1.x.x.x");
        assert_eq!(blur_version("7"), "7");
    }

    #[test]
    fn global_dir_rewrite() {
        let d = deriver(MemoryManifestReader::new());
        assert_eq!(
            canonical(&d, "/usr/local/lib/node_modules/bar/baz.js"),
            "@npm-global-dir/bar/baz.js"
        );
    }

    #[test]
    fn project_source_is_root_relative() {
        let d = deriver(MemoryManifestReader::new());
        assert_eq!(canonical(&d, "/app/src/index.js"), "/src/index.js");
        assert_eq!(canonical(&d, "./src/../lib/a.js"), "/lib/a.js");
    }

    #[test]
    fn source_prefix_uses_project_name() {
        let ctx = ResolutionContext::new(Path::new("/app"))
            .unwrap()
            .with_project_name("my-app")
            .with_source_prefix(true);
        let d = IdentityDeriver::new(ctx, Box::new(MemoryManifestReader::new()));
        assert_eq!(canonical(&d, "/app/src/index.js"), "my-app/src/index.js");
    }

    #[test]
    fn dependency_version_is_blurred() {
        let d = deriver(MemoryManifestReader::new().with("/app/node_modules/foo", "foo", "2.14.3"));
        let id = d.derive("/app/node_modules/foo/lib/index.js").unwrap();
        assert_eq!(
            id,
            Identity::Project {
                identity: "/node_modules/foo@2.x.x/lib/index.js".into(),
                dependency: Some(Manifest {
                    name: "foo".into(),
                    version: "2.14.3".into()
                }),
                fallback: Some("/node_modules/foo/lib/index.js".into()),
            }
        );
    }

    #[test]
    fn missing_dependency_manifest_aborts() {
        let d = deriver(MemoryManifestReader::new());
        let err = d.derive("/app/node_modules/foo/index.js").unwrap_err();
        match err {
            IdError::Manifest { path, .. } => assert_eq!(path, "/app/node_modules/foo/index.js"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_tree_collapses_to_wildcard() {
        let d = deriver(MemoryManifestReader::new());
        assert_eq!(
            d.derive("/home/dev/linked/node_modules/foo/index.js").unwrap(),
            Identity::OutOfTree {
                pure: "*/node_modules/foo/index.js".into()
            }
        );
        assert_eq!(
            d.derive("/home/dev/shared/src/util.js").unwrap(),
            Identity::OutOfTree {
                pure: "/home/dev/shared/src/util.js".into()
            }
        );
    }

    #[test]
    fn pnpm_store_versions_share_identity_but_not_fallback() {
        let d = deriver(
            MemoryManifestReader::new()
                .with("/app/node_modules/.pnpm/debug@4.1.0/node_modules/debug", "debug", "4.1.0")
                .with("/app/node_modules/.pnpm/debug@4.3.4/node_modules/debug", "debug", "4.3.4"),
        );
        let old = d
            .derive("/app/node_modules/.pnpm/debug@4.1.0/node_modules/debug/src/index.js")
            .unwrap();
        let new = d
            .derive("/app/node_modules/.pnpm/debug@4.3.4/node_modules/debug/src/index.js")
            .unwrap();
        assert_eq!(old.canonical(), new.canonical());
        let fallback = |id: &Identity| match id {
            Identity::Project { fallback, .. } => fallback.clone(),
            _ => None,
        };
        assert_eq!(
            fallback(&new).as_deref(),
            Some("/node_modules/.pnpm/debug@4.3.4/node_modules/debug/src/index.js")
        );
        assert_ne!(fallback(&old), fallback(&new));
    }

    #[test]
    fn out_of_tree_npminstall_names_with_underscores() {
        let d = deriver(MemoryManifestReader::new());
        assert_eq!(
            d.derive("/linked/node_modules/_string_decoder@1.3.0@string_decoder/lib/a.js")
                .unwrap(),
            Identity::OutOfTree {
                pure: "*/node_modules/string_decoder/lib/a.js".into()
            }
        );
    }

    #[test]
    fn requests_are_opaque() {
        let d = deriver(MemoryManifestReader::new());
        for raw in [
            "react",
            "webpack/runtime/chunk loaded",
            "./node_modules/css-loader/index.js!./src/a.css",
            "./src/a.js?raw",
            "ignored|/app/src/x",
        ] {
            assert_eq!(d.derive(raw).unwrap(), Identity::Opaque, "{raw}");
        }
    }
}
