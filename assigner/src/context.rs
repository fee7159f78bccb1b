// context.rs — Per-configuration resolution context
//
// Everything identity derivation reads besides the path itself: project
// root, root package name, global install directory, the version-blurring
// whitelist and the two identity flags. Built once per configuration and
// passed explicitly, so several isolated configurations can coexist.
//
// Preconditions: the project root is absolute (relative overrides are joined
//                onto the host root first).
// Postconditions: `project_name` is set whenever `add_source_prefix` is.
// Failure modes: relative root → ConfigError; missing root manifest while
//                `addSourcePrefix` is on → ManifestError.
// Side effects: `from_options` may read the root manifest and environment.

use std::path::{Path, PathBuf};

use crate::config::IdOptions;
use crate::error::{ConfigError, IdError};
use crate::manifest::ManifestReader;
use crate::path::CanonicalPath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub project_root: CanonicalPath,
    pub project_name: Option<String>,
    pub global_dir: Option<CanonicalPath>,
    pub enforce_modules: Vec<String>,
    pub named_to_hash: bool,
    pub add_source_prefix: bool,
}

impl ResolutionContext {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let project_root = CanonicalPath::from_path(project_root)
            .ok_or_else(|| ConfigError::RelativeRoot(project_root.to_path_buf()))?;
        Ok(ResolutionContext {
            project_root,
            project_name: None,
            global_dir: None,
            enforce_modules: Vec::new(),
            named_to_hash: false,
            add_source_prefix: false,
        })
    }

    /// Build the context for `options`, with `host_root` as the fallback
    /// project root (and the base for a relative `context` override).
    pub fn from_options(
        options: &IdOptions,
        host_root: &Path,
        manifests: &dyn ManifestReader,
    ) -> Result<Self, IdError> {
        let root = match &options.context {
            Some(ctx) if ctx.is_absolute() || CanonicalPath::from_path(ctx).is_some() => {
                ctx.clone()
            }
            Some(ctx) => host_root.join(ctx),
            None => host_root.to_path_buf(),
        };
        let mut context = ResolutionContext::new(&root)?;
        context.enforce_modules = options.enforce_modules.clone();
        context.named_to_hash = options.named_to_hash;
        context.add_source_prefix = options.add_source_prefix;

        let global = options.global_dir.clone().or_else(detect_global_dir);
        context.global_dir = global.as_deref().and_then(CanonicalPath::from_path);

        if options.add_source_prefix {
            let root_dir = context.project_root.to_path_buf();
            let manifest = manifests
                .read_manifest(&root_dir)
                .map_err(|source| IdError::Manifest {
                    path: root_dir.display().to_string(),
                    source,
                })?;
            context.project_name = Some(manifest.name);
        }
        Ok(context)
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_global_dir(mut self, dir: &Path) -> Result<Self, ConfigError> {
        let dir = CanonicalPath::from_path(dir)
            .ok_or_else(|| ConfigError::RelativeRoot(dir.to_path_buf()))?;
        self.global_dir = Some(dir);
        Ok(self)
    }

    pub fn with_enforced<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enforce_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_named_to_hash(mut self, on: bool) -> Self {
        self.named_to_hash = on;
        self
    }

    pub fn with_source_prefix(mut self, on: bool) -> Self {
        self.add_source_prefix = on;
        self
    }

    /// Whether `name` keeps its exact version (substring match on any entry).
    pub fn is_enforced(&self, name: &str) -> bool {
        self.enforce_modules
            .iter()
            .any(|entry| name.contains(entry.as_str()))
    }
}

/// Locate the npm global package directory from the environment.
///
/// Honours `npm_config_prefix` / `NPM_CONFIG_PREFIX` (`<prefix>/lib/node_modules`,
/// or `<prefix>/node_modules` on Windows), then platform defaults.
pub fn detect_global_dir() -> Option<PathBuf> {
    let prefix = ["npm_config_prefix", "NPM_CONFIG_PREFIX"]
        .iter()
        .find_map(|key| std::env::var_os(key).filter(|v| !v.is_empty()))
        .map(PathBuf::from);

    if cfg!(windows) {
        let prefix = prefix
            .or_else(|| std::env::var_os("APPDATA").map(|d| PathBuf::from(d).join("npm")))?;
        Some(prefix.join("node_modules"))
    } else {
        let prefix = prefix.unwrap_or_else(|| PathBuf::from("/usr/local"));
        Some(prefix.join("lib").join("node_modules"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MemoryManifestReader;

    #[test]
    fn whitelist_is_substring_match() {
        let ctx = ResolutionContext::new(Path::new("/app"))
            .unwrap()
            .with_enforced(["react"]);
        assert!(ctx.is_enforced("react"));
        assert!(ctx.is_enforced("react-dom"));
        assert!(ctx.is_enforced("@types/react"));
        assert!(ctx.is_enforced("preact"));
        assert!(!ctx.is_enforced("lodash"));
        assert!(!ctx.is_enforced("Reactive"));
    }

    #[test]
    fn relative_root_is_rejected() {
        assert!(matches!(
            ResolutionContext::new(Path::new("app")),
            Err(ConfigError::RelativeRoot(_))
        ));
    }

    #[test]
    fn options_override_root_and_global_dir() {
        let options = IdOptions {
            context: Some(PathBuf::from("/work/app")),
            global_dir: Some(PathBuf::from("/opt/npm/lib/node_modules")),
            enforce_modules: vec!["vue".into()],
            named_to_hash: true,
            ..IdOptions::default()
        };
        let ctx = ResolutionContext::from_options(
            &options,
            Path::new("/elsewhere"),
            &MemoryManifestReader::new(),
        )
        .unwrap();
        assert_eq!(ctx.project_root.to_string(), "/work/app");
        assert_eq!(
            ctx.global_dir.as_ref().map(ToString::to_string).as_deref(),
            Some("/opt/npm/lib/node_modules")
        );
        assert!(ctx.named_to_hash);
        assert!(!ctx.add_source_prefix);
        assert_eq!(ctx.project_name, None);
    }

    #[test]
    fn relative_context_joins_host_root() {
        let options = IdOptions {
            context: Some(PathBuf::from("packages/web")),
            global_dir: Some(PathBuf::from("/opt/npm")),
            ..IdOptions::default()
        };
        let ctx = ResolutionContext::from_options(
            &options,
            Path::new("/repo"),
            &MemoryManifestReader::new(),
        )
        .unwrap();
        assert_eq!(ctx.project_root.to_string(), "/repo/packages/web");
    }

    #[test]
    fn source_prefix_reads_root_manifest() {
        let options = IdOptions {
            add_source_prefix: true,
            global_dir: Some(PathBuf::from("/opt/npm")),
            ..IdOptions::default()
        };
        let reader = MemoryManifestReader::new().with("/app", "my-app", "1.0.0");
        let ctx = ResolutionContext::from_options(&options, Path::new("/app"), &reader).unwrap();
        assert_eq!(ctx.project_name.as_deref(), Some("my-app"));

        let err =
            ResolutionContext::from_options(&options, Path::new("/other"), &reader).unwrap_err();
        assert!(matches!(err, IdError::Manifest { .. }));
    }
}
