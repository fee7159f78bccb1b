// path.rs — OS-independent canonical absolute paths
//
// Paths are normalised lexically: separators become `/`, `.` segments are
// dropped, `..` pops (never above the root), and a Windows drive letter is
// lower-cased. The filesystem is never consulted, so symlinks are not
// resolved and the same input yields the same canonical form on every host.
//
// Preconditions: none.
// Postconditions: `Display` output is stable across platforms.
// Failure modes: `parse` returns `None` for non-absolute input.
// Side effects: none.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    /// `""` for a POSIX root, `"c:"` for a drive, `"//host/share"` for UNC.
    prefix: String,
    components: Vec<String>,
}

impl CanonicalPath {
    /// Parse an absolute path. Returns `None` for relative or empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        let bytes = raw.as_bytes();
        let is_sep = |b: u8| b == b'/' || b == b'\\';

        if bytes.len() >= 2 && is_sep(bytes[0]) && is_sep(bytes[1]) {
            let mut parts = raw[2..].split(['/', '\\']).filter(|s| !s.is_empty());
            let host = parts.next()?;
            let share = parts.next()?;
            let mut path = CanonicalPath {
                prefix: format!("//{}/{}", host, share),
                components: Vec::new(),
            };
            path.push_all(parts);
            return Some(path);
        }

        if bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && is_sep(bytes[2])
        {
            let mut path = CanonicalPath {
                prefix: format!("{}:", (bytes[0] as char).to_ascii_lowercase()),
                components: Vec::new(),
            };
            path.push_all(raw[3..].split(['/', '\\']));
            return Some(path);
        }

        if !bytes.is_empty() && is_sep(bytes[0]) {
            let mut path = CanonicalPath {
                prefix: String::new(),
                components: Vec::new(),
            };
            path.push_all(raw[1..].split(['/', '\\']));
            return Some(path);
        }

        None
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::parse(&path.to_string_lossy())
    }

    /// Resolve `raw` against `base`. Absolute input is parsed as-is; input
    /// starting with `./` or `../` (or exactly `.`/`..`) is joined onto
    /// `base`. Anything else is not a filesystem path.
    pub fn resolve(raw: &str, base: &CanonicalPath) -> Option<Self> {
        if let Some(path) = Self::parse(raw) {
            return Some(path);
        }
        if is_explicitly_relative(raw) {
            let mut path = base.clone();
            path.push_all(raw.split(['/', '\\']));
            return Some(path);
        }
        None
    }

    fn push_all<'a>(&mut self, segments: impl IntoIterator<Item = &'a str>) {
        for seg in segments {
            match seg {
                "" | "." => {}
                ".." => {
                    self.components.pop();
                }
                other => self.components.push(other.to_string()),
            }
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Components below `base`, when `self` lies at or under it.
    pub fn strip_prefix(&self, base: &CanonicalPath) -> Option<&[String]> {
        if self.prefix != base.prefix || !self.components.starts_with(&base.components) {
            return None;
        }
        Some(&self.components[base.components.len()..])
    }

    pub fn join<S: AsRef<str>>(&self, tail: &[S]) -> CanonicalPath {
        let mut path = self.clone();
        path.push_all(tail.iter().map(|s| s.as_ref()));
        path
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_string())
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)?;
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for c in &self.components {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

fn is_explicitly_relative(raw: &str) -> bool {
    matches!(raw, "." | "..")
        || ["./", ".\\", "../", "..\\"]
            .iter()
            .any(|lead| raw.starts_with(lead))
}

/// Join components as a rooted suffix: `["a", "b"]` → `/a/b`, `[]` → ``.
pub fn rooted<S: AsRef<str>>(components: &[S]) -> String {
    let mut out = String::new();
    for c in components {
        out.push('/');
        out.push_str(c.as_ref());
    }
    out
}
