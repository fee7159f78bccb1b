// layout.rs — Dependency-directory conventions
//
// Recognises where a third-party package lives inside a path, for each
// installer layout we understand:
//
//   Plain       node_modules/<name>/…            node_modules/@scope/<name>/…
//   Pnpm        node_modules/.pnpm/<flat>/node_modules/<name>/…
//               (<flat> = `@scope+name@1.2.3_peer@4.5.6` or `name@1.2.3(peer@4)`)
//   Npminstall  node_modules/_<flat>@<version>@<name>/…
//               node_modules/_@scope_<name>@<version>@@scope/<name>/…
//
// Flattened segment names are tokenised with `logos` into `@`, `+`, `_` markers
// and text runs, then peeled according to the convention.
//
// Preconditions: `components` come from a `CanonicalPath`.
// Postconditions: a match always leaves at least one component after the
//                 package directory (the module file itself).
// Failure modes: none; unrecognised layouts simply do not match.
// Side effects: none.

use logos::Logos;

/// Directory name under which third-party packages are installed.
pub const DEPENDENCY_CONTAINER: &str = "node_modules";

const PNPM_STORE: &str = ".pnpm";

// ── Flattened-name lexer ────────────────────────────────────────────────────

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    #[token("@")]
    At,
    #[token("+")]
    Plus,
    #[token("_")]
    Underscore,
    #[regex(r"[^@+_]+")]
    Text,
}

fn lex(segment: &str) -> Option<Vec<(Marker, &str)>> {
    let mut lexer = Marker::lexer(segment);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        tokens.push((token.ok()?, lexer.slice()));
    }
    Some(tokens)
}

/// Package name and version encoded in a flattened directory segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatName {
    pub name: String,
    pub version: String,
}

/// Parse a pnpm virtual-store entry: `[@scope+]name@version[_peers|(peers)]`.
pub fn parse_pnpm_segment(segment: &str) -> Option<FlatName> {
    let tokens = lex(segment)?;
    let mut it = tokens.iter().peekable();

    let scoped = matches!(it.peek(), Some((Marker::At, _)));
    if scoped {
        it.next();
    }
    let first = match it.next()? {
        (Marker::Text, text) => *text,
        _ => return None,
    };
    let name = if scoped {
        match (it.next()?, it.next()?) {
            ((Marker::Plus, _), (Marker::Text, pkg)) => format!("@{}/{}", first, pkg),
            _ => return None,
        }
    } else {
        first.to_string()
    };
    if !matches!(it.next()?, (Marker::At, _)) {
        return None;
    }

    let mut version = String::new();
    for (marker, text) in it {
        if *marker == Marker::Underscore {
            break;
        }
        version.push_str(text);
    }
    let version = version.split('(').next().unwrap_or_default().to_string();
    if version.is_empty() {
        return None;
    }
    Some(FlatName { name, version })
}

/// Parse an npminstall segment, peeling markers from the end:
/// root name, then the `@version@` fold, then the flattened name.
/// Returns the name hint and whether the package continues into the next
/// path component (scoped packages).
pub fn parse_npminstall_segment(segment: &str) -> Option<(FlatName, Option<String>)> {
    let tokens = lex(segment)?;
    let (first, mut rest) = tokens.split_first()?;
    if first.0 != Marker::Underscore {
        return None;
    }

    // root: everything after the last `@` (`@lodash`, `@@babel`, `@string_decoder`)
    let last = rest.iter().rposition(|(m, _)| *m == Marker::At)?;
    let root: String = rest[last + 1..].iter().map(|(_, t)| *t).collect();
    if root.is_empty() {
        return None;
    }
    rest = &rest[..last];
    let scope = match rest.split_last() {
        Some(((Marker::At, _), head)) => {
            rest = head;
            Some(format!("@{}", root))
        }
        _ => None,
    };

    // version: text after the last remaining `@`
    let at = rest.iter().rposition(|(m, _)| *m == Marker::At)?;
    let version: String = rest[at + 1..].iter().map(|(_, t)| *t).collect();
    let flat: String = rest[..at].iter().map(|(_, t)| *t).collect();
    if version.is_empty() || flat.is_empty() {
        return None;
    }

    let name = match &scope {
        Some(scope) => scope.clone(),
        None => root,
    };
    Some((FlatName { name, version }, scope))
}

// ── Conventions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    Plain,
    Pnpm,
    Npminstall,
}

/// Where a dependency sits inside a list of path components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMatch {
    pub convention: Convention,
    /// Index of the outermost container component. Everything from here up
    /// to `package_end` is replaced by `node_modules/<name>@<version>`.
    pub container: usize,
    /// Exclusive end index of the package directory.
    pub package_end: usize,
    /// Package name as spelled by the layout (the manifest is authoritative).
    pub name_hint: String,
}

impl Convention {
    /// Try to match a dependency whose container is `components[at]`.
    pub fn match_at(self, components: &[String], at: usize) -> Option<DependencyMatch> {
        if components.get(at).map(String::as_str) != Some(DEPENDENCY_CONTAINER) {
            return None;
        }
        let m = match self {
            Convention::Plain => plain_package(components, at + 1).map(|(end, name)| {
                DependencyMatch {
                    convention: self,
                    container: at,
                    package_end: end,
                    name_hint: name,
                }
            }),
            Convention::Pnpm => match_pnpm(components, at),
            Convention::Npminstall => match_npminstall(components, at),
        }?;
        // the package directory itself is not a module
        (m.package_end < components.len()).then_some(m)
    }
}

/// A plain package directory starting at `components[start]`.
fn plain_package(components: &[String], start: usize) -> Option<(usize, String)> {
    let seg = components.get(start)?;
    if seg.starts_with('.') || parse_npminstall_segment(seg).is_some() {
        return None;
    }
    if seg.starts_with('@') {
        let pkg = components.get(start + 1)?;
        return Some((start + 2, format!("{}/{}", seg, pkg)));
    }
    Some((start + 1, seg.clone()))
}

fn match_pnpm(components: &[String], at: usize) -> Option<DependencyMatch> {
    if components.get(at + 1)?.as_str() != PNPM_STORE {
        return None;
    }
    let entry = components.get(at + 2)?;
    // hoisted: node_modules/.pnpm/node_modules/<name>
    let inner = if entry == DEPENDENCY_CONTAINER {
        at + 2
    } else {
        parse_pnpm_segment(entry)?;
        if components.get(at + 3)?.as_str() != DEPENDENCY_CONTAINER {
            return None;
        }
        at + 3
    };
    let (end, name) = plain_package(components, inner + 1)?;
    Some(DependencyMatch {
        convention: Convention::Pnpm,
        container: at,
        package_end: end,
        name_hint: name,
    })
}

fn match_npminstall(components: &[String], at: usize) -> Option<DependencyMatch> {
    let seg = components.get(at + 1)?;
    let (flat, scope) = parse_npminstall_segment(seg)?;
    let (end, name) = match scope {
        Some(scope) => {
            let pkg = components.get(at + 2)?;
            (at + 3, format!("{}/{}", scope, pkg))
        }
        None => (at + 2, flat.name),
    };
    Some(DependencyMatch {
        convention: Convention::Npminstall,
        container: at,
        package_end: end,
        name_hint: name,
    })
}

// ── Policy ──────────────────────────────────────────────────────────────────

/// The ordered set of conventions tried at each container segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPolicy {
    conventions: Vec<Convention>,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        LayoutPolicy {
            conventions: vec![Convention::Pnpm, Convention::Npminstall, Convention::Plain],
        }
    }
}

impl LayoutPolicy {
    pub fn new(conventions: Vec<Convention>) -> Self {
        LayoutPolicy { conventions }
    }

    pub fn conventions(&self) -> &[Convention] {
        &self.conventions
    }

    /// Find the outermost dependency in `components`.
    pub fn find(&self, components: &[String]) -> Option<DependencyMatch> {
        components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_str() == DEPENDENCY_CONTAINER)
            .find_map(|(at, _)| {
                self.conventions
                    .iter()
                    .find_map(|conv| conv.match_at(components, at))
            })
    }
}
