//! Module names - dotted identity of a source file
//!
//! A module name is derived from a file path relative to its naming root:
//! `src/pkg/util.py` under root `src/` becomes `pkg.util`. Package markers
//! keep their sentinel segment (`pkg/__init__.py` → `pkg.__init__`) and are
//! expanded to the bare package name only when building the local-importable set.

use crate::layout::PackageLayout;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

/// Segment that marks a package-marker module (`__init__.py`).
pub const PACKAGE_MARKER: &str = "__init__";

/// A dot-separated module path such as `pkg.sub.module`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

impl ModuleName {
    /// Parse a dotted name, rejecting empty segments.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() || name.split('.').any(|s| s.is_empty()) {
            return Err(Error::InvalidModuleName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Build a name from a path relative to a naming root.
    ///
    /// The file extension is stripped and the remaining components are joined with `.`.
    pub fn from_relative_path(rel: &Path) -> Self {
        let stripped = rel.with_extension("");
        let segments: Vec<String> = stripped
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self(segments.join("."))
    }

    fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let joined = segments.into_iter().collect::<Vec<_>>().join(".");
        if joined.is_empty() {
            None
        } else {
            Some(Self(joined))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn last_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// True for `pkg.__init__`. A bare top-level `__init__` has no package to expose.
    pub fn is_package_marker(&self) -> bool {
        self.0.ends_with(".__init__")
    }

    /// `pkg.sub.__init__` → `pkg.sub`
    pub fn package_name(&self) -> Option<ModuleName> {
        self.0
            .strip_suffix(".__init__")
            .map(|pkg| ModuleName(pkg.to_string()))
    }

    /// Append a dotted suffix.
    pub fn child(&self, suffix: &str) -> ModuleName {
        ModuleName(format!("{}.{}", self.0, suffix))
    }

    /// Resolve an ancestor-relative reference against this module.
    ///
    /// `level == 0` is absolute and returns `base` unchanged. Otherwise the last
    /// `level` segments are dropped (`1` = own package) and `base` is appended.
    /// Returns `None` when the reference climbs past the naming root or leaves
    /// nothing to name.
    pub fn resolve_relative(&self, base: Option<&str>, level: usize) -> Option<ModuleName> {
        let base = base.filter(|b| !b.is_empty());
        if level == 0 {
            return base.and_then(|b| ModuleName::parse(b).ok());
        }

        let parts: Vec<&str> = self.segments().collect();
        if parts.len() < level {
            return None;
        }

        let ancestor = &parts[..parts.len() - level];
        match base {
            Some(b) => Self::from_segments(ancestor.iter().copied().chain(b.split('.'))),
            None => Self::from_segments(ancestor.iter().copied()),
        }
    }
}

/// Map a file to its module name under the given layout.
///
/// The first naming root that is a prefix of `file` wins; the repository root
/// is the fallback. Pure function of its inputs: no filesystem access.
pub fn resolve(layout: &PackageLayout, file: &Path) -> ModuleName {
    let rel = layout
        .naming_roots()
        .iter()
        .find_map(|root| file.strip_prefix(root).ok())
        .or_else(|| file.strip_prefix(layout.repo_root()).ok())
        .unwrap_or(file);
    ModuleName::from_relative_path(rel)
}

/// All module names plus the package names exposed by their `__init__` markers.
pub fn expand_importables<'a>(modules: impl IntoIterator<Item = &'a ModuleName>) -> HashSet<String> {
    let mut importable = HashSet::new();
    for module in modules {
        if let Some(pkg) = module.package_name() {
            importable.insert(pkg.0);
        }
        importable.insert(module.0.clone());
    }
    importable
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ModuleName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ModuleName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ModuleName::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn name(s: &str) -> ModuleName {
        ModuleName::parse(s).unwrap()
    }

    #[test]
    fn test_from_relative_path() {
        let m = ModuleName::from_relative_path(Path::new("dpylens/analyzer/parser.py"));
        assert_eq!(m.as_str(), "dpylens.analyzer.parser");

        let init = ModuleName::from_relative_path(Path::new("dpylens/analyzer/__init__.py"));
        assert_eq!(init.as_str(), "dpylens.analyzer.__init__");
        assert!(init.is_package_marker());
        assert_eq!(init.package_name(), Some(name("dpylens.analyzer")));
    }

    #[test]
    fn test_top_level_marker_has_no_package() {
        let m = ModuleName::from_relative_path(Path::new("__init__.py"));
        assert!(!m.is_package_marker());
        assert_eq!(m.package_name(), None);
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(ModuleName::parse("").is_err());
        assert!(ModuleName::parse("a..b").is_err());
        assert!(ModuleName::parse(".a").is_err());
        assert!("pkg.mod".parse::<ModuleName>().is_ok());
    }

    #[test]
    fn test_resolve_relative_same_package() {
        let own = name("dpylens.analyzer.cli");
        assert_eq!(own.resolve_relative(Some("parser"), 1), Some(name("dpylens.analyzer.parser")));
        assert_eq!(own.resolve_relative(None, 1), Some(name("dpylens.analyzer")));
    }

    #[test]
    fn test_resolve_relative_parent_package() {
        let own = name("dpylens.analyzer.cli");
        assert_eq!(own.resolve_relative(Some("utils"), 2), Some(name("dpylens.utils")));
        assert_eq!(own.resolve_relative(Some("x.y"), 3), Some(name("x.y")));
    }

    #[test]
    fn test_resolve_relative_escaping_root() {
        let own = name("pkg.b");
        assert_eq!(own.resolve_relative(Some("a"), 3), None);
        // climbing to the root with nothing to name
        assert_eq!(own.resolve_relative(None, 2), None);
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let own = name("pkg.b");
        assert_eq!(own.resolve_relative(Some("os.path"), 0), Some(name("os.path")));
        assert_eq!(own.resolve_relative(None, 0), None);
    }

    #[test]
    fn test_package_marker_relative() {
        // inside pkg/__init__.py, `from . import x` names pkg itself
        let own = name("pkg.__init__");
        assert_eq!(own.resolve_relative(None, 1), Some(name("pkg")));
    }

    #[test]
    fn test_expand_importables() {
        let modules = vec![name("pkg.__init__"), name("pkg.a"), name("__init__")];
        let importable = expand_importables(&modules);
        assert!(importable.contains("pkg"));
        assert!(importable.contains("pkg.__init__"));
        assert!(importable.contains("pkg.a"));
        assert!(importable.contains("__init__"));
        assert_eq!(importable.len(), 4);
    }

    #[test]
    fn test_resolve_uses_first_matching_root() {
        let layout = PackageLayout::from_roots(
            PathBuf::from("/repo"),
            vec![PathBuf::from("/repo/src")],
        );
        assert_eq!(resolve(&layout, Path::new("/repo/src/mypkg/util.py")).as_str(), "mypkg.util");
        assert_eq!(resolve(&layout, Path::new("/repo/tools/run.py")).as_str(), "tools.run");
    }

    #[test]
    fn test_serde_as_string() {
        let m = name("pkg.mod");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"pkg.mod\"");
        let back: ModuleName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
