//! Package layout detection
//!
//! Chooses the directories that act as naming roots for module names:
//! - `src/` when it holds an importable package
//! - `packages/<name>/src/` for every sub-project that does the same
//! - the repository root, always, as the last-resort root

use crate::module_name::{self, ModuleName};
use crate::scanner::DEFAULT_EXCLUDES;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SOURCE_DIR: &str = "src";
const PACKAGES_DIR: &str = "packages";
const MARKER_FILE: &str = "__init__.py";
const SOURCE_EXTENSION: &str = "py";

/// Ordered naming roots for one analysis run.
///
/// The repository root is always the final entry, so every file maps to some module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    repo_root: PathBuf,
    naming_roots: Vec<PathBuf>,
}

impl PackageLayout {
    /// Detect the layout of a repository. Never fails; degrades to root-only naming.
    pub fn detect(repo_root: &Path) -> Self {
        let repo_root = repo_root
            .canonicalize()
            .unwrap_or_else(|_| repo_root.to_path_buf());
        let mut candidates = Vec::new();

        let top_src = repo_root.join(SOURCE_DIR);
        if src_looks_like_package(&top_src) {
            candidates.push(top_src);
        }

        let packages_dir = repo_root.join(PACKAGES_DIR);
        for pkg in sorted_subdirs(&packages_dir) {
            if is_excluded_dir(&pkg) {
                continue;
            }
            let pkg_src = pkg.join(SOURCE_DIR);
            if src_looks_like_package(&pkg_src) {
                candidates.push(pkg_src);
            }
        }

        let layout = Self::from_roots(repo_root, candidates);
        debug!("Naming roots: {:?}", layout.naming_roots);
        layout
    }

    /// Build a layout from explicit candidate roots, appending the repository root
    /// and removing duplicates while keeping priority order.
    pub fn from_roots(repo_root: PathBuf, candidates: Vec<PathBuf>) -> Self {
        let mut naming_roots: Vec<PathBuf> = Vec::with_capacity(candidates.len() + 1);
        for root in candidates.into_iter().chain(std::iter::once(repo_root.clone())) {
            if !naming_roots.contains(&root) {
                naming_roots.push(root);
            }
        }
        Self {
            repo_root,
            naming_roots,
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Naming roots in priority order, repository root last.
    pub fn naming_roots(&self) -> &[PathBuf] {
        &self.naming_roots
    }

    /// Module name of a file under this layout.
    pub fn module_name(&self, file: &Path) -> ModuleName {
        module_name::resolve(self, file)
    }
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn is_excluded_dir(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .map(|n| DEFAULT_EXCLUDES.contains(&n))
        .unwrap_or(false)
}

/// A directory is a package if it has a marker file or any source file directly inside.
fn has_package(dir: &Path) -> bool {
    if dir.join(MARKER_FILE).exists() {
        return true;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(|e| e.ok()).any(|e| {
        let path = e.path();
        path.is_file() && path.extension().and_then(|x| x.to_str()) == Some(SOURCE_EXTENSION)
    })
}

/// `src/` qualifies when at least one of its subdirectories is a package.
fn src_looks_like_package(src: &Path) -> bool {
    sorted_subdirs(src)
        .iter()
        .filter(|d| !is_excluded_dir(d))
        .any(|d| has_package(d))
}
