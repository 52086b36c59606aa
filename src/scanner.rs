//! Source scanner
//!
//! Enumerates candidate source files under a root, skipping build, tooling
//! and virtualenv directories by name.

use crate::{Error, Result};
use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory names skipped by default, at any depth below the root.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".tox",
    ".venv",
    "venv",
    "env",
    "__pycache__",
    "build",
    "dist",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".eggs",
    "site-packages",
    "node_modules",
];

pub struct Scanner {
    excludes: HashSet<String>,
    extensions: Vec<String>,
    respect_gitignore: bool,
}

impl Scanner {
    /// Scanner for the given source extensions with the default exclusions.
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            respect_gitignore: false,
        }
    }

    /// Replace the exclusion set entirely.
    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = String>) -> Self {
        self.excludes = excludes.into_iter().collect();
        self
    }

    /// Add names on top of the current exclusion set.
    pub fn with_extra_excludes(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.excludes.extend(extra);
        self
    }

    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn excludes(&self) -> &HashSet<String> {
        &self.excludes
    }

    /// Walk `root` and return matching files, sorted for stable output.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", root.display()),
            )));
        }

        let excludes = self.excludes.clone();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .filter_entry(move |entry| !is_excluded(entry, &excludes))
            .build();

        let mut files = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && self.has_source_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!("Scanned {} source files under {}", files.len(), root.display());
        Ok(files)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x == ext))
            .unwrap_or(false)
    }
}

fn is_excluded(entry: &DirEntry, excludes: &HashSet<String>) -> bool {
    // never filter the root itself
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| excludes.contains(name))
        .unwrap_or(false)
}
