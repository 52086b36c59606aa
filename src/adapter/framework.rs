//! Core adapter framework
//!
//! Defines the trait every language adapter implements and the per-file
//! result it produces.

use crate::Result;
use crate::dataflow::DataflowRecord;
use crate::imports::{AliasMap, ImportDeclaration};
use crate::module_name::ModuleName;
use crate::symbol::{CallRecord, FunctionRecord};
use std::path::{Path, PathBuf};

/// Everything phase one learns about a single file.
#[derive(Debug, Clone)]
pub struct FileExtraction {
    /// Absolute path of the file
    pub file: PathBuf,
    /// Module name under the run's layout
    pub module: ModuleName,
    /// Import declarations in source order
    pub imports: Vec<ImportDeclaration>,
    /// Alias tables built from `imports`
    pub aliases: AliasMap,
    pub functions: Vec<FunctionRecord>,
    /// Calls made inside a function, attributed to the innermost one
    pub calls: Vec<CallRecord>,
    /// Called name (without receiver) of every call in the file, at any scope
    pub call_names: Vec<String>,
    /// One record per function, in definition order
    pub dataflow: Vec<DataflowRecord>,
    /// Ecosystem pattern tags (`devops:cli`, `models:pydantic`, ...)
    pub patterns: Vec<String>,
}

impl FileExtraction {
    pub fn new(file: impl Into<PathBuf>, module: ModuleName) -> Self {
        Self {
            file: file.into(),
            module,
            imports: Vec::new(),
            aliases: AliasMap::default(),
            functions: Vec::new(),
            calls: Vec::new(),
            call_names: Vec::new(),
            dataflow: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// File path as it appears in records.
    pub fn file_key(&self) -> String {
        self.file.display().to_string()
    }

    /// Build the alias tables from the collected imports.
    pub fn link_aliases(&mut self) {
        self.aliases = AliasMap::build(&self.imports, &self.module);
    }

    /// Module names mentioned by imports, without relative dots. Sorted and de-duplicated.
    pub fn imported_modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .imports
            .iter()
            .filter_map(|i| i.module())
            .map(str::to_string)
            .collect();
        modules.sort();
        modules.dedup();
        modules
    }
}

/// Trait for language adapters
///
/// Each language adapter is responsible for:
/// 1. Identifying files it can parse
/// 2. Rejecting files whose syntax tree is broken
/// 3. Extracting imports, functions, calls and per-function dataflow
pub trait LanguageAdapter: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this adapter handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this adapter can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    /// Parse a file and extract its imports, functions and calls.
    ///
    /// Returns `Error::Parse` when no valid syntax tree can be built.
    fn extract(&self, path: &Path, module: &ModuleName, content: &str) -> Result<FileExtraction>;
}
