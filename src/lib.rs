//! # Depscope - Static dependency and call graphs for Python trees
//!
//! Depscope reads a repository of Python sources without executing them and
//! reconstructs:
//! - a module dependency graph, with edges tagged local or external
//! - a call graph whose targets are resolved to fully-qualified functions
//!   wherever imports and aliases make that possible
//!
//! The work is split in two phases. Phase one extracts imports, aliases,
//! functions and calls from each file independently (in parallel). Phase two
//! needs everything phase one produced and links it into graphs.

pub mod adapter;
pub mod config;
pub mod dataflow;
pub mod edge;
pub mod graph;
pub mod imports;
pub mod layout;
pub mod linker;
pub mod module_name;
pub mod output;
pub mod patterns;
pub mod pipeline;
pub mod scanner;
pub mod summary;
pub mod symbol;
pub mod ui;

// Re-exports for convenient access
pub use dataflow::DataflowRecord;
pub use edge::{EdgeKind, ModuleEdge};
pub use graph::{CallGraph, ModuleGraph};
pub use imports::{AliasMap, ImportDeclaration};
pub use layout::PackageLayout;
pub use module_name::ModuleName;
pub use pipeline::{Analysis, Pipeline};
pub use symbol::{CallRecord, CallTarget, FunctionRecord, ResolvedCall};

/// Result type alias for Depscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Depscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid module name: {0}")]
    InvalidModuleName(String),

    #[error("Invalid edge kind: {0}")]
    InvalidEdgeKind(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A file that could not be read or parsed.
///
/// Recorded per file and excluded from every graph; never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileError {
    pub file: String,
    #[serde(rename = "error")]
    pub message: String,
}

impl FileError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Message sent from extraction workers to the coordinator
#[derive(Debug)]
pub enum ExtractMessage {
    Extracted(Box<adapter::FileExtraction>),
    Failed(FileError),
}
