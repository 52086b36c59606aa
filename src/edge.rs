//! Module dependency edges
//!
//! Every import statement produces either one `Local` edge per local target
//! it names, or exactly one `External` edge. Edges are never collapsed: two
//! statements importing the same module yield two edges.

use crate::module_name::ModuleName;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether an import target lives in this repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Target is a module or package found in the scanned tree
    Local,
    /// Target is outside the tree (stdlib, third party, or unresolvable)
    External,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Local => "local",
            EdgeKind::External => "external",
        }
    }

    pub fn all() -> &'static [EdgeKind] {
        &[EdgeKind::Local, EdgeKind::External]
    }
}

impl FromStr for EdgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "internal" => Ok(EdgeKind::Local),
            "external" | "ext" => Ok(EdgeKind::External),
            _ => Err(crate::Error::InvalidEdgeKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dependency produced by one import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEdge {
    /// Importing module
    pub src_module: ModuleName,
    /// Local module name, or the best textual form of an external target
    #[serde(rename = "dst_module")]
    pub dst: String,
    pub kind: EdgeKind,
    /// Import statement text that produced the edge
    pub raw_import: String,
}

impl ModuleEdge {
    pub fn local(src_module: ModuleName, dst: impl Into<String>, raw_import: impl Into<String>) -> Self {
        Self {
            src_module,
            dst: dst.into(),
            kind: EdgeKind::Local,
            raw_import: raw_import.into(),
        }
    }

    pub fn external(src_module: ModuleName, dst: impl Into<String>, raw_import: impl Into<String>) -> Self {
        Self {
            src_module,
            dst: dst.into(),
            kind: EdgeKind::External,
            raw_import: raw_import.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind == EdgeKind::Local
    }
}
