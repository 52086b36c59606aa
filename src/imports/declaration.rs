//! Import declarations

use serde::{Deserialize, Serialize};

/// Name brought in by a from-style import, with its optional local alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Name the symbol is bound to in the importing file.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

/// One import binding as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImportDeclaration {
    /// `import a.b.c [as x]`
    #[serde(rename = "import")]
    Direct {
        module: String,
        alias: Option<String>,
        line: u32,
    },
    /// `from [.]*base import n1 [as a1], ...`
    From {
        #[serde(rename = "module")]
        base: Option<String>,
        /// Ancestor level: number of leading dots, 0 for absolute
        level: usize,
        names: Vec<ImportedName>,
        line: u32,
    },
}

impl ImportDeclaration {
    pub fn direct(module: impl Into<String>, alias: Option<String>, line: u32) -> Self {
        ImportDeclaration::Direct {
            module: module.into(),
            alias,
            line,
        }
    }

    pub fn from_import(base: Option<String>, level: usize, names: Vec<ImportedName>, line: u32) -> Self {
        ImportDeclaration::From {
            base: base.filter(|b| !b.is_empty()),
            level,
            names,
            line,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            ImportDeclaration::Direct { line, .. } | ImportDeclaration::From { line, .. } => *line,
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, ImportDeclaration::From { level, .. } if *level > 0)
    }

    /// Module text as written, without relative dots.
    pub fn module(&self) -> Option<&str> {
        match self {
            ImportDeclaration::Direct { module, .. } => Some(module),
            ImportDeclaration::From { base, .. } => base.as_deref(),
        }
    }

    /// Statement text, e.g. `import a.b` or `from ..x import y, z`.
    ///
    /// Aliases are not part of the raw text.
    pub fn raw(&self) -> String {
        match self {
            ImportDeclaration::Direct { module, .. } => format!("import {}", module),
            ImportDeclaration::From { .. } => {
                let names = self.imported_names();
                let names = if names.is_empty() {
                    "*".to_string()
                } else {
                    names.join(", ")
                };
                format!("from {} import {}", self.written_target(), names)
            }
        }
    }

    /// Best textual form of the target: the module path for direct imports,
    /// the dot-prefixed base for from-style imports.
    pub fn written_target(&self) -> String {
        let target = match self {
            ImportDeclaration::Direct { module, .. } => module.clone(),
            ImportDeclaration::From { base, level, .. } => {
                format!("{}{}", ".".repeat(*level), base.as_deref().unwrap_or(""))
            }
        };
        if target.is_empty() {
            "<unknown>".to_string()
        } else {
            target
        }
    }

    fn imported_names(&self) -> Vec<&str> {
        match self {
            ImportDeclaration::Direct { .. } => Vec::new(),
            ImportDeclaration::From { names, .. } => names.iter().map(|n| n.name.as_str()).collect(),
        }
    }
}
