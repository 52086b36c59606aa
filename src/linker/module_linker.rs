//! Module graph linking
//!
//! Classifies every import statement as local or external against the set of
//! modules importable from inside the scanned tree.

use crate::adapter::FileExtraction;
use crate::edge::ModuleEdge;
use crate::graph::{ModuleGraph, ModuleNode};
use crate::imports::ImportDeclaration;
use crate::module_name::{self, ModuleName};
use std::collections::HashSet;
use tracing::{debug, trace};

pub struct ModuleLinker {
    importable: HashSet<String>,
}

impl ModuleLinker {
    /// `known` holds the module name of every scanned file, parsed or not.
    pub fn new<'a>(known: impl IntoIterator<Item = &'a ModuleName>) -> Self {
        Self {
            importable: module_name::expand_importables(known),
        }
    }

    pub fn is_importable(&self, name: &str) -> bool {
        self.importable.contains(name)
    }

    /// Local modules named by one import statement, in statement order.
    ///
    /// A from-style import may name the package itself and any of its
    /// submodules: `from pkg import a` inside the tree yields `pkg` and `pkg.a`
    /// when both are importable.
    pub fn local_targets(&self, src: &ModuleName, decl: &ImportDeclaration) -> Vec<String> {
        match decl {
            ImportDeclaration::Direct { module, .. } => {
                if self.is_importable(module) {
                    vec![module.clone()]
                } else {
                    Vec::new()
                }
            }
            ImportDeclaration::From { base, level, names, .. } => {
                let Some(resolved) = src.resolve_relative(base.as_deref(), *level) else {
                    return Vec::new();
                };

                let mut seen = HashSet::new();
                let mut targets = Vec::new();
                let candidates = std::iter::once(resolved.as_str().to_string()).chain(
                    names
                        .iter()
                        .filter(|n| !n.name.is_empty() && !n.is_wildcard())
                        .map(|n| resolved.child(&n.name).as_str().to_string()),
                );
                for candidate in candidates {
                    if self.is_importable(&candidate) && seen.insert(candidate.clone()) {
                        targets.push(candidate);
                    }
                }
                targets
            }
        }
    }

    /// Edges for one file's imports, in source order.
    pub fn edges_for(&self, src: &ModuleName, imports: &[ImportDeclaration]) -> Vec<ModuleEdge> {
        let mut edges = Vec::new();
        for decl in imports {
            let raw = decl.raw();
            let targets = self.local_targets(src, decl);
            if targets.is_empty() {
                trace!("External import in {}: {}", src, raw);
                edges.push(ModuleEdge::external(src.clone(), decl.written_target(), raw));
            } else {
                edges.extend(
                    targets
                        .into_iter()
                        .map(|dst| ModuleEdge::local(src.clone(), dst, raw.clone())),
                );
            }
        }
        edges
    }

    /// Build the module graph from successfully extracted files.
    pub fn link(&self, extractions: &[FileExtraction]) -> ModuleGraph {
        let mut nodes: Vec<ModuleNode> = extractions
            .iter()
            .map(|e| ModuleNode {
                module: e.module.clone(),
                file: e.file_key(),
            })
            .collect();
        nodes.sort_by(|a, b| a.module.cmp(&b.module).then_with(|| a.file.cmp(&b.file)));

        let edges: Vec<ModuleEdge> = extractions
            .iter()
            .flat_map(|e| self.edges_for(&e.module, &e.imports))
            .collect();

        debug!("Linked {} modules with {} import edges", nodes.len(), edges.len());
        ModuleGraph::new(nodes, edges)
    }
}
