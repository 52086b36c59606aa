//! Python language adapter
//!
//! Extracts imports, function definitions and calls from Python source files
//! using tree-sitter.

use super::framework::{FileExtraction, LanguageAdapter};
use crate::dataflow::DataflowFrame;
use crate::imports::{ImportDeclaration, ImportedName};
use crate::module_name::ModuleName;
use crate::symbol::{CallRecord, EXPR_RECEIVER, FunctionRecord, UNKNOWN_CALLEE};
use crate::{Error, Result};
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

const FUTURE_MODULE: &str = "__future__";

/// Python language adapter
pub struct PythonAdapter {
    language: Language,
}

impl PythonAdapter {
    /// Create a new Python adapter
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Parse source into a syntax tree, rejecting trees with error or missing nodes.
    fn parse(&self, content: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| Error::Parse("Failed to parse file".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(Error::Parse(format!("invalid syntax at line {}", line)));
        }
        Ok(tree)
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for PythonAdapter {
    fn language_name(&self) -> &str {
        "Python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn extract(&self, path: &Path, module: &ModuleName, content: &str) -> Result<FileExtraction> {
        let tree = self.parse(content)?;

        let mut result = FileExtraction::new(path, module.clone());
        let file = result.file_key();
        let mut walker = Walker {
            source: content.as_bytes(),
            module,
            file: &file,
            stack: Vec::new(),
            result: &mut result,
        };
        walker.walk(tree.root_node());

        // frames finish innermost first
        result.dataflow.sort_by_key(|d| d.line);
        result.link_aliases();
        Ok(result)
    }
}

/// A function whose body is being walked.
struct Frame {
    qualname: String,
    flow: DataflowFrame,
}

/// Depth-first walk that keeps a stack of enclosing functions.
struct Walker<'a> {
    source: &'a [u8],
    module: &'a ModuleName,
    file: &'a str,
    stack: Vec<Frame>,
    result: &'a mut FileExtraction,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "function_definition" => self.visit_function(node, None),
            "decorated_definition" => self.visit_decorated(node),
            "call" => {
                self.visit_call(node);
                self.walk_children(node);
            }
            "return_statement" => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.flow.record_return();
                }
                self.walk_children(node);
            }
            "assignment" => {
                self.visit_assignment(node);
                self.walk_children(node);
            }
            "import_statement" => self.visit_import(node),
            "import_from_statement" => self.visit_import_from(node),
            "future_import_statement" => self.visit_future_import(node),
            _ => self.walk_children(node),
        }
    }

    fn walk_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.walk(child);
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// Dotted names may legally contain whitespace around the dots.
    fn dotted(&self, node: Node) -> String {
        self.text(node).split_whitespace().collect()
    }

    /// Decorators of a function belong to that function's scope.
    fn visit_decorated(&mut self, node: Node) {
        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => self.visit_function(def, Some(node)),
            _ => self.walk_children(node),
        }
    }

    fn visit_function(&mut self, node: Node, decorated: Option<Node>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            if let Some(decorated) = decorated {
                self.walk_decorators(decorated);
            }
            self.walk_children(node);
            return;
        };
        let qualname = format!("{}.{}", self.module, self.text(name_node));
        let line = line_of(node);
        self.result
            .functions
            .push(FunctionRecord::new(&qualname, self.file, line));

        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.parameter_names(p))
            .unwrap_or_default();
        self.stack.push(Frame {
            flow: DataflowFrame::new(&qualname, line, params),
            qualname,
        });
        if let Some(decorated) = decorated {
            self.walk_decorators(decorated);
        }
        self.walk_children(node);

        if let Some(frame) = self.stack.pop() {
            self.result.dataflow.push(frame.flow.finish(self.file));
        }
    }

    fn walk_decorators(&mut self, decorated: Node) {
        let mut cursor = decorated.walk();
        let decorators: Vec<Node> = decorated
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
            .collect();
        for decorator in decorators {
            self.walk_children(decorator);
        }
    }

    /// Plain, default, typed, `*args` and `**kwargs` parameter names.
    fn parameter_names(&self, parameters: Node) -> Vec<String> {
        let mut cursor = parameters.walk();
        parameters
            .named_children(&mut cursor)
            .filter_map(|p| self.parameter_name(p))
            .map(str::to_string)
            .collect()
    }

    fn parameter_name(&self, node: Node) -> Option<&'a str> {
        match node.kind() {
            "identifier" => Some(self.text(node)),
            "default_parameter" | "typed_default_parameter" => {
                node.child_by_field_name("name").map(|n| self.text(n))
            }
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                node.named_child(0).and_then(|n| self.parameter_name(n))
            }
            _ => None,
        }
    }

    /// `X = ...` inside a function; annotated assignments are declarations.
    fn visit_assignment(&mut self, node: Node) {
        if node.child_by_field_name("type").is_some() {
            return;
        }
        let Some(left) = node.child_by_field_name("left").map(unparen) else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let target = self.text(left);
        if let Some(frame) = self.stack.last_mut() {
            frame.flow.record_assignment(target);
        }
    }

    fn visit_call(&mut self, node: Node) {
        let function = node.child_by_field_name("function").map(unparen);

        if let Some((name, via_attribute)) = function.and_then(|f| self.called_name(f)) {
            self.result.call_names.push(name.to_string());
            if let Some(frame) = self.stack.last_mut() {
                frame.flow.record_call(name, via_attribute);
            }
        }

        let Some(caller) = self.stack.last().map(|f| f.qualname.clone()) else {
            return;
        };
        let callee = function
            .map(|f| self.callee_text(f))
            .unwrap_or_else(|| UNKNOWN_CALLEE.to_string());
        self.result
            .calls
            .push(CallRecord::new(caller, callee, self.file, line_of(node)));
    }

    /// Name being called, without its receiver: `run` for `subprocess.run(...)`.
    fn called_name(&self, function: Node) -> Option<(&'a str, bool)> {
        match function.kind() {
            "identifier" => Some((self.text(function), false)),
            "attribute" => function
                .child_by_field_name("attribute")
                .map(|a| (self.text(a), true)),
            _ => None,
        }
    }

    /// `foo` → `foo`, `a.b.c` → `a.b.c`, `f().x` → `<expr>.x`, else `<unknown>`.
    /// Parentheses around a receiver are transparent.
    fn callee_text(&self, node: Node) -> String {
        match node.kind() {
            "identifier" => self.text(node).to_string(),
            "attribute" => {
                let mut parts: Vec<&str> = Vec::new();
                let mut current = Some(node);
                while let Some(n) = current.map(unparen).filter(|n| n.kind() == "attribute") {
                    if let Some(attr) = n.child_by_field_name("attribute") {
                        parts.push(self.text(attr));
                    }
                    current = n.child_by_field_name("object");
                }
                let current = current.map(unparen);
                parts.reverse();
                match current {
                    Some(root) if root.kind() == "identifier" => {
                        format!("{}.{}", self.text(root), parts.join("."))
                    }
                    _ => format!("{}.{}", EXPR_RECEIVER, parts.join(".")),
                }
            }
            _ => UNKNOWN_CALLEE.to_string(),
        }
    }

    /// `import a.b, c as d`
    fn visit_import(&mut self, node: Node) {
        let line = line_of(node);
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for child in names {
            let decl = match child.kind() {
                "dotted_name" => ImportDeclaration::direct(self.dotted(child), None, line),
                "aliased_import" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let alias = child.child_by_field_name("alias").map(|a| self.text(a).to_string());
                    ImportDeclaration::direct(self.dotted(name), alias, line)
                }
                _ => continue,
            };
            if decl.module().is_some_and(|m| !m.is_empty()) {
                self.result.imports.push(decl);
            }
        }
    }

    /// `from ..base import x as y, z` / `from . import *`
    fn visit_import_from(&mut self, node: Node) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let written = self.dotted(module_node);
        let level = written.chars().take_while(|c| *c == '.').count();
        let base = written[level..].to_string();

        let mut names = self.imported_names(node);
        let mut cursor = node.walk();
        if node.named_children(&mut cursor).any(|c| c.kind() == "wildcard_import") {
            names = vec![ImportedName::new("*")];
        }

        let base = if base.is_empty() { None } else { Some(base) };
        self.result
            .imports
            .push(ImportDeclaration::from_import(base, level, names, line_of(node)));
    }

    /// `from __future__ import annotations`
    fn visit_future_import(&mut self, node: Node) {
        let names = self.imported_names(node);
        self.result.imports.push(ImportDeclaration::from_import(
            Some(FUTURE_MODULE.to_string()),
            0,
            names,
            line_of(node),
        ));
    }

    fn imported_names(&self, node: Node) -> Vec<ImportedName> {
        let mut cursor = node.walk();
        node.children_by_field_name("name", &mut cursor)
            .filter_map(|child| match child.kind() {
                "dotted_name" => Some(ImportedName::new(self.dotted(child))),
                "aliased_import" => {
                    let name = child.child_by_field_name("name")?;
                    let alias = child.child_by_field_name("alias")?;
                    Some(ImportedName::aliased(self.dotted(name), self.text(alias)))
                }
                _ => None,
            })
            .collect()
    }
}

/// `(expr)` → `expr`, through any number of parentheses.
fn unparen(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" && node.named_child_count() == 1 {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Line of the first ERROR or MISSING node, in document order.
fn first_error_line(node: Node) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(line_of(node));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error_line)
}
