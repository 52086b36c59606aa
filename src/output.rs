//! Analysis artifacts
//!
//! JSON documents for downstream tools and DOT descriptions for Graphviz.
//! Every JSON document carries the run's per-file `errors` list.

use crate::Result;
use crate::dataflow::{self, DataflowRecord};
use crate::graph::{ModuleGraph, ModuleNode};
use crate::imports::ImportDeclaration;
use crate::patterns::PatternHit;
use crate::pipeline::Analysis;
use crate::summary::Summary;
use crate::symbol::{CallRecord, FunctionRecord, ResolvedCall};
use crate::{FileError, edge::ModuleEdge};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress decorative terminal output (`DEPSCOPE_QUIET=1`).
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("DEPSCOPE_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

pub const SUMMARY_ITEMS: usize = 20;

/// Imports of one parsed file.
#[derive(Debug, Serialize)]
pub struct ImportRecord<'a> {
    pub file: String,
    pub module: &'a str,
    /// Module paths mentioned, without relative dots
    pub imports: Vec<String>,
    pub items: &'a [ImportDeclaration],
}

#[derive(Serialize)]
struct ModulesDoc<'a> {
    modules: &'a [ModuleNode],
    imports: &'a [ImportRecord<'a>],
    errors: &'a [FileError],
}

#[derive(Serialize)]
struct ModuleGraphDoc<'a> {
    nodes: &'a [ModuleNode],
    edges: &'a [ModuleEdge],
    errors: &'a [FileError],
}

#[derive(Serialize)]
struct CallGraphDoc<'a, C: Serialize> {
    functions: &'a [FunctionRecord],
    calls: &'a [C],
    errors: &'a [FileError],
}

#[derive(Serialize)]
struct PatternsDoc<'a> {
    patterns: &'a [PatternHit],
    errors: &'a [FileError],
}

#[derive(Serialize)]
struct DataflowDoc<'a> {
    functions: &'a [DataflowRecord],
    errors: &'a [FileError],
}

#[derive(Serialize)]
struct SummaryDoc<'a> {
    #[serde(flatten)]
    summary: &'a Summary,
    errors: &'a [FileError],
}

pub fn import_records(analysis: &Analysis) -> Vec<ImportRecord<'_>> {
    analysis
        .extractions
        .iter()
        .map(|e| ImportRecord {
            file: e.file_key(),
            module: e.module.as_str(),
            imports: e.imported_modules(),
            items: &e.imports,
        })
        .collect()
}

fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(payload)?;
    std::fs::write(path, text)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Write every artifact into `out`, creating it if needed. Returns the written paths.
pub fn write_artifacts(analysis: &Analysis, out: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out)?;
    let errors = analysis.errors.as_slice();
    let summary = Summary::build(analysis, SUMMARY_ITEMS);
    let imports = import_records(analysis);
    let mut written = Vec::new();

    let mut emit = |name: &str| {
        let path = out.join(name);
        written.push(path.clone());
        path
    };

    write_json(
        &emit("modules.json"),
        &ModulesDoc {
            modules: &analysis.modules,
            imports: &imports,
            errors,
        },
    )?;
    write_json(
        &emit("module_graph.json"),
        &ModuleGraphDoc {
            nodes: analysis.module_graph.nodes(),
            edges: analysis.module_graph.edges(),
            errors,
        },
    )?;
    write_json(
        &emit("callgraph.json"),
        &CallGraphDoc {
            functions: &analysis.functions,
            calls: &analysis.calls,
            errors,
        },
    )?;
    write_json(
        &emit("callgraph_resolved.json"),
        &CallGraphDoc {
            functions: &analysis.functions,
            calls: analysis.resolved_calls(),
            errors,
        },
    )?;
    write_json(
        &emit("patterns.json"),
        &PatternsDoc {
            patterns: &analysis.patterns,
            errors,
        },
    )?;
    write_json(
        &emit("dataflow.json"),
        &DataflowDoc {
            functions: &analysis.dataflow,
            errors,
        },
    )?;
    write_json(
        &emit("summary.json"),
        &SummaryDoc {
            summary: &summary,
            errors,
        },
    )?;
    write_text(
        &emit("summary.md"),
        &summary.to_markdown(&analysis.root().display().to_string()),
    )?;
    write_text(&emit("imports.dot"), &imports_dot(&imports))?;
    write_text(&emit("module_graph.dot"), &module_graph_dot(&analysis.module_graph))?;
    write_text(&emit("callgraph.dot"), &callgraph_dot(&analysis.calls))?;
    write_text(&emit("callgraph_grouped.dot"), &callgraph_grouped_dot(&analysis.calls))?;
    write_text(
        &emit("callgraph_resolved.dot"),
        &resolved_callgraph_dot(analysis.resolved_calls()),
    )?;
    write_text(&emit("dataflow.dot"), &dataflow::dataflow_dot(&analysis.dataflow))?;

    Ok(written)
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// File to each module path it imports, local or not.
pub fn imports_dot(records: &[ImportRecord<'_>]) -> String {
    let mut dot = String::from("digraph imports {\n");
    dot.push_str("  rankdir=\"LR\";\n");
    dot.push_str("  node [shape=\"box\", fontsize=10];\n");
    for record in records {
        let file = dot_escape(&record.file);
        for module in &record.imports {
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", file, dot_escape(module));
        }
    }
    dot.push('}');
    dot
}

/// Local edges in blue, external edges in gray.
pub fn module_graph_dot(graph: &ModuleGraph) -> String {
    let mut dot = String::from("digraph module_graph {\n");
    dot.push_str("  rankdir=\"LR\";\n");
    dot.push_str("  node [fontsize=10, shape=\"box\"];\n");
    dot.push_str("  edge [fontsize=9];\n");

    for node in graph.nodes() {
        let _ = writeln!(dot, "  \"{}\" [shape=\"box\"];", dot_escape(node.module.as_str()));
    }
    for edge in graph.edges() {
        let color = if edge.is_local() { "blue" } else { "gray" };
        let _ = writeln!(
            dot,
            "  \"{}\" -> \"{}\" [color=\"{}\"];",
            dot_escape(edge.src_module.as_str()),
            dot_escape(&edge.dst),
            color
        );
    }
    dot.push('}');
    dot
}

/// Caller to raw callee, one edge per call.
pub fn callgraph_dot(calls: &[CallRecord]) -> String {
    let mut dot = String::from("digraph callgraph {\n");
    dot.push_str("  rankdir=\"LR\";\n");
    dot.push_str("  node [shape=\"ellipse\", fontsize=10];\n");
    for call in calls {
        let _ = writeln!(
            dot,
            "  \"{}\" -> \"{}\";",
            dot_escape(&call.caller),
            dot_escape(&call.callee)
        );
    }
    dot.push('}');
    dot
}

/// Same edges as `callgraph_dot`, clustered by declaring file.
pub fn callgraph_grouped_dot(calls: &[CallRecord]) -> String {
    let mut by_file: BTreeMap<&str, Vec<&CallRecord>> = BTreeMap::new();
    for call in calls {
        by_file.entry(call.file.as_str()).or_default().push(call);
    }

    let mut dot = String::from("digraph callgraph_grouped {\n");
    dot.push_str("  rankdir=\"LR\";\n");
    dot.push_str("  node [shape=\"ellipse\", fontsize=10];\n");
    for (idx, (file, calls)) in by_file.into_iter().enumerate() {
        let _ = writeln!(dot, "  subgraph cluster_{} {{", idx);
        let _ = writeln!(dot, "    label=\"{}\";", dot_escape(file));
        dot.push_str("    style=\"rounded\";\n");
        for call in calls {
            let _ = writeln!(
                dot,
                "    \"{}\" -> \"{}\";",
                dot_escape(&call.caller),
                dot_escape(&call.callee)
            );
        }
        dot.push_str("  }\n");
    }
    dot.push('}');
    dot
}

/// Resolved edges solid, unresolved edges dashed to their raw text.
pub fn resolved_callgraph_dot(calls: &[ResolvedCall]) -> String {
    let mut dot = String::from("digraph callgraph_resolved {\n");
    dot.push_str("  rankdir=\"LR\";\n");
    dot.push_str("  node [shape=\"ellipse\", fontsize=10];\n");
    for call in calls {
        let style = if call.is_resolved() { "solid" } else { "dashed" };
        let _ = writeln!(
            dot,
            "  \"{}\" -> \"{}\" [style=\"{}\"];",
            dot_escape(&call.caller),
            dot_escape(call.best_callee()),
            style
        );
    }
    dot.push('}');
    dot
}
