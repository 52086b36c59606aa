//! Repository summary
//!
//! Aggregates one `Analysis` into counts and top-N rankings. Rankings sort by
//! count, highest first, and break ties by name so the output is stable.

use crate::pipeline::Analysis;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Entries kept in each dataflow ranking.
pub const DATAFLOW_ITEMS: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub files: usize,
    pub module_edges: usize,
    pub functions: usize,
    pub calls: usize,
    pub resolved_calls: usize,
    pub dataflow_functions: usize,
    pub files_with_patterns: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCount {
    pub module: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeEntry {
    pub module: String,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerEntry {
    pub caller: String,
    pub calls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutEntry {
    pub caller: String,
    pub unique_callees: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCallEntry {
    pub file: String,
    pub calls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputCount {
    pub input: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputCount {
    pub output: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataflowSummary {
    pub top_inputs: Vec<InputCount>,
    pub top_outputs: Vec<OutputCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleGraphSummary {
    pub top_out_degree: Vec<DegreeEntry>,
    pub top_in_degree: Vec<DegreeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallGraphSummary {
    pub top_callers_by_calls: Vec<CallerEntry>,
    pub top_fanout_callers: Vec<FanoutEntry>,
    pub top_call_files: Vec<FileCallEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub counts: Counts,
    pub top_imported_modules: Vec<ModuleCount>,
    pub module_graph: ModuleGraphSummary,
    pub call_graph: CallGraphSummary,
    pub patterns: Vec<PatternCount>,
    pub dataflow: DataflowSummary,
}

/// Highest counts first, ties by key, at most `max` entries.
fn top<K: Ord + Clone>(counts: BTreeMap<K, usize>, max: usize) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(max);
    entries
}

impl Summary {
    pub fn build(analysis: &Analysis, max_items: usize) -> Self {
        let mut imported: BTreeMap<String, usize> = BTreeMap::new();
        for extraction in &analysis.extractions {
            for decl in &extraction.imports {
                if let Some(module) = decl.module().map(str::trim).filter(|m| !m.is_empty()) {
                    *imported.entry(module.to_string()).or_default() += 1;
                }
            }
        }

        let edges = analysis.module_graph.edges();
        let mut out_degree: BTreeMap<String, usize> = BTreeMap::new();
        let mut in_degree: BTreeMap<String, usize> = BTreeMap::new();
        for edge in edges {
            *out_degree.entry(edge.src_module.to_string()).or_default() += 1;
            *in_degree.entry(edge.dst.clone()).or_default() += 1;
        }

        let resolved = analysis.resolved_calls();
        let mut calls_by_caller: BTreeMap<String, usize> = BTreeMap::new();
        let mut callees_by_caller: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        let mut calls_by_file: BTreeMap<String, usize> = BTreeMap::new();
        for call in resolved {
            *calls_by_file.entry(call.file.clone()).or_default() += 1;
            *calls_by_caller.entry(call.caller.clone()).or_default() += 1;
            callees_by_caller
                .entry(call.caller.clone())
                .or_default()
                .insert(call.best_callee());
        }
        let fanout: BTreeMap<String, usize> = callees_by_caller
            .into_iter()
            .map(|(caller, callees)| (caller, callees.len()))
            .collect();

        let mut pattern_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut files_with_patterns = 0;
        for hit in &analysis.patterns {
            if !hit.patterns.is_empty() {
                files_with_patterns += 1;
            }
            for pattern in &hit.patterns {
                *pattern_counts.entry(pattern.clone()).or_default() += 1;
            }
        }

        let mut inputs: BTreeMap<String, usize> = BTreeMap::new();
        let mut outputs: BTreeMap<String, usize> = BTreeMap::new();
        for record in &analysis.dataflow {
            for input in &record.inputs {
                *inputs.entry(input.clone()).or_default() += 1;
            }
            for output in &record.outputs {
                *outputs.entry(output.clone()).or_default() += 1;
            }
        }

        Summary {
            counts: Counts {
                files: analysis.extractions.len(),
                module_edges: edges.len(),
                functions: analysis.functions.len(),
                calls: analysis.calls.len(),
                resolved_calls: resolved.iter().filter(|c| c.is_resolved()).count(),
                dataflow_functions: analysis.dataflow.len(),
                files_with_patterns,
                warnings: analysis.errors.len(),
            },
            top_imported_modules: top(imported, max_items)
                .into_iter()
                .map(|(module, count)| ModuleCount { module, count })
                .collect(),
            module_graph: ModuleGraphSummary {
                top_out_degree: top(out_degree, max_items)
                    .into_iter()
                    .map(|(module, degree)| DegreeEntry { module, degree })
                    .collect(),
                top_in_degree: top(in_degree, max_items)
                    .into_iter()
                    .map(|(module, degree)| DegreeEntry { module, degree })
                    .collect(),
            },
            call_graph: CallGraphSummary {
                top_callers_by_calls: top(calls_by_caller, max_items)
                    .into_iter()
                    .map(|(caller, calls)| CallerEntry { caller, calls })
                    .collect(),
                top_fanout_callers: top(fanout, max_items)
                    .into_iter()
                    .map(|(caller, unique_callees)| FanoutEntry { caller, unique_callees })
                    .collect(),
                top_call_files: top(calls_by_file, max_items)
                    .into_iter()
                    .map(|(file, calls)| FileCallEntry { file, calls })
                    .collect(),
            },
            patterns: top(pattern_counts, max_items)
                .into_iter()
                .map(|(pattern, count)| PatternCount { pattern, count })
                .collect(),
            dataflow: DataflowSummary {
                top_inputs: top(inputs, DATAFLOW_ITEMS)
                    .into_iter()
                    .map(|(input, count)| InputCount { input, count })
                    .collect(),
                top_outputs: top(outputs, DATAFLOW_ITEMS)
                    .into_iter()
                    .map(|(output, count)| OutputCount { output, count })
                    .collect(),
            },
        }
    }

    /// Plain-text report of the summary, in Markdown.
    pub fn to_markdown(&self, title: &str) -> String {
        fn list<'a>(out: &mut String, items: impl Iterator<Item = (&'a str, usize)>) {
            let mut empty = true;
            for (name, count) in items {
                empty = false;
                let _ = writeln!(out, "- `{}`: **{}**", name, count);
            }
            if empty {
                out.push_str("_No data._\n");
            }
        }

        let c = &self.counts;
        let mut md = String::new();
        let _ = writeln!(md, "# Repository Summary\n\n**Root:** {}\n", title);
        let _ = writeln!(md, "## Overview\n");
        let _ = writeln!(md, "- Files analyzed: **{}**", c.files);
        let _ = writeln!(md, "- Functions found: **{}**", c.functions);
        let _ = writeln!(md, "- Calls found: **{}** (resolved: **{}**)", c.calls, c.resolved_calls);
        let _ = writeln!(md, "- Module edges: **{}**", c.module_edges);
        let _ = writeln!(md, "- Dataflow functions: **{}**", c.dataflow_functions);
        let _ = writeln!(md, "- Files with patterns: **{}**", c.files_with_patterns);
        let _ = writeln!(md, "- Warnings: **{}**\n", c.warnings);

        md.push_str("## Top imported modules\n\n");
        list(&mut md, self.top_imported_modules.iter().map(|e| (e.module.as_str(), e.count)));
        md.push_str("\n## Highest out-degree modules\n\n");
        list(&mut md, self.module_graph.top_out_degree.iter().map(|e| (e.module.as_str(), e.degree)));
        md.push_str("\n## Highest in-degree modules\n\n");
        list(&mut md, self.module_graph.top_in_degree.iter().map(|e| (e.module.as_str(), e.degree)));
        md.push_str("\n## Top callers by calls\n\n");
        list(&mut md, self.call_graph.top_callers_by_calls.iter().map(|e| (e.caller.as_str(), e.calls)));
        md.push_str("\n## Top callers by unique callees\n\n");
        list(
            &mut md,
            self.call_graph
                .top_fanout_callers
                .iter()
                .map(|e| (e.caller.as_str(), e.unique_callees)),
        );
        md.push_str("\n## Files with most calls\n\n");
        list(&mut md, self.call_graph.top_call_files.iter().map(|e| (e.file.as_str(), e.calls)));
        md.push_str("\n## Patterns\n\n");
        list(&mut md, self.patterns.iter().map(|e| (e.pattern.as_str(), e.count)));
        md.push_str("\n## Dataflow inputs\n\n");
        list(&mut md, self.dataflow.top_inputs.iter().map(|e| (e.input.as_str(), e.count)));
        md.push_str("\n## Dataflow outputs\n\n");
        list(&mut md, self.dataflow.top_outputs.iter().map(|e| (e.output.as_str(), e.count)));
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_top_breaks_ties_by_name() {
        let counts = BTreeMap::from([("b".to_string(), 2), ("a".to_string(), 2), ("c".to_string(), 5)]);
        let ranked = top(counts, 2);
        assert_eq!(ranked, vec![("c".to_string(), 5), ("a".to_string(), 2)]);
    }

    #[test]
    fn test_dataflow_rankings() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(
            root.join("jobs.py"),
            "def a(path):\n    return path\n\ndef b(path, cfg):\n    return cfg.get('x')\n\ndef c():\n    LIMIT = 3\n",
        )
        .unwrap();

        let analysis = Pipeline::new().run(&root).unwrap();
        let summary = Summary::build(&analysis, 10);

        assert_eq!(summary.counts.dataflow_functions, 3);
        assert_eq!(
            summary.dataflow.top_inputs,
            vec![
                InputCount { input: "path".into(), count: 2 },
                InputCount { input: "cfg".into(), count: 1 },
                InputCount { input: "env:*".into(), count: 1 },
            ]
        );
        assert_eq!(
            summary.dataflow.top_outputs,
            vec![
                OutputCount { output: "return".into(), count: 2 },
                OutputCount { output: "LIMIT".into(), count: 1 },
            ]
        );
        assert!(summary.to_markdown("jobs").contains("- `env:*`: **1**"));
    }

    #[test]
    fn test_build_from_analysis() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/__init__.py"), "").unwrap();
        fs::write(root.join("pkg/a.py"), "def f():\n    pass\n").unwrap();
        fs::write(
            root.join("pkg/b.py"),
            "import os\nimport subprocess\nfrom .a import f\n\ndef g():\n    f()\n    f()\n    subprocess.run(['ls'])\n",
        )
        .unwrap();
        fs::write(root.join("broken.py"), "def (:\n").unwrap();

        let analysis = Pipeline::new().with_threads(2).run(&root).unwrap();
        let summary = Summary::build(&analysis, 10);

        assert_eq!(summary.counts.files, 3);
        assert_eq!(summary.counts.functions, 2);
        assert_eq!(summary.counts.calls, 3);
        assert_eq!(summary.counts.resolved_calls, 2);
        assert_eq!(summary.counts.warnings, 1);
        assert_eq!(summary.counts.files_with_patterns, 1);
        assert_eq!(summary.counts.dataflow_functions, 2);
        assert!(summary.dataflow.top_inputs.is_empty());
        assert!(summary.dataflow.top_outputs.is_empty());

        assert_eq!(summary.call_graph.top_callers_by_calls[0].caller, "pkg.b.g");
        assert_eq!(summary.call_graph.top_callers_by_calls[0].calls, 3);
        assert_eq!(summary.call_graph.top_fanout_callers[0].unique_callees, 2);
        assert_eq!(summary.module_graph.top_out_degree[0].module, "pkg.b");
        assert_eq!(summary.module_graph.top_out_degree[0].degree, 3);
        assert_eq!(
            summary.patterns,
            vec![PatternCount { pattern: "devops:shell".into(), count: 1 }]
        );

        let md = summary.to_markdown("demo");
        assert!(md.contains("Files analyzed: **3**"));
        assert!(md.contains("`devops:shell`"));
        assert!(md.contains("Dataflow functions: **2**"));
    }
}
