use crate::{OutputMode, ScanArgs, emit_success};
use depscope::adapter::{LanguageAdapter, PythonAdapter};
use depscope::config::{self, DepscopeConfig};
use depscope::output::{self, SUMMARY_ITEMS};
use depscope::summary::Summary;
use depscope::ui::{self, Icons, ProgressManager, dim, header, section, status, success, theme, warn};
use depscope::{Analysis, Pipeline};
use owo_colors::OwoColorize;
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct ModuleRow {
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Imports")]
    out_degree: usize,
    #[tabled(rename = "Imported by")]
    in_degree: usize,
    #[tabled(rename = "File")]
    file: String,
}

fn build_pipeline(config: &DepscopeConfig, scan: &ScanArgs) -> Pipeline {
    let adapter = PythonAdapter::new();
    let scanner = config.scanner(adapter.file_extensions(), &scan.exclude);
    Pipeline::new()
        .with_scanner(scanner)
        .with_adapter(Box::new(adapter))
        .with_threads(config.threads(scan.threads))
}

/// Run the pipeline, with a progress display in human mode.
fn analyze(mode: OutputMode, config: &DepscopeConfig, scan: &ScanArgs) -> anyhow::Result<Analysis> {
    let pipeline = build_pipeline(config, scan);
    if !mode.is_human() {
        return Ok(pipeline.run(&scan.path)?);
    }

    let (progress, tx) = ProgressManager::new();
    let pipeline = pipeline.with_progress(tx);
    let analysis = pipeline.run(&scan.path);
    // Dropping the pipeline closes the progress channel
    drop(pipeline);
    let analysis = analysis?;

    progress.finish_with_summary(
        analysis.elapsed,
        analysis.scanned_files(),
        analysis.functions.len(),
        analysis.module_graph.edges().len(),
    );
    report_errors(&analysis);
    Ok(analysis)
}

fn report_errors(analysis: &Analysis) {
    if analysis.errors.is_empty() {
        return;
    }
    warn(&format!(
        "{} files failed to parse and were excluded from the graphs",
        analysis.errors.len()
    ));
    for err in &analysis.errors {
        eprintln!("  {}", dim(&err.to_string()));
    }
}

fn stats_rows(analysis: &Analysis) -> Vec<(&'static str, String)> {
    let modules = analysis.module_graph.stats();
    let calls = analysis.call_graph.stats();
    vec![
        ("Files scanned", analysis.scanned_files().to_string()),
        ("Parse errors", analysis.errors.len().to_string()),
        ("Modules", modules.modules.to_string()),
        ("Import edges", modules.edges.to_string()),
        ("  local", modules.local_edges.to_string()),
        ("  external", modules.external_edges.to_string()),
        ("External targets", modules.external_targets.to_string()),
        ("Functions", calls.functions.to_string()),
        ("Calls", calls.calls.to_string()),
        ("  resolved", calls.resolved.to_string()),
        ("  unresolved", calls.unresolved.to_string()),
        ("Resolution rate", format!("{:.1}%", calls.resolution_rate() * 100.0)),
        ("Dataflow functions", analysis.dataflow.len().to_string()),
    ]
}

pub fn run_analyze(
    mode: OutputMode,
    config: &DepscopeConfig,
    scan: &ScanArgs,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let out_dir = config.out_dir(out);
    if mode.is_human() {
        header("Analyzing Python sources");
        status(Icons::ROOT, "Path", &scan.path.display().to_string());
        status(Icons::ARTIFACTS, "Output", &out_dir.display().to_string());
    }

    let analysis = analyze(mode, config, scan)?;
    let written = output::write_artifacts(&analysis, &out_dir)?;

    if mode.is_human() {
        section("Statistics");
        let rows = stats_rows(&analysis);
        println!("{}", ui::stats_table(&rows));
        success(&format!("Wrote {} artifacts to {}", written.len(), out_dir.display()));
    } else {
        let data = serde_json::json!({
            "root": analysis.root(),
            "out": out_dir,
            "artifacts": written,
            "summary": Summary::build(&analysis, SUMMARY_ITEMS),
            "errors": analysis.errors,
        });
        emit_success(mode, "analyze", data)?;
    }
    Ok(())
}

pub fn run_modules(
    mode: OutputMode,
    config: &DepscopeConfig,
    scan: &ScanArgs,
    show_edges: bool,
) -> anyhow::Result<()> {
    let analysis = analyze(mode, config, scan)?;
    let graph = &analysis.module_graph;

    if mode.is_human() {
        let rows: Vec<ModuleRow> = graph
            .nodes()
            .iter()
            .map(|n| ModuleRow {
                module: n.module.to_string(),
                out_degree: graph.out_degree(n.module.as_str()),
                in_degree: graph.in_degree(n.module.as_str()),
                file: n.file.clone(),
            })
            .collect();
        section(&format!("Modules ({})", rows.len()));
        println!("{}", ui::render(&rows));
        if show_edges {
            let t = theme();
            section(&format!("Edges ({})", graph.edges().len()));
            for edge in graph.edges() {
                println!(
                    "{} -> {} {}",
                    edge.src_module.style(t.module),
                    edge.dst.style(t.edge_kind(edge.kind)),
                    dim(&format!("[{}] {}", edge.kind, edge.raw_import))
                );
            }
        }
    } else {
        let modules: Vec<serde_json::Value> = graph
            .nodes()
            .iter()
            .map(|n| {
                serde_json::json!({
                    "module": n.module,
                    "file": n.file,
                    "dependencies": graph.dependencies(n.module.as_str(), None),
                    "dependents": graph.dependents(n.module.as_str()),
                })
            })
            .collect();
        let mut data = serde_json::json!({ "modules": modules, "errors": analysis.errors });
        if show_edges {
            data["edges"] = serde_json::to_value(graph.edges())?;
        }
        emit_success(mode, "modules", data)?;
    }
    Ok(())
}

pub fn run_calls(
    mode: OutputMode,
    config: &DepscopeConfig,
    scan: &ScanArgs,
    only_unresolved: bool,
) -> anyhow::Result<()> {
    let analysis = analyze(mode, config, scan)?;
    let calls: Vec<_> = analysis
        .resolved_calls()
        .iter()
        .filter(|c| !only_unresolved || !c.is_resolved())
        .collect();

    if mode.is_human() {
        section(&format!("Calls ({})", calls.len()));
        for call in &calls {
            let t = theme();
            let target = match &call.resolved {
                Some(target) => format!("{} {}", Icons::EDGE, target.style(t.call_target(true))),
                None => "unresolved".style(t.call_target(false)).to_string(),
            };
            println!(
                "{}:{} {} -> {} {}",
                call.file,
                call.line,
                call.caller.style(t.function),
                call.callee,
                target
            );
        }
    } else {
        emit_success(mode, "calls", serde_json::json!({ "calls": calls, "errors": analysis.errors }))?;
    }
    Ok(())
}

fn unknown_function(mode: OutputMode, command: &str, function: &str) -> anyhow::Result<()> {
    if mode.is_human() {
        println!("{} {} is not a known function.", Icons::NONE, function);
        Ok(())
    } else {
        emit_success(
            mode,
            command,
            serde_json::json!({ "function": function, "known": false, "results": [] }),
        )
    }
}

fn print_ranked(results: &[(&str, usize)], analysis: &Analysis) {
    for (qualname, depth) in results {
        let prefix = if *depth == 1 { Icons::HOP_DIRECT } else { Icons::HOP_TRANSITIVE };
        let location = analysis
            .call_graph
            .function(qualname)
            .map(|f| format!("{}:{}", f.file, f.line))
            .unwrap_or_default();
        println!("{} {} (depth {}) {}", prefix, qualname.style(theme().function), depth, dim(&location));
    }
}

fn ranked_json(results: &[(&str, usize)], analysis: &Analysis) -> Vec<serde_json::Value> {
    results
        .iter()
        .map(|(qualname, depth)| {
            let function = analysis.call_graph.function(qualname);
            serde_json::json!({
                "function": qualname,
                "depth": depth,
                "file": function.map(|f| f.file.as_str()),
                "line": function.map(|f| f.line),
            })
        })
        .collect()
}

pub fn run_callers(
    mode: OutputMode,
    config: &DepscopeConfig,
    scan: &ScanArgs,
    function: &str,
    depth: usize,
) -> anyhow::Result<()> {
    let analysis = analyze(mode, config, scan)?;
    if analysis.call_graph.function(function).is_none() {
        return unknown_function(mode, "callers", function);
    }

    let callers = analysis.call_graph.impact(function, depth.max(1));
    if mode.is_human() {
        println!("{} Callers of {} (depth: {})", Icons::CALL, function, depth);
        if callers.is_empty() {
            println!("{} No callers found.", Icons::NONE);
        } else {
            print_ranked(&callers, &analysis);
        }
    } else {
        let data = serde_json::json!({
            "function": function,
            "known": true,
            "results": ranked_json(&callers, &analysis),
        });
        emit_success(mode, "callers", data)?;
    }
    Ok(())
}

pub fn run_callees(
    mode: OutputMode,
    config: &DepscopeConfig,
    scan: &ScanArgs,
    function: &str,
    depth: usize,
) -> anyhow::Result<()> {
    let analysis = analyze(mode, config, scan)?;
    if analysis.call_graph.function(function).is_none() {
        return unknown_function(mode, "callees", function);
    }

    let callees = analysis.call_graph.reach(function, depth.max(1));
    let unresolved: Vec<&str> = analysis
        .call_graph
        .calls_from(function)
        .filter(|c| !c.is_resolved())
        .map(|c| c.callee.as_str())
        .collect();

    if mode.is_human() {
        println!("{} Callees of {} (depth: {})", Icons::CALL, function, depth);
        if callees.is_empty() && unresolved.is_empty() {
            println!("{} No callees found.", Icons::NONE);
        }
        print_ranked(&callees, &analysis);
        for raw in &unresolved {
            println!("  {} {}", "unresolved:".style(theme().unresolved), raw);
        }
    } else {
        let data = serde_json::json!({
            "function": function,
            "known": true,
            "results": ranked_json(&callees, &analysis),
            "unresolved": unresolved,
        });
        emit_success(mode, "callees", data)?;
    }
    Ok(())
}

pub fn run_stats(mode: OutputMode, config: &DepscopeConfig, scan: &ScanArgs) -> anyhow::Result<()> {
    let analysis = analyze(mode, config, scan)?;

    if mode.is_human() {
        println!("{} Depscope Statistics ({})", Icons::STATS, analysis.root().display());
        println!("{}", ui::stats_table(&stats_rows(&analysis)));
        println!("{}", analysis.call_stats);
    } else {
        let data = serde_json::json!({
            "module_graph": analysis.module_graph.stats(),
            "call_graph": analysis.call_graph.stats(),
            "resolution": analysis.call_stats,
            "errors": analysis.errors,
        });
        emit_success(mode, "stats", data)?;
    }
    Ok(())
}

pub fn run_init(mode: OutputMode, path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);
    config::write_config(&path, &DepscopeConfig::template(), force)?;

    if mode.is_human() {
        success(&format!("Wrote {}", path.display()));
    } else {
        emit_success(mode, "init", serde_json::json!({ "config": path }))?;
    }
    Ok(())
}
