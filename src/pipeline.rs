//! Two-phase analysis pipeline
//!
//! Phase one extracts every file independently on a pool of worker threads.
//! Phase two waits for all of them, then links modules and resolves calls
//! against the complete function set.

use crate::adapter::{FileExtraction, LanguageAdapter, PythonAdapter};
use crate::dataflow::DataflowRecord;
use crate::graph::{CallGraph, ModuleGraph, ModuleNode};
use crate::imports::AliasMap;
use crate::layout::PackageLayout;
use crate::linker::{CallLinker, CallLinkerStats, ModuleLinker};
use crate::module_name;
use crate::patterns::{self, PatternHit};
use crate::scanner::Scanner;
use crate::symbol::{CallRecord, FunctionRecord, ResolvedCall};
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::{Error, ExtractMessage, FileError, Result};
use crossbeam::channel::{self, Sender};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of phase one for a single file.
pub type FileOutcome = std::result::Result<FileExtraction, FileError>;

/// Everything one run produces. Built once, read-only afterwards.
#[derive(Debug)]
pub struct Analysis {
    pub layout: PackageLayout,
    /// Every scanned file with its module name, parsed or not
    pub modules: Vec<ModuleNode>,
    /// Per-file extraction results, sorted by file
    pub extractions: Vec<FileExtraction>,
    pub module_graph: ModuleGraph,
    /// All functions, sorted by file then line
    pub functions: Vec<FunctionRecord>,
    /// All raw calls, sorted by file then line
    pub calls: Vec<CallRecord>,
    pub call_graph: CallGraph,
    pub call_stats: CallLinkerStats,
    /// Per-function dataflow, sorted by file then line
    pub dataflow: Vec<DataflowRecord>,
    pub patterns: Vec<PatternHit>,
    pub errors: Vec<FileError>,
    pub elapsed: Duration,
}

impl Analysis {
    pub fn root(&self) -> &Path {
        self.layout.repo_root()
    }

    /// One resolved call per raw call, same order as `calls`.
    pub fn resolved_calls(&self) -> &[ResolvedCall] {
        self.call_graph.calls()
    }

    pub fn scanned_files(&self) -> usize {
        self.modules.len()
    }
}

pub struct Pipeline {
    scanner: Scanner,
    adapter: Box<dyn LanguageAdapter>,
    threads: usize,
    progress: Option<Sender<ProgressMessage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Python pipeline with default exclusions, one worker per available core.
    pub fn new() -> Self {
        let adapter = PythonAdapter::new();
        let scanner = Scanner::new(adapter.file_extensions());
        Self {
            scanner,
            adapter: Box::new(adapter),
            threads: default_threads(),
            progress: None,
        }
    }

    pub fn with_scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_adapter(mut self, adapter: Box<dyn LanguageAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Worker count for phase one. Zero means available parallelism.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = if threads == 0 { default_threads() } else { threads };
        self
    }

    pub fn with_progress(mut self, tx: Sender<ProgressMessage>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn notify(&self, msg: ProgressMessage) {
        if let Some(tx) = &self.progress {
            // The receiver may be gone when output is not a terminal.
            let _ = tx.send(msg);
        }
    }

    /// Scan `root` and run both phases.
    pub fn run(&self, root: &Path) -> Result<Analysis> {
        let started = Instant::now();

        let layout = PackageLayout::detect(root);
        self.notify(ProgressMessage::Started {
            phase: ProgressPhase::Scanning,
            total: 0,
        });
        let files = self.scanner.scan(layout.repo_root())?;
        self.notify(ProgressMessage::Finished {
            phase: ProgressPhase::Scanning,
        });
        info!("Scanned {} source files under {}", files.len(), layout.repo_root().display());

        let mut analysis = self.analyze_files(layout, &files)?;
        analysis.elapsed = started.elapsed();
        info!("Analysis finished in {:?}", analysis.elapsed);
        Ok(analysis)
    }

    /// Run both phases over an explicit file set.
    pub fn analyze_files(&self, layout: PackageLayout, files: &[PathBuf]) -> Result<Analysis> {
        let started = Instant::now();

        let modules: Vec<ModuleNode> = files
            .iter()
            .map(|f| ModuleNode {
                module: module_name::resolve(&layout, f),
                file: f.display().to_string(),
            })
            .collect();

        // Phase one
        let (mut extractions, mut errors) = self.extract_all(&layout, files)?;
        extractions.sort_by(|a, b| a.file.cmp(&b.file));
        errors.sort_by(|a, b| a.file.cmp(&b.file));
        debug!(
            "Extracted {} files ({} failed) in {:?}",
            extractions.len(),
            errors.len(),
            started.elapsed()
        );

        // Phase two
        self.notify(ProgressMessage::Started {
            phase: ProgressPhase::Linking,
            total: extractions.len(),
        });

        let module_graph = ModuleLinker::new(modules.iter().map(|m| &m.module)).link(&extractions);

        let mut functions: Vec<FunctionRecord> = extractions
            .iter()
            .flat_map(|e| e.functions.iter().cloned())
            .collect();
        functions.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

        let mut calls: Vec<CallRecord> = extractions
            .iter()
            .flat_map(|e| e.calls.iter().cloned())
            .collect();
        calls.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

        let aliases: HashMap<String, AliasMap> = extractions
            .iter()
            .map(|e| (e.file_key(), e.aliases.clone()))
            .collect();
        let (resolved, call_stats) = CallLinker::new(&functions, &aliases).run(&calls);
        debug!("{}", call_stats);
        let call_graph = CallGraph::new(&functions, resolved);

        let mut dataflow: Vec<DataflowRecord> = extractions
            .iter()
            .flat_map(|e| e.dataflow.iter().cloned())
            .collect();
        dataflow.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

        let patterns = extractions
            .iter()
            .map(|e| PatternHit {
                file: e.file_key(),
                patterns: e.patterns.clone(),
            })
            .collect();

        self.notify(ProgressMessage::Finished {
            phase: ProgressPhase::Linking,
        });

        Ok(Analysis {
            layout,
            modules,
            extractions,
            module_graph,
            functions,
            calls,
            call_graph,
            call_stats,
            dataflow,
            patterns,
            errors,
            elapsed: started.elapsed(),
        })
    }

    /// Extract one file. Read and parse failures become a `FileError`.
    pub fn extract_file(&self, layout: &PackageLayout, path: &Path) -> FileOutcome {
        let file = path.display().to_string();
        let module = module_name::resolve(layout, path);

        let bytes = std::fs::read(path).map_err(|e| FileError::new(&file, e.to_string()))?;
        let content = String::from_utf8(bytes).map_err(|e| {
            FileError::new(&file, format!("not valid UTF-8 (byte offset {})", e.utf8_error().valid_up_to()))
        })?;

        let mut extraction = self
            .adapter
            .extract(path, &module, &content)
            .map_err(|e| FileError::new(&file, e.to_string()))?;
        extraction.patterns = patterns::detect(&extraction);
        Ok(extraction)
    }

    fn extract_all(
        &self,
        layout: &PackageLayout,
        files: &[PathBuf],
    ) -> Result<(Vec<FileExtraction>, Vec<FileError>)> {
        self.notify(ProgressMessage::Started {
            phase: ProgressPhase::Parsing,
            total: files.len(),
        });

        let (job_tx, job_rx) = channel::unbounded::<&Path>();
        for file in files {
            if job_tx.send(file.as_path()).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) = channel::unbounded::<ExtractMessage>();
        let workers = self.threads.clamp(1, files.len().max(1));
        debug!("Extracting {} files on {} workers", files.len(), workers);

        let collected = crossbeam::thread::scope(|s| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                s.spawn(move |_| {
                    for path in job_rx.iter() {
                        let msg = match self.extract_file(layout, path) {
                            Ok(extraction) => ExtractMessage::Extracted(Box::new(extraction)),
                            Err(err) => ExtractMessage::Failed(err),
                        };
                        if result_tx.send(msg).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            let mut extractions = Vec::with_capacity(files.len());
            let mut errors = Vec::new();
            for (current, msg) in result_rx.iter().enumerate() {
                let file = match msg {
                    ExtractMessage::Extracted(extraction) => {
                        let file = extraction.file_key();
                        extractions.push(*extraction);
                        file
                    }
                    ExtractMessage::Failed(err) => {
                        warn!("Skipping {}", err);
                        self.notify(ProgressMessage::Error(err.to_string()));
                        let file = err.file.clone();
                        errors.push(err);
                        file
                    }
                };
                self.notify(ProgressMessage::Progress {
                    phase: ProgressPhase::Parsing,
                    current: current + 1,
                    file: Some(file),
                });
            }
            (extractions, errors)
        })
        .map_err(|_| Error::Adapter("extraction worker panicked".to_string()))?;

        self.notify(ProgressMessage::Finished {
            phase: ProgressPhase::Parsing,
        });
        Ok(collected)
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_run_collects_and_sorts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "pkg/__init__.py", "");
        write(&root, "pkg/b.py", "from .a import f\n\ndef g():\n    f()\n");
        write(&root, "pkg/a.py", "def f():\n    pass\n");

        let analysis = Pipeline::new().with_threads(2).run(&root).unwrap();

        assert_eq!(analysis.scanned_files(), 3);
        assert!(analysis.errors.is_empty());
        let qualnames: Vec<&str> = analysis.functions.iter().map(|f| f.qualname.as_str()).collect();
        assert_eq!(qualnames, vec!["pkg.a.f", "pkg.b.g"]);
        assert_eq!(analysis.resolved_calls().len(), analysis.calls.len());
        assert_eq!(analysis.call_stats.resolved, 1);
        assert_eq!(analysis.patterns.len(), 3);
        let flows: Vec<&str> = analysis.dataflow.iter().map(|d| d.function.as_str()).collect();
        assert_eq!(flows, vec!["pkg.a.f", "pkg.b.g"]);
        assert_eq!(analysis.dataflow[1].transforms, vec!["f"]);
    }

    #[test]
    fn test_non_utf8_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "ok.py", "def f():\n    pass\n");
        fs::write(root.join("bad.py"), [0x66, 0xff, 0xfe, 0x0a]).unwrap();

        let analysis = Pipeline::new().with_threads(1).run(&root).unwrap();
        assert_eq!(analysis.errors.len(), 1);
        assert!(analysis.errors[0].file.ends_with("bad.py"));
        assert!(analysis.errors[0].message.contains("UTF-8"));
        assert_eq!(analysis.functions.len(), 1);
        // Failed files keep their module identity but get no graph node
        assert_eq!(analysis.modules.len(), 2);
        assert_eq!(analysis.module_graph.nodes().len(), 1);
    }

    #[test]
    fn test_progress_messages() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "m.py", "import os\n");

        let (tx, rx) = channel::unbounded();
        let pipeline = Pipeline::new().with_progress(tx);
        pipeline.run(&root).unwrap();
        drop(pipeline);

        let messages: Vec<ProgressMessage> = rx.iter().collect();
        assert!(messages.iter().any(|m| matches!(
            m,
            ProgressMessage::Progress { phase: ProgressPhase::Parsing, current: 1, .. }
        )));
        assert!(messages.iter().any(|m| matches!(
            m,
            ProgressMessage::Finished { phase: ProgressPhase::Linking }
        )));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(Pipeline::new().run(&missing).is_err());
    }
}
