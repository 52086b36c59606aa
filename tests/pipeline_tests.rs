//! End-to-end scenarios over small on-disk trees.

use depscope::edge::EdgeKind;
use depscope::scanner::Scanner;
use depscope::{Analysis, ModuleName, PackageLayout, Pipeline};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn repo() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn analyze(root: &Path) -> Analysis {
    Pipeline::new().with_threads(4).run(root).unwrap()
}

fn resolved_for<'a>(analysis: &'a Analysis, caller: &str) -> Vec<(&'a str, Option<&'a str>)> {
    analysis
        .resolved_calls()
        .iter()
        .filter(|c| c.caller == caller)
        .map(|c| (c.callee.as_str(), c.resolved.as_deref()))
        .collect()
}

#[test]
fn relative_from_import_resolves_bare_call() {
    let (_dir, root) = repo();
    write(&root, "pkg/a.py", "def f(): pass\n");
    write(&root, "pkg/b.py", "from .a import f\ndef g(): f()\n");

    let analysis = analyze(&root);

    assert_eq!(resolved_for(&analysis, "pkg.b.g"), vec![("f", Some("pkg.a.f"))]);
    assert!(analysis.errors.is_empty());
}

#[test]
fn aliased_direct_import_resolves_dotted_call() {
    let (_dir, root) = repo();
    write(&root, "pkg/a.py", "def f(): pass\n");
    write(&root, "pkg/b.py", "import pkg.a as a\ndef g():\n    a.f()\n    a.missing()\n");

    let analysis = analyze(&root);

    assert_eq!(
        resolved_for(&analysis, "pkg.b.g"),
        vec![("a.f", Some("pkg.a.f")), ("a.missing", None)]
    );
}

#[test]
fn broken_file_is_reported_and_isolated() {
    let (_dir, root) = repo();
    write(&root, "pkg/a.py", "def f(): pass\n");
    write(&root, "pkg/b.py", "from .a import f\ndef g(): f()\n");
    let clean = analyze(&root);

    write(&root, "pkg/broken.py", "def broken(:\n    return\n");
    let analysis = analyze(&root);

    assert_eq!(analysis.errors.len(), 1);
    assert!(analysis.errors[0].file.ends_with("broken.py"));
    assert_eq!(analysis.functions, clean.functions);
    assert_eq!(analysis.resolved_calls(), clean.resolved_calls());
    assert_eq!(analysis.module_graph.edges(), clean.module_graph.edges());
    assert!(
        analysis
            .module_graph
            .nodes()
            .iter()
            .all(|n| n.module.as_str() != "pkg.broken")
    );
}

#[test]
fn external_and_local_edges_per_statement() {
    let (_dir, root) = repo();
    write(&root, "pkg/__init__.py", "");
    write(&root, "pkg/a.py", "def f(): pass\n");
    write(&root, "pkg/b.py", "import requests\nfrom . import a\n");

    let analysis = analyze(&root);
    let edges: Vec<_> = analysis.module_graph.edges_from("pkg.b").collect();

    let external: Vec<_> = edges.iter().filter(|e| e.raw_import == "import requests").collect();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].kind, EdgeKind::External);
    assert_eq!(external[0].dst, "requests");

    let sibling: Vec<_> = edges.iter().filter(|e| e.raw_import == "from . import a").collect();
    assert!(!sibling.is_empty());
    assert!(sibling.iter().all(|e| e.kind == EdgeKind::Local));
    let targets: Vec<&str> = sibling.iter().map(|e| e.dst.as_str()).collect();
    assert_eq!(targets, vec!["pkg", "pkg.a"]);
}

#[test]
fn same_package_relative_reference_is_enclosing_package() {
    let module = ModuleName::parse("pkg.sub.mod").unwrap();
    assert_eq!(module.resolve_relative(None, 1).unwrap().as_str(), "pkg.sub");
    assert_eq!(module.resolve_relative(Some("x"), 2).unwrap().as_str(), "pkg.x");
}

#[test]
fn escaping_relative_import_stays_unresolved() {
    let module = ModuleName::parse("pkg.b").unwrap();
    assert_eq!(module.resolve_relative(Some("x"), 3), None);

    let (_dir, root) = repo();
    write(&root, "pkg/a.py", "def f(): pass\n");
    write(&root, "pkg/b.py", "from ...a import f\ndef g(): f()\n");

    let analysis = analyze(&root);
    assert_eq!(resolved_for(&analysis, "pkg.b.g"), vec![("f", None)]);

    let edges: Vec<_> = analysis.module_graph.edges_from("pkg.b").collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].kind, EdgeKind::External);
    assert_eq!(edges[0].dst, "...a");
}

#[test]
fn src_and_monorepo_layouts_name_modules() {
    let (_dir, root) = repo();
    write(&root, "src/app/__init__.py", "");
    write(&root, "src/app/util.py", "def helper(): pass\n");
    write(&root, "packages/pkgA/src/pkgA/__init__.py", "");
    write(&root, "packages/pkgA/src/pkgA/util.py", "from app.util import helper\ndef run(): helper()\n");
    write(&root, "scripts/tool.py", "def main(): pass\n");

    let layout = PackageLayout::detect(&root);
    assert_eq!(
        layout.naming_roots(),
        &[root.join("src"), root.join("packages/pkgA/src"), root.clone()]
    );

    let analysis = analyze(&root);
    let names: Vec<&str> = analysis.module_graph.nodes().iter().map(|n| n.module.as_str()).collect();
    assert!(names.contains(&"app.util"));
    assert!(names.contains(&"pkgA.util"));
    assert!(names.contains(&"scripts.tool"));

    assert_eq!(
        resolved_for(&analysis, "pkgA.util.run"),
        vec![("helper", Some("app.util.helper"))]
    );
    let deps = analysis.module_graph.dependencies("pkgA.util", Some(EdgeKind::Local));
    assert_eq!(deps, vec!["app.util"]);
}

#[test]
fn excluded_directories_are_not_scanned() {
    let (_dir, root) = repo();
    write(&root, "app.py", "def main(): pass\n");
    write(&root, ".venv/lib/site.py", "def vendored(): pass\n");
    write(&root, "fixtures/sample.py", "def sample(): pass\n");

    let analysis = Pipeline::new()
        .with_scanner(Scanner::new(&["py"]).with_extra_excludes(["fixtures".to_string()]))
        .run(&root)
        .unwrap();

    let qualnames: Vec<&str> = analysis.functions.iter().map(|f| f.qualname.as_str()).collect();
    assert_eq!(qualnames, vec!["app.main"]);
}

#[test]
fn repeated_runs_are_identical() {
    let (_dir, root) = repo();
    for i in 0..12 {
        write(
            &root,
            &format!("pkg/m{}.py", i),
            &format!("from .m0 import f0\ndef f{}():\n    f0()\n", i),
        );
    }

    let first = analyze(&root);
    let second = Pipeline::new().with_threads(1).run(&root).unwrap();

    assert_eq!(first.functions, second.functions);
    assert_eq!(first.calls, second.calls);
    assert_eq!(first.resolved_calls(), second.resolved_calls());
    assert_eq!(first.module_graph.edges(), second.module_graph.edges());
    assert_eq!(first.call_graph.callers("pkg.m0.f0").len(), 12);
}

#[test]
fn decorator_call_resolves_under_decorated_function() {
    let (_dir, root) = repo();
    write(&root, "routes.py", "def get(path):\n    return path\n");
    write(
        &root,
        "app.py",
        "from routes import get\n\n@get('/x')\ndef handler():\n    pass\n",
    );

    let analysis = analyze(&root);

    assert_eq!(resolved_for(&analysis, "app.handler"), vec![("get", Some("routes.get"))]);
    assert_eq!(analysis.call_graph.callers("routes.get"), vec!["app.handler"]);
}

#[test]
fn top_level_shell_script_is_tagged() {
    let (_dir, root) = repo();
    write(&root, "deploy.py", "import subprocess\nsubprocess.run(['ls'])\n");

    let analysis = analyze(&root);

    assert!(analysis.calls.is_empty());
    assert_eq!(analysis.patterns[0].patterns, vec!["devops:shell"]);
}
