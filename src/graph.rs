//! Graph views - in-memory indices over linked edges
//!
//! `ModuleGraph` indexes import edges by source and destination module.
//! `CallGraph` indexes resolved calls by caller and by target; queries that
//! walk the call graph only follow resolved edges.

use crate::edge::{EdgeKind, ModuleEdge};
use crate::module_name::ModuleName;
use crate::symbol::{FunctionRecord, ResolvedCall};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// A successfully parsed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub module: ModuleName,
    pub file: String,
}

/// Module dependency graph.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    nodes: Vec<ModuleNode>,
    edges: Vec<ModuleEdge>,
    /// Edge indices by importing module
    edges_from: HashMap<String, Vec<usize>>,
    /// Edge indices by destination text
    edges_to: HashMap<String, Vec<usize>>,
}

impl ModuleGraph {
    pub fn new(nodes: Vec<ModuleNode>, edges: Vec<ModuleEdge>) -> Self {
        let mut edges_from: HashMap<String, Vec<usize>> = HashMap::new();
        let mut edges_to: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            edges_from.entry(edge.src_module.as_str().to_string()).or_default().push(i);
            edges_to.entry(edge.dst.clone()).or_default().push(i);
        }
        Self {
            nodes,
            edges,
            edges_from,
            edges_to,
        }
    }

    pub fn nodes(&self) -> &[ModuleNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[ModuleEdge] {
        &self.edges
    }

    pub fn edges_from(&self, module: &str) -> impl Iterator<Item = &ModuleEdge> {
        self.edges_from
            .get(module)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    pub fn edges_to(&self, module: &str) -> impl Iterator<Item = &ModuleEdge> {
        self.edges_to
            .get(module)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Distinct modules imported by `module`, sorted.
    pub fn dependencies(&self, module: &str, kind: Option<EdgeKind>) -> Vec<&str> {
        let deps: BTreeSet<&str> = self
            .edges_from(module)
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .map(|e| e.dst.as_str())
            .collect();
        deps.into_iter().collect()
    }

    /// Distinct local modules importing `module`, sorted.
    pub fn dependents(&self, module: &str) -> Vec<&str> {
        let deps: BTreeSet<&str> = self
            .edges_to(module)
            .filter(|e| e.is_local())
            .map(|e| e.src_module.as_str())
            .collect();
        deps.into_iter().collect()
    }

    /// Number of import edges leaving `module`.
    pub fn out_degree(&self, module: &str) -> usize {
        self.edges_from.get(module).map_or(0, Vec::len)
    }

    /// Number of local import edges arriving at `module`.
    pub fn in_degree(&self, module: &str) -> usize {
        self.edges_to(module).filter(|e| e.is_local()).count()
    }

    pub fn stats(&self) -> ModuleGraphStats {
        let local_edges = self.edges.iter().filter(|e| e.is_local()).count();
        let external_targets: HashSet<&str> = self
            .edges
            .iter()
            .filter(|e| !e.is_local())
            .map(|e| e.dst.as_str())
            .collect();
        ModuleGraphStats {
            modules: self.nodes.len(),
            edges: self.edges.len(),
            local_edges,
            external_edges: self.edges.len() - local_edges,
            external_targets: external_targets.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleGraphStats {
    pub modules: usize,
    pub edges: usize,
    pub local_edges: usize,
    pub external_edges: usize,
    pub external_targets: usize,
}

impl fmt::Display for ModuleGraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Module Graph Statistics:")?;
        writeln!(f, "  Modules: {}", self.modules)?;
        writeln!(
            f,
            "  Edges: {} (local: {}, external: {})",
            self.edges, self.local_edges, self.external_edges
        )?;
        writeln!(f, "  Distinct external targets: {}", self.external_targets)
    }
}

/// Call graph over resolved calls.
#[derive(Debug, Default)]
pub struct CallGraph {
    functions: HashMap<String, FunctionRecord>,
    calls: Vec<ResolvedCall>,
    /// Call indices by caller
    calls_from: HashMap<String, Vec<usize>>,
    /// Call indices by resolved target
    calls_to: HashMap<String, Vec<usize>>,
}

impl CallGraph {
    pub fn new(functions: &[FunctionRecord], calls: Vec<ResolvedCall>) -> Self {
        let mut calls_from: HashMap<String, Vec<usize>> = HashMap::new();
        let mut calls_to: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, call) in calls.iter().enumerate() {
            calls_from.entry(call.caller.clone()).or_default().push(i);
            if let Some(target) = &call.resolved {
                calls_to.entry(target.clone()).or_default().push(i);
            }
        }
        Self {
            functions: functions
                .iter()
                .map(|f| (f.qualname.clone(), f.clone()))
                .collect(),
            calls,
            calls_from,
            calls_to,
        }
    }

    pub fn function(&self, qualname: &str) -> Option<&FunctionRecord> {
        self.functions.get(qualname)
    }

    pub fn calls(&self) -> &[ResolvedCall] {
        &self.calls
    }

    /// Every call made by `caller`, resolved or not, in record order.
    pub fn calls_from(&self, caller: &str) -> impl Iterator<Item = &ResolvedCall> {
        self.calls_from
            .get(caller)
            .into_iter()
            .flatten()
            .map(|&i| &self.calls[i])
    }

    /// Every call resolved to `target`, in record order.
    pub fn calls_to(&self, target: &str) -> impl Iterator<Item = &ResolvedCall> {
        self.calls_to
            .get(target)
            .into_iter()
            .flatten()
            .map(|&i| &self.calls[i])
    }

    /// Distinct resolved callees of `caller`, sorted.
    pub fn callees(&self, caller: &str) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .calls_from(caller)
            .filter_map(|c| c.resolved.as_deref())
            .collect();
        set.into_iter().collect()
    }

    /// Distinct callers whose calls resolve to `target`, sorted.
    pub fn callers(&self, target: &str) -> Vec<&str> {
        let set: BTreeSet<&str> = self.calls_to(target).map(|c| c.caller.as_str()).collect();
        set.into_iter().collect()
    }

    /// Functions that transitively call `target`, up to `depth` hops.
    ///
    /// Breadth-first over reverse resolved edges; each function is reported
    /// once, at the shortest distance found. The target itself is excluded.
    pub fn impact(&self, target: &str, depth: usize) -> Vec<(&str, usize)> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        let mut affected = Vec::new();

        let Some((start, _)) = self.functions.get_key_value(target) else {
            return affected;
        };
        visited.insert(start.as_str());
        queue.push_back((start.as_str(), 0));

        while let Some((current, distance)) = queue.pop_front() {
            if distance >= depth {
                continue;
            }
            for caller in self.callers(current) {
                if visited.insert(caller) {
                    affected.push((caller, distance + 1));
                    queue.push_back((caller, distance + 1));
                }
            }
        }

        affected
    }

    /// Functions reachable from `caller` through resolved calls, up to `depth` hops.
    pub fn reach(&self, caller: &str, depth: usize) -> Vec<(&str, usize)> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        let mut reached = Vec::new();

        let Some((start, _)) = self.functions.get_key_value(caller) else {
            return reached;
        };
        visited.insert(start.as_str());
        queue.push_back((start.as_str(), 0));

        while let Some((current, distance)) = queue.pop_front() {
            if distance >= depth {
                continue;
            }
            for callee in self.callees(current) {
                if visited.insert(callee) {
                    reached.push((callee, distance + 1));
                    queue.push_back((callee, distance + 1));
                }
            }
        }

        reached
    }

    pub fn stats(&self) -> CallGraphStats {
        let resolved = self.calls.iter().filter(|c| c.is_resolved()).count();
        let callers: HashSet<&str> = self.calls.iter().map(|c| c.caller.as_str()).collect();
        CallGraphStats {
            functions: self.functions.len(),
            calls: self.calls.len(),
            resolved,
            unresolved: self.calls.len() - resolved,
            callers: callers.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallGraphStats {
    pub functions: usize,
    pub calls: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub callers: usize,
}

impl CallGraphStats {
    /// Share of calls resolved to a local function, 0.0 when there are no calls.
    pub fn resolution_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.resolved as f64 / self.calls as f64
        }
    }
}

impl fmt::Display for CallGraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call Graph Statistics:")?;
        writeln!(f, "  Functions: {}", self.functions)?;
        writeln!(f, "  Callers: {}", self.callers)?;
        writeln!(
            f,
            "  Calls: {} (resolved: {}, unresolved: {}, {:.1}%)",
            self.calls,
            self.resolved,
            self.unresolved,
            self.resolution_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(s: &str) -> ModuleName {
        ModuleName::parse(s).unwrap()
    }

    fn sample_modules() -> ModuleGraph {
        let nodes = vec![
            ModuleNode { module: module("pkg.a"), file: "/r/pkg/a.py".into() },
            ModuleNode { module: module("pkg.b"), file: "/r/pkg/b.py".into() },
            ModuleNode { module: module("pkg.c"), file: "/r/pkg/c.py".into() },
        ];
        let edges = vec![
            ModuleEdge::local(module("pkg.b"), "pkg.a", "import pkg.a"),
            ModuleEdge::local(module("pkg.c"), "pkg.a", "from pkg.a import f"),
            ModuleEdge::local(module("pkg.c"), "pkg.a", "import pkg.a"),
            ModuleEdge::external(module("pkg.c"), "os", "import os"),
        ];
        ModuleGraph::new(nodes, edges)
    }

    fn function(q: &str) -> FunctionRecord {
        FunctionRecord::new(q, "/r/m.py", 1)
    }

    fn call(caller: &str, callee: &str, resolved: Option<&str>) -> ResolvedCall {
        ResolvedCall {
            caller: caller.into(),
            callee: callee.into(),
            resolved: resolved.map(str::to_string),
            file: "/r/m.py".into(),
            line: 1,
        }
    }

    #[test]
    fn test_module_dependencies_and_dependents() {
        let graph = sample_modules();
        assert_eq!(graph.dependencies("pkg.c", None), vec!["os", "pkg.a"]);
        assert_eq!(graph.dependencies("pkg.c", Some(EdgeKind::Local)), vec!["pkg.a"]);
        assert_eq!(graph.dependents("pkg.a"), vec!["pkg.b", "pkg.c"]);
        assert_eq!(graph.in_degree("pkg.a"), 3);
        assert_eq!(graph.out_degree("pkg.c"), 3);
        assert_eq!(graph.out_degree("pkg.a"), 0);
    }

    #[test]
    fn test_module_stats() {
        let stats = sample_modules().stats();
        assert_eq!(stats.modules, 3);
        assert_eq!(stats.edges, 4);
        assert_eq!(stats.local_edges, 3);
        assert_eq!(stats.external_edges, 1);
        assert_eq!(stats.external_targets, 1);
    }

    #[test]
    fn test_callers_and_callees() {
        let functions = vec![function("m.a"), function("m.b"), function("m.c")];
        let graph = CallGraph::new(
            &functions,
            vec![
                call("m.a", "b", Some("m.b")),
                call("m.a", "print", None),
                call("m.c", "m.b", Some("m.b")),
            ],
        );

        assert_eq!(graph.callees("m.a"), vec!["m.b"]);
        assert_eq!(graph.calls_from("m.a").count(), 2);
        assert_eq!(graph.callers("m.b"), vec!["m.a", "m.c"]);
        assert!(graph.callers("print").is_empty());
    }

    #[test]
    fn test_impact_respects_depth() {
        // a -> b -> c -> d
        let functions = vec![function("m.a"), function("m.b"), function("m.c"), function("m.d")];
        let graph = CallGraph::new(
            &functions,
            vec![
                call("m.a", "b", Some("m.b")),
                call("m.b", "c", Some("m.c")),
                call("m.c", "d", Some("m.d")),
            ],
        );

        let affected = graph.impact("m.d", 2);
        assert_eq!(affected, vec![("m.c", 1), ("m.b", 2)]);
        assert_eq!(graph.impact("m.d", 10).len(), 3);
        assert!(graph.impact("m.unknown", 3).is_empty());

        let reached = graph.reach("m.a", 1);
        assert_eq!(reached, vec![("m.b", 1)]);
    }

    #[test]
    fn test_impact_handles_cycles() {
        let functions = vec![function("m.a"), function("m.b")];
        let graph = CallGraph::new(
            &functions,
            vec![call("m.a", "b", Some("m.b")), call("m.b", "a", Some("m.a"))],
        );
        assert_eq!(graph.impact("m.a", 5), vec![("m.b", 1)]);
    }

    #[test]
    fn test_call_stats() {
        let functions = vec![function("m.a"), function("m.b")];
        let graph = CallGraph::new(
            &functions,
            vec![call("m.a", "b", Some("m.b")), call("m.a", "x", None)],
        );
        let stats = graph.stats();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.callers, 1);
        assert!((stats.resolution_rate() - 0.5).abs() < f64::EPSILON);
    }
}
