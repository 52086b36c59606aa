//! Call resolution
//!
//! Maps each raw call to a fully-qualified local function when the file's
//! alias map and the global function set allow it:
//! 1. Already-qualified: the raw text is itself a known function
//! 2. Bare name: `symbol_aliases[name]` + `.name`
//! 3. Dotted chain: `module_aliases[receiver]` + `.rest`
//!
//! Anything else stays unresolved. Unresolved is an outcome, not an error.

use crate::imports::AliasMap;
use crate::symbol::{CallRecord, CallTarget, FunctionRecord, ResolvedCall};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// How a call was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStrategy {
    /// Raw text already names a known function
    Qualified,
    /// Bare name bound by a from-style import
    SymbolAlias,
    /// Receiver bound by a direct import
    ModuleAlias,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CallLinkerStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub qualified: usize,
    pub symbol_alias: usize,
    pub module_alias: usize,
}

impl CallLinkerStats {
    fn record(&mut self, strategy: Option<ResolutionStrategy>) {
        self.total += 1;
        match strategy {
            None => self.unresolved += 1,
            Some(s) => {
                self.resolved += 1;
                match s {
                    ResolutionStrategy::Qualified => self.qualified += 1,
                    ResolutionStrategy::SymbolAlias => self.symbol_alias += 1,
                    ResolutionStrategy::ModuleAlias => self.module_alias += 1,
                }
            }
        }
    }
}

impl fmt::Display for CallLinkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call Linker Stats:")?;
        writeln!(f, "  Total Calls: {}", self.total)?;
        writeln!(
            f,
            "  Resolved: {} (qualified: {}, symbol alias: {}, module alias: {})",
            self.resolved, self.qualified, self.symbol_alias, self.module_alias
        )?;
        writeln!(f, "  Unresolved: {}", self.unresolved)
    }
}

/// Resolves calls against the global function set and per-file alias maps.
pub struct CallLinker<'a> {
    functions: HashSet<&'a str>,
    aliases_by_file: &'a HashMap<String, AliasMap>,
}

impl<'a> CallLinker<'a> {
    pub fn new(functions: &'a [FunctionRecord], aliases_by_file: &'a HashMap<String, AliasMap>) -> Self {
        Self {
            functions: functions.iter().map(|f| f.qualname.as_str()).collect(),
            aliases_by_file,
        }
    }

    pub fn is_known(&self, qualname: &str) -> bool {
        self.functions.contains(qualname)
    }

    /// Resolve one raw callee against a file's alias map.
    pub fn resolve_callee(&self, raw: &str, aliases: &AliasMap) -> Option<(String, ResolutionStrategy)> {
        if self.is_known(raw) {
            return Some((raw.to_string(), ResolutionStrategy::Qualified));
        }

        let (candidate, strategy) = match CallTarget::classify(raw) {
            CallTarget::BareName(name) => {
                let module = aliases.module_for_symbol(name)?;
                (format!("{}.{}", module, name), ResolutionStrategy::SymbolAlias)
            }
            CallTarget::DottedChain { receiver, tail } => {
                let module = aliases.module_for_alias(receiver)?;
                (format!("{}.{}", module, tail), ResolutionStrategy::ModuleAlias)
            }
            CallTarget::Unrecognized(_) => return None,
        };

        if self.is_known(&candidate) {
            Some((candidate, strategy))
        } else {
            trace!("Candidate {} for {} is not a known function", candidate, raw);
            None
        }
    }

    /// Resolve one call. Calls from files without an alias map stay unresolved.
    pub fn resolve(&self, call: &CallRecord) -> (ResolvedCall, Option<ResolutionStrategy>) {
        let outcome = self
            .aliases_by_file
            .get(&call.file)
            .and_then(|aliases| self.resolve_callee(&call.callee, aliases));
        match outcome {
            Some((target, strategy)) => (ResolvedCall::from_call(call, Some(target)), Some(strategy)),
            None => (ResolvedCall::from_call(call, None), None),
        }
    }

    /// Resolve every call, one output per input, in input order.
    pub fn run(&self, calls: &[CallRecord]) -> (Vec<ResolvedCall>, CallLinkerStats) {
        let mut stats = CallLinkerStats::default();
        let resolved = calls
            .iter()
            .map(|call| {
                let (resolved, strategy) = self.resolve(call);
                stats.record(strategy);
                resolved
            })
            .collect();
        debug!("Resolved {}/{} calls", stats.resolved, stats.total);
        (resolved, stats)
    }
}
