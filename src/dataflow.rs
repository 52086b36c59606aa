//! Heuristic per-function dataflow
//!
//! A cheap sketch of what flows through each function: parameters and
//! environment lookups in, names called in the body, returned values and
//! module-style constants out. Nothing here is resolved; it is read straight
//! off the syntax tree while the extractor walks a function.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Input recorded when a function calls `.get(...)` or `.getenv(...)`.
pub const ENV_INPUT: &str = "env:*";
/// Output recorded when a function contains a `return`.
pub const RETURN_OUTPUT: &str = "return";

const ENV_ACCESSORS: &[&str] = &["get", "getenv"];

/// Dataflow sketch for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataflowRecord {
    pub function: String,
    pub file: String,
    #[serde(rename = "lineno")]
    pub line: u32,
    /// Parameter names plus `env:*`, sorted
    pub inputs: Vec<String>,
    /// Called names in the order they appear
    pub transforms: Vec<String>,
    /// `return` and ALL_CAPS assignment targets, sorted
    pub outputs: Vec<String>,
}

/// Dataflow being collected for a function that is still open.
#[derive(Debug, Clone)]
pub struct DataflowFrame {
    function: String,
    line: u32,
    inputs: BTreeSet<String>,
    transforms: Vec<String>,
    outputs: BTreeSet<String>,
}

impl DataflowFrame {
    pub fn new(function: impl Into<String>, line: u32, params: impl IntoIterator<Item = String>) -> Self {
        Self {
            function: function.into(),
            line,
            inputs: params.into_iter().collect(),
            transforms: Vec::new(),
            outputs: BTreeSet::new(),
        }
    }

    /// `name` is the called name without its receiver; `via_attribute` is set
    /// for `x.name(...)` calls.
    pub fn record_call(&mut self, name: &str, via_attribute: bool) {
        self.transforms.push(name.to_string());
        if via_attribute && ENV_ACCESSORS.contains(&name) {
            self.inputs.insert(ENV_INPUT.to_string());
        }
    }

    pub fn record_return(&mut self) {
        self.outputs.insert(RETURN_OUTPUT.to_string());
    }

    /// Plain-name assignment target; only constant-style names are kept.
    pub fn record_assignment(&mut self, target: &str) {
        if is_constant_name(target) {
            self.outputs.insert(target.to_string());
        }
    }

    pub fn finish(self, file: &str) -> DataflowRecord {
        DataflowRecord {
            function: self.function,
            file: file.to_string(),
            line: self.line,
            inputs: self.inputs.into_iter().collect(),
            transforms: self.transforms,
            outputs: self.outputs.into_iter().collect(),
        }
    }
}

/// At least one uppercase letter and no lowercase ones (`RESULT`, `MAX_2`).
pub fn is_constant_name(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Inputs point at their function, functions point at their outputs.
pub fn dataflow_dot(records: &[DataflowRecord]) -> String {
    let mut dot = String::from("digraph dataflow {\n");
    dot.push_str("  rankdir=\"LR\";\n");
    dot.push_str("  node [fontsize=10];\n");
    dot.push_str("  edge [fontsize=9];\n");

    for record in records {
        let function = dot_escape(&record.function);
        let _ = writeln!(dot, "  \"{}\" [shape=\"ellipse\"];", function);
        for input in &record.inputs {
            let input = dot_escape(input);
            let _ = writeln!(dot, "  \"{}\" [shape=\"box\"];", input);
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", input, function);
        }
        for output in &record.outputs {
            let output = dot_escape(output);
            let _ = writeln!(dot, "  \"{}\" [shape=\"box\"];", output);
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", function, output);
        }
    }
    dot.push('}');
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_collects_inputs_transforms_outputs() {
        let mut frame = DataflowFrame::new("app.load", 3, ["path".to_string(), "cfg".to_string()]);
        frame.record_call("open", false);
        frame.record_call("get", true);
        frame.record_call("get", false);
        frame.record_assignment("RESULT");
        frame.record_assignment("local_value");
        frame.record_return();

        let record = frame.finish("/repo/app.py");
        assert_eq!(record.function, "app.load");
        assert_eq!(record.line, 3);
        assert_eq!(record.inputs, vec!["cfg", "env:*", "path"]);
        assert_eq!(record.transforms, vec!["open", "get", "get"]);
        assert_eq!(record.outputs, vec!["RESULT", "return"]);
    }

    #[test]
    fn test_bare_get_is_not_env_access() {
        let mut frame = DataflowFrame::new("app.f", 1, Vec::new());
        frame.record_call("getenv", false);
        assert!(frame.finish("/repo/app.py").inputs.is_empty());
    }

    #[test]
    fn test_constant_names() {
        assert!(is_constant_name("TIMEOUT"));
        assert!(is_constant_name("MAX_2"));
        assert!(!is_constant_name("Timeout"));
        assert!(!is_constant_name("_"));
        assert!(!is_constant_name("__1"));
    }

    #[test]
    fn test_dataflow_dot_edges() {
        let record = DataflowRecord {
            function: "app.load".into(),
            file: "/repo/app.py".into(),
            line: 1,
            inputs: vec!["path".into()],
            transforms: vec!["open".into()],
            outputs: vec!["return".into()],
        };
        let dot = dataflow_dot(&[record]);
        assert!(dot.starts_with("digraph dataflow {"));
        assert!(dot.contains("\"app.load\" [shape=\"ellipse\"];"));
        assert!(dot.contains("\"path\" -> \"app.load\";"));
        assert!(dot.contains("\"app.load\" -> \"return\";"));
        assert!(!dot.contains("open"));
        assert!(dot.ends_with('}'));
    }
}
