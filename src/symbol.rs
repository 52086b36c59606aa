//! Function and call records
//!
//! Phase one emits `FunctionRecord`s and `CallRecord`s per file. Phase two
//! turns every `CallRecord` into exactly one `ResolvedCall`, resolved or not.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Receiver text used when an attribute chain starts on something other than a name.
pub const EXPR_RECEIVER: &str = "<expr>";
/// Callee text used when the call target is not a name or attribute chain.
pub const UNKNOWN_CALLEE: &str = "<unknown>";

/// A function definition: `<module>.<function>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub qualname: String,
    pub file: String,
    #[serde(rename = "lineno")]
    pub line: u32,
}

impl FunctionRecord {
    pub fn new(qualname: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            qualname: qualname.into(),
            file: file.into(),
            line,
        }
    }
}

/// A call expression found inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Qualified name of the innermost enclosing function
    pub caller: String,
    /// Callee text as reconstructed from the call target
    pub callee: String,
    pub file: String,
    #[serde(rename = "lineno")]
    pub line: u32,
}

impl CallRecord {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
            file: file.into(),
            line,
        }
    }

    pub fn target(&self) -> CallTarget<'_> {
        CallTarget::classify(&self.callee)
    }
}

/// Shape of a call target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget<'a> {
    /// `foo()`
    BareName(&'a str),
    /// `receiver.rest()`, where `rest` may itself be dotted
    DottedChain { receiver: &'a str, tail: &'a str },
    /// Anything the extractor could not spell as a name chain
    Unrecognized(&'a str),
}

impl<'a> CallTarget<'a> {
    /// Classify raw callee text produced by the extractor.
    pub fn classify(raw: &'a str) -> Self {
        if raw.is_empty() || raw.starts_with('<') {
            return CallTarget::Unrecognized(raw);
        }
        match raw.split_once('.') {
            None => CallTarget::BareName(raw),
            Some((receiver, tail)) if !receiver.is_empty() && !tail.is_empty() => {
                CallTarget::DottedChain { receiver, tail }
            }
            Some(_) => CallTarget::Unrecognized(raw),
        }
    }
}

impl fmt::Display for CallTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::BareName(name) => f.write_str(name),
            CallTarget::DottedChain { receiver, tail } => write!(f, "{}.{}", receiver, tail),
            CallTarget::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// A call after global resolution. Computed once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCall {
    pub caller: String,
    #[serde(rename = "callee_raw")]
    pub callee: String,
    #[serde(rename = "callee_resolved")]
    pub resolved: Option<String>,
    pub file: String,
    #[serde(rename = "lineno")]
    pub line: u32,
}

impl ResolvedCall {
    pub fn from_call(call: &CallRecord, resolved: Option<String>) -> Self {
        Self {
            caller: call.caller.clone(),
            callee: call.callee.clone(),
            resolved,
            file: call.file.clone(),
            line: call.line,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Resolved target when known, raw text otherwise.
    pub fn best_callee(&self) -> &str {
        self.resolved.as_deref().unwrap_or(&self.callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bare_name() {
        assert_eq!(CallTarget::classify("foo"), CallTarget::BareName("foo"));
    }

    #[test]
    fn test_classify_dotted_chain_splits_on_first_dot() {
        assert_eq!(
            CallTarget::classify("pkg.mod.fn"),
            CallTarget::DottedChain { receiver: "pkg", tail: "mod.fn" }
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(CallTarget::classify("<unknown>"), CallTarget::Unrecognized("<unknown>"));
        assert_eq!(CallTarget::classify("<expr>.run"), CallTarget::Unrecognized("<expr>.run"));
        assert_eq!(CallTarget::classify(""), CallTarget::Unrecognized(""));
    }

    #[test]
    fn test_display_matches_raw() {
        for raw in ["foo", "a.b.c", "<expr>.x"] {
            assert_eq!(CallTarget::classify(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_resolved_call_serializes_absent_target_as_null() {
        let call = CallRecord::new("pkg.b.g", "h", "/repo/pkg/b.py", 3);
        let resolved = ResolvedCall::from_call(&call, None);
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["callee_raw"], "h");
        assert!(json["callee_resolved"].is_null());
        assert_eq!(resolved.best_callee(), "h");
    }
}
