//! Ecosystem pattern tags
//!
//! Cheap, import-driven hints about what a file does: CLI entry points, shell
//! automation, infrastructure-as-code, pipeline orchestrators, model schemas.

use crate::adapter::FileExtraction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Pattern tags detected in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternHit {
    pub file: String,
    pub patterns: Vec<String>,
}

const SHELL_CALLS: &[&str] = &["system", "run", "Popen"];

/// (tag, module prefixes that trigger it)
const IMPORT_RULES: &[(&str, &[&str])] = &[
    ("devops:cli", &["argparse", "click", "typer", "fire"]),
    ("iac:cdk", &["aws_cdk", "constructs"]),
    ("pipeline:airflow", &["airflow"]),
    ("pipeline:prefect", &["prefect"]),
    ("pipeline:dagster", &["dagster"]),
    ("pipeline:luigi", &["luigi"]),
    ("models:pydantic", &["pydantic"]),
    ("models:dataclass", &["dataclasses"]),
];

fn has_import(imports: &[String], prefix: &str) -> bool {
    imports
        .iter()
        .any(|i| i == prefix || i.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('.')))
}

/// Sorted, de-duplicated pattern tags for a file.
pub fn detect(extraction: &FileExtraction) -> Vec<String> {
    let imports = extraction.imported_modules();
    let mut tags = BTreeSet::new();

    for (tag, prefixes) in IMPORT_RULES {
        if prefixes.iter().any(|p| has_import(&imports, p)) {
            tags.insert(tag.to_string());
        }
    }

    if has_import(&imports, "pulumi") || imports.iter().any(|i| i.starts_with("pulumi_")) {
        tags.insert("iac:pulumi".to_string());
    }

    let shell_imports = ["subprocess", "shlex", "os"].iter().any(|p| has_import(&imports, p));
    let shell_calls = extraction
        .call_names
        .iter()
        .any(|name| SHELL_CALLS.contains(&name.as_str()));
    if shell_imports && shell_calls {
        tags.insert("devops:shell".to_string());
    }

    tags.into_iter().collect()
}
