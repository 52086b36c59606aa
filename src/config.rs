//! `depscope.toml` configuration
//!
//! Every field is optional. Command-line flags override the file, the file
//! overrides built-in defaults.

use crate::scanner::{DEFAULT_EXCLUDES, Scanner};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "depscope.toml";
pub const DEFAULT_OUT_DIR: &str = "analysis";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepscopeConfig {
    /// Replaces the default directory exclusions when set
    pub excludes: Option<Vec<String>>,
    /// Added on top of the active exclusions
    pub extra_excludes: Vec<String>,
    pub out: Option<String>,
    pub threads: Option<usize>,
    pub respect_gitignore: bool,
}

impl DepscopeConfig {
    /// Config written by `depscope init`: the defaults spelled out.
    pub fn template() -> Self {
        Self {
            excludes: Some(DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()),
            out: Some(DEFAULT_OUT_DIR.to_string()),
            ..Self::default()
        }
    }

    /// Scanner for `extensions` with this config's exclusions plus `cli_excludes`.
    pub fn scanner(&self, extensions: &[&str], cli_excludes: &[String]) -> Scanner {
        let mut scanner = Scanner::new(extensions).respect_gitignore(self.respect_gitignore);
        if let Some(excludes) = &self.excludes {
            scanner = scanner.with_excludes(excludes.iter().cloned());
        }
        scanner
            .with_extra_excludes(self.extra_excludes.iter().cloned())
            .with_extra_excludes(cli_excludes.iter().cloned())
    }

    pub fn out_dir(&self, cli_out: Option<&Path>) -> PathBuf {
        cli_out
            .map(Path::to_path_buf)
            .or_else(|| self.out.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
    }

    /// Zero means "use available parallelism".
    pub fn threads(&self, cli_threads: Option<usize>) -> usize {
        cli_threads.or(self.threads).unwrap_or(0)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE)
}

/// Load the config at `path`, or `./depscope.toml`. A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<Option<DepscopeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: DepscopeConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &DepscopeConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_config(Some(&dir.path().join(CONFIG_FILE))).unwrap(), None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "extra_excludes = [\"fixtures\"]\nthreads = 4\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.excludes, None);
        assert_eq!(config.extra_excludes, vec!["fixtures".to_string()]);
        assert_eq!(config.threads(None), 4);
        assert_eq!(config.threads(Some(2)), 2);
        assert!(!config.respect_gitignore);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "threads = \"many\"\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let template = DepscopeConfig::template();

        write_config(&path, &template, false).unwrap();
        assert!(write_config(&path, &template, false).is_err());
        write_config(&path, &template, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, template);
    }

    #[test]
    fn test_out_dir_precedence() {
        let config = DepscopeConfig {
            out: Some("from-config".into()),
            ..DepscopeConfig::default()
        };
        assert_eq!(config.out_dir(Some(Path::new("cli"))), PathBuf::from("cli"));
        assert_eq!(config.out_dir(None), PathBuf::from("from-config"));
        assert_eq!(DepscopeConfig::default().out_dir(None), PathBuf::from(DEFAULT_OUT_DIR));
    }

    #[test]
    fn test_scanner_excludes() {
        let config = DepscopeConfig {
            excludes: Some(vec!["only".into()]),
            extra_excludes: vec!["more".into()],
            ..DepscopeConfig::default()
        };
        let scanner = config.scanner(&["py"], &["cli".to_string()]);
        let excludes = scanner.excludes();
        assert!(excludes.contains("only"));
        assert!(excludes.contains("more"));
        assert!(excludes.contains("cli"));
        assert!(!excludes.contains(".git"));
    }
}
