//! Depscope CLI - module dependency and call graphs for Python trees

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "depscope")]
#[command(version)]
#[command(about = "Static module-dependency and call-graph reconstruction for Python source trees")]
#[command(long_about = r#"
Depscope reads a Python repository without executing it and reconstructs:
  • a module dependency graph (local vs external imports)
  • a call graph with callees resolved through imports and aliases

Example usage:
  depscope analyze . --out analysis
  depscope calls . --unresolved
  depscope callers . --function pkg.parser.parse --depth 3
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./depscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputMode::Human)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs an analysis.
#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Repository root to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Extra directory names to skip (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Worker threads for parsing (defaults to available cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a tree and write JSON + DOT artifacts
    Analyze {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output directory for artifacts
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List modules with their import degrees
    Modules {
        #[command(flatten)]
        scan: ScanArgs,

        /// Also list every import edge
        #[arg(long)]
        edges: bool,
    },

    /// List calls with their resolution
    Calls {
        #[command(flatten)]
        scan: ScanArgs,

        /// Only show calls that could not be resolved
        #[arg(long)]
        unresolved: bool,
    },

    /// Find functions that call a function, transitively up to --depth
    Callers {
        #[command(flatten)]
        scan: ScanArgs,

        /// Fully-qualified function name
        #[arg(long)]
        function: String,

        /// Maximum depth for transitive callers
        #[arg(long, default_value = "1")]
        depth: usize,
    },

    /// Find functions called by a function, transitively up to --depth
    Callees {
        #[command(flatten)]
        scan: ScanArgs,

        /// Fully-qualified function name
        #[arg(long)]
        function: String,

        /// Maximum depth for transitive callees
        #[arg(long, default_value = "1")]
        depth: usize,
    },

    /// Show statistics about a tree
    Stats {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Write a default depscope.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        *self == OutputMode::Human
    }
}

/// Print a JSON success envelope for machine consumers.
pub fn emit_success(mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    debug_assert!(!mode.is_human());
    let envelope = serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; logs go to stderr so JSON output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = depscope::config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let mode = cli.format;

    match cli.command {
        Commands::Analyze { scan, out } => commands::run_analyze(mode, &config, &scan, out.as_deref()),
        Commands::Modules { scan, edges } => commands::run_modules(mode, &config, &scan, edges),
        Commands::Calls { scan, unresolved } => commands::run_calls(mode, &config, &scan, unresolved),
        Commands::Callers { scan, function, depth } => {
            commands::run_callers(mode, &config, &scan, &function, depth)
        }
        Commands::Callees { scan, function, depth } => {
            commands::run_callees(mode, &config, &scan, &function, depth)
        }
        Commands::Stats { scan } => commands::run_stats(mode, &config, &scan),
        Commands::Init { force } => commands::run_init(mode, cli.config.as_deref(), force),
    }
}
