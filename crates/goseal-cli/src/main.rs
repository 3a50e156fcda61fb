//! goseal CLI tool.
//!
//! Usage:
//! ```bash
//! goseal check [OPTIONS] [PATH]
//! goseal list-rules
//! goseal init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Keeps struct construction and mutation inside the code that owns the struct
#[derive(Parser)]
#[command(name = "goseal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run seal checks
    Check {
        /// Crate directory or single file to analyze (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analyze pre-lowered units from a JSON file instead of parsing sources
        #[arg(long, value_name = "FILE")]
        units: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Analyze units in parallel
        #[arg(long)]
        parallel: bool,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
    /// Annotated source snippets.
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            units,
            format,
            parallel,
            exclude,
        } => {
            let source = config_resolver::resolve(project_dir(&path), cli.config.as_deref());
            let options = commands::check::CheckOptions {
                path,
                units,
                format,
                parallel,
                exclude,
            };
            commands::check::run(&options, &source)
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(Path::new("."), force),
    }
}

/// Directory searched for a project config: the path itself, or the
/// parent when a single file is checked.
fn project_dir(path: &Path) -> &Path {
    if path.is_file() {
        path.parent().unwrap_or(Path::new("."))
    } else {
        path
    }
}
