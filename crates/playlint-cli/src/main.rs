//! playlint CLI tool.
//!
//! Usage:
//! ```bash
//! playlint check [OPTIONS] [PATHS]...
//! playlint list-rules
//! playlint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use playlint_core::report::{EXIT_CONFIG, EXIT_FAILURE};
use playlint_core::{AnalyzerError, ConfigurationError, Format};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Linter and fixer for Ansible-style YAML configuration files
#[derive(Parser)]
#[command(name = "playlint")]
#[command(author, version = playlint_core::VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PLAYLINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint files and directories
    Check(commands::check::CheckArgs),

    /// List available rules and presets
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-finding compact format.
    Compact,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
            OutputFormat::Compact => Self::Compact,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(failure_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Check(args) => commands::check::run(&args, cli.config.as_deref()),
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(0)
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            Ok(0)
        }
    }
}

/// Configuration problems exit with 2, anything else with 3.
fn failure_code(error: &anyhow::Error) -> u8 {
    let is_config = error.chain().any(|cause| {
        cause.is::<ConfigurationError>()
            || matches!(
                cause.downcast_ref::<AnalyzerError>(),
                Some(AnalyzerError::Config(_))
            )
    });
    if is_config {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}
