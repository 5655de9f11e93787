//! Check command implementation.

use anyhow::{Context, Result};
use clap::Args;
use playlint_core::{
    exit_code, Analyzer, Baseline, Config, ConfigurationError, FixSelection, LintResult,
};
use playlint_rules::builtin_registry;
use std::path::{Path, PathBuf};

use crate::config_resolver::{self, ConfigSource};
use crate::OutputFormat;

/// Arguments of `playlint check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Files or directories to lint (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only run these rules (comma-separated ids, codes or tags)
    #[arg(long, value_delimiter = ',')]
    pub rules: Vec<String>,

    /// Skip these rules (comma-separated ids, codes or tags)
    #[arg(long, value_delimiter = ',')]
    pub exclude_rules: Vec<String>,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Apply fixes in place, optionally only for the listed rules
    #[arg(long, value_name = "RULES", num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub fix: Option<String>,

    /// Baseline file of accepted findings
    #[arg(long, value_name = "FILE", conflicts_with = "write_baseline")]
    pub baseline: Option<PathBuf>,

    /// Record all current findings into a baseline file
    #[arg(long, value_name = "FILE")]
    pub write_baseline: Option<PathBuf>,

    /// Lowest severity that fails the run (info, warning, error)
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<String>,
}

/// Runs the check command and returns the exit status.
pub fn run(args: &CheckArgs, config_path: Option<&Path>) -> Result<u8> {
    let source = config_resolver::resolve(Path::new("."), config_path);
    let mut config = load_config(&source)?;
    apply_overrides(&mut config, args);

    let registry = builtin_registry().context("Failed to register built-in rules")?;
    let mut builder = Analyzer::builder()
        .registry(&registry)
        .config(config)
        .excludes(args.exclude.iter().cloned())
        .ignore_baseline(args.write_baseline.is_some());

    if let Some(list) = &args.fix {
        builder = builder.fix(FixSelection::parse(list));
    }
    if let Some(path) = &args.baseline {
        let baseline = Baseline::load(path).map_err(ConfigurationError::from)?;
        builder = builder.baseline(baseline);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;
    tracing::info!(
        "Analyzing {} path(s) with {} rules",
        args.paths.len(),
        analyzer.rules().len()
    );

    let mut result = analyzer.analyze(&args.paths).context("Analysis failed")?;

    if let Some(path) = &args.write_baseline {
        write_baseline(&mut result, path)?;
    }

    super::output::print(&result, args.format)?;
    Ok(exit_code(&result, analyzer.fail_on()))
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        return Ok(Config::default());
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Folds command-line selections into the loaded configuration.
fn apply_overrides(config: &mut Config, args: &CheckArgs) {
    if !args.rules.is_empty() {
        config.select.clone_from(&args.rules);
    }
    config.disable.extend(args.exclude_rules.iter().cloned());
    if let Some(fail_on) = &args.fail_on {
        config.fail_on = Some(fail_on.clone());
    }
}

/// Saves every current finding as accepted and marks them baselined.
fn write_baseline(result: &mut LintResult, path: &Path) -> Result<()> {
    let baseline = Baseline::from_findings(&result.findings);
    baseline
        .save(path)
        .with_context(|| format!("Failed to write baseline: {}", path.display()))?;
    eprintln!(
        "Wrote {} baseline entries to {}",
        baseline.len(),
        path.display()
    );

    let (kept, absorbed) = baseline.filter(std::mem::take(&mut result.findings));
    result.findings = kept;
    result.baselined = absorbed;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CheckArgs,
    }

    fn parse(argv: &[&str]) -> CheckArgs {
        let mut full = vec!["check"];
        full.extend_from_slice(argv);
        Wrapper::parse_from(full).args
    }

    #[test]
    fn test_fix_flag_forms() {
        assert_eq!(parse(&[]).fix, None);
        assert_eq!(parse(&["--fix"]).fix.as_deref(), Some(""));
        assert_eq!(parse(&["--fix=truthy,PL002"]).fix.as_deref(), Some("truthy,PL002"));

        let args = parse(&["--fix", "site.yml"]);
        assert_eq!(args.fix.as_deref(), Some(""));
        assert_eq!(args.paths, [PathBuf::from("site.yml")]);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--rules",
            "truthy,formatting",
            "--exclude-rules",
            "PL002",
            "--fail-on",
            "warning",
        ]);
        let mut config = Config::parse("disable = [\"line-length\"]\n").unwrap();
        apply_overrides(&mut config, &args);
        assert_eq!(config.select, ["truthy", "formatting"]);
        assert_eq!(config.disable, ["line-length", "PL002"]);
        assert_eq!(config.fail_on.as_deref(), Some("warning"));
    }

    #[test]
    fn test_default_paths() {
        assert_eq!(parse(&[]).paths, [PathBuf::from(".")]);
    }
}
