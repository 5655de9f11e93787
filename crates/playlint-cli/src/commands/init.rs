//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# playlint configuration
# Run `playlint list-rules` to see every rule, preset and tag.

# Rule preset: recommended, strict or minimal
preset = "recommended"

# Lowest severity that fails the run: info, warning or error
fail_on = "error"

# Rules (ids, codes or tags) added to or removed from the preset
enable = []
disable = []

[analyzer]
# Files to lint inside directories
include = ["**/*.yml", "**/*.yaml"]

# Glob patterns to exclude from analysis
exclude = [
    "**/.git/**",
    "**/collections/**",
]

# Respect .gitignore files
respect_gitignore = true

# Per-file time limit in milliseconds (0 disables it)
timeout_ms = 10000

# Accepted findings, written with `playlint check --write-baseline FILE`
# baseline = ".playlint-baseline.json"

# Require a reason="..." on allow directives
require_suppression_reason = false

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.line-length]
max = 160
allow_non_breakable_words = true

[rules.truthy]
allowed = ["true", "false"]

# [rules.risky-octal]
# severity = "warning"  # Override default severity
# keys = ["mode", "directory_mode"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("playlint.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created playlint.toml");
    println!("\nNext steps:");
    println!("  1. Edit playlint.toml to configure rules");
    println!("  2. Run: playlint check");

    Ok(())
}
