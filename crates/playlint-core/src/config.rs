//! Configuration types for playlint.

use crate::error::ConfigurationError;
use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration for playlint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Preset to use (e.g., "recommended", "strict", "minimal").
    #[serde(default)]
    pub preset: Option<String>,

    /// Severity threshold for a failing exit status (default: "error").
    #[serde(default)]
    pub fail_on: Option<String>,

    /// If non-empty, only rules matching these ids, codes or tags run.
    #[serde(default)]
    pub select: Vec<String>,

    /// Rules (ids, codes or tags) added to the base set.
    #[serde(default)]
    pub enable: Vec<String>,

    /// Rules (ids, codes or tags) removed from the base set.
    #[serde(default)]
    pub disable: Vec<String>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule configurations.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| ConfigurationError::Parse {
            message: e.to_string(),
        })
    }

    /// Returns the failure threshold, defaulting to [`Severity::Error`].
    ///
    /// # Errors
    ///
    /// Returns an error if `fail_on` is not a known severity.
    pub fn fail_on(&self) -> Result<Severity, ConfigurationError> {
        match &self.fail_on {
            None => Ok(Severity::Error),
            Some(value) => {
                Severity::parse(value).ok_or_else(|| ConfigurationError::InvalidSeverity {
                    value: value.clone(),
                })
            }
        }
    }

    /// Explicit `enabled` setting for a rule, if configured.
    #[must_use]
    pub fn rule_enabled(&self, rule_id: &str) -> Option<bool> {
        self.rules.get(rule_id).and_then(|c| c.enabled)
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Glob patterns a discovered file must match.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of parallel file analyses (default: available cores).
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Per-file wall-clock limit in milliseconds. `0` disables the limit.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of fix passes per file.
    #[serde(default = "default_max_fix_passes")]
    pub max_fix_passes: usize,

    /// Baseline file of accepted findings.
    #[serde(default)]
    pub baseline: Option<PathBuf>,

    /// Whether `allow` directives on strict rules must carry a reason.
    #[serde(default)]
    pub require_suppression_reason: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            respect_gitignore: true,
            parallelism: None,
            timeout_ms: default_timeout_ms(),
            max_fix_passes: default_max_fix_passes(),
            baseline: None,
            require_suppression_reason: false,
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["**/*.yml".to_string(), "**/*.yaml".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/.git/**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_fix_passes() -> usize {
    10
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets an option value as a specific type.
    #[must_use]
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| v.clone().try_into().ok())
    }

    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets an integer option with a default value.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.options
            .get(key)
            .and_then(toml::Value::as_integer)
            .unwrap_or(default)
    }

    /// Gets a string option with a default value.
    #[must_use]
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }

    /// Gets a string array option, or `None` when unset.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Option<Vec<String>> {
        self.options.get(key).and_then(|v| v.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
    }
}
