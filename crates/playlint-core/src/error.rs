//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Run-fatal configuration errors, raised before any file is analyzed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// IO error reading a config file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Syntax or type error in a config file.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A severity name that is not `info`, `warning` or `error`.
    #[error("unknown severity `{value}` (expected info, warning or error)")]
    InvalidSeverity {
        /// The rejected value.
        value: String,
    },

    /// An include or exclude pattern that is not a valid glob.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidGlob {
        /// The rejected pattern.
        pattern: String,
        /// Reason reported by the glob parser.
        message: String,
    },

    /// Two rules registered under the same id or code.
    #[error("rule `{id}` is already registered")]
    DuplicateRule {
        /// Conflicting id or code.
        id: String,
    },

    /// Configuration names a rule, code or tag nobody registered.
    #[error("unknown rule `{id}`")]
    UnknownRule {
        /// The unresolved reference.
        id: String,
    },

    /// Configuration names a preset nobody registered.
    #[error("unknown preset `{name}`")]
    UnknownPreset {
        /// The unresolved preset name.
        name: String,
    },

    /// A rule depends on a rule id that is not registered.
    #[error("rule `{rule}` depends on unknown rule `{dependency}`")]
    UnknownDependency {
        /// Declaring rule.
        rule: String,
        /// Missing dependency.
        dependency: String,
    },

    /// Declared rule dependencies form a cycle.
    #[error("rule dependency cycle: {cycle}")]
    DependencyCycle {
        /// The cycle, rendered as `a -> b -> a`.
        cycle: String,
    },

    /// The baseline file exists but cannot be read or parsed.
    #[error("{0}")]
    Baseline(#[from] crate::baseline::BaselineError),

    /// A rule reported a failure that invalidates the whole run.
    #[error("rule `{rule}` failed fatally: {message}")]
    FatalRule {
        /// Failing rule.
        rule: String,
        /// Failure description.
        message: String,
    },
}

/// Failure inside a rule capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule could not evaluate this document. Contained to the rule.
    #[error("{0}")]
    Failed(String),

    /// The rule detected a condition that must stop the run.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl RuleError {
    /// Creates a recoverable failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
