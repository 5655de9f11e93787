//! Baseline of accepted findings, for incremental adoption.
//!
//! Entries are matched by `(file, rule, fingerprint)`. The fingerprint hashes
//! the rule id with the trimmed text of the finding's first line, so entries
//! survive findings moving to other lines.

use crate::types::Finding;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default baseline file name.
pub const BASELINE_FILENAME: &str = ".playlint-baseline.json";

/// Current baseline format version.
pub const BASELINE_VERSION: u32 = 1;

/// Computes the line-independent fingerprint of a finding.
#[must_use]
pub fn fingerprint(rule: &str, line_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule.as_bytes());
    hasher.update([0u8]);
    hasher.update(line_text.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Errors reading or writing a baseline file.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The file could not be read or written.
    #[error("failed to access baseline {path}: {source}")]
    Io {
        /// Baseline path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not a valid baseline.
    #[error("invalid baseline {path}: {message}")]
    Parse {
        /// Baseline path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// One accepted finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// File of the finding, as reported.
    pub file: PathBuf,
    /// Rule id.
    pub rule: String,
    /// Fingerprint of the finding.
    pub fingerprint: String,
}

/// A serialized set of accepted findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Format version.
    pub version: u32,
    /// Accepted findings. Duplicates are meaningful: each absorbs one finding.
    pub entries: Vec<BaselineEntry>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            version: BASELINE_VERSION,
            entries: Vec::new(),
        }
    }
}

impl Baseline {
    /// Builds a baseline accepting every given finding except rule failures.
    #[must_use]
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut entries: Vec<BaselineEntry> = findings
            .iter()
            .filter(|f| !f.is_rule_error())
            .map(|f| BaselineEntry {
                file: f.file.clone(),
                rule: f.rule.clone(),
                fingerprint: f.fingerprint.clone(),
            })
            .collect();
        entries.sort();
        Self {
            version: BASELINE_VERSION,
            entries,
        }
    }

    /// Loads a baseline from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a baseline.
    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let content = std::fs::read_to_string(path).map_err(|e| BaselineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| BaselineError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes the baseline as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| BaselineError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json + "\n").map_err(|e| BaselineError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the baseline accepts nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes accepted findings. Each entry absorbs at most one finding.
    ///
    /// Returns the remaining findings and the number absorbed.
    #[must_use]
    pub fn filter(&self, findings: Vec<Finding>) -> (Vec<Finding>, usize) {
        let mut budget: HashMap<(PathBuf, String, String), usize> = HashMap::new();
        for entry in &self.entries {
            *budget
                .entry((
                    entry.file.clone(),
                    entry.rule.clone(),
                    entry.fingerprint.clone(),
                ))
                .or_default() += 1;
        }
        let mut absorbed = 0;
        let mut kept = Vec::with_capacity(findings.len());
        for finding in findings {
            if !finding.is_rule_error() {
                let key = (
                    finding.file.clone(),
                    finding.rule.clone(),
                    finding.fingerprint.clone(),
                );
                if let Some(left) = budget.get_mut(&key).filter(|left| **left > 0) {
                    *left -= 1;
                    absorbed += 1;
                    continue;
                }
            }
            kept.push(finding);
        }
        (kept, absorbed)
    }
}
