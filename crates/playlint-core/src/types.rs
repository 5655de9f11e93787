//! Core types for findings, source spans and lint results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rule id of the synthetic finding emitted when a rule fails internally.
pub const RULE_ERROR: &str = "rule-error";

/// Code of the synthetic rule-failure finding.
pub const RULE_ERROR_CODE: &str = "PL900";

/// Rule id of the warning emitted for an allow directive lacking a reason.
pub const MISSING_SUPPRESSION_REASON: &str = "missing-suppression-reason";

/// Code of the missing-reason warning.
pub const MISSING_SUPPRESSION_REASON_CODE: &str = "PL901";

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint by default.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses a severity name (`info`, `warning`, `error`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" | "hint" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A point in a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, counted in bytes).
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// A half-open byte range `[start, end)` with line/column information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start of the span (inclusive).
    pub start: Position,
    /// End of the span (exclusive).
    pub end: Position,
}

impl Span {
    /// Creates a span between two positions.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates a zero-length span, used for insertions.
    #[must_use]
    pub fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Returns true for zero-length spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the two spans share at least one byte.
    ///
    /// Two insertions at the same offset also overlap, since their relative
    /// order would otherwise be ambiguous.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.start.offset == other.start.offset;
        }
        self.start.offset < other.end.offset && other.start.offset < self.end.offset
    }
}

/// A proposed textual replacement produced by a rule's fix capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Rule that proposed the edit.
    pub rule: String,
    /// Range to replace.
    pub span: Span,
    /// Replacement text.
    pub replacement: String,
}

impl Edit {
    /// Creates a new edit.
    #[must_use]
    pub fn new(rule: impl Into<String>, span: Span, replacement: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            span,
            replacement: replacement.into(),
        }
    }

    /// Creates an edit that deletes the given span.
    #[must_use]
    pub fn delete(rule: impl Into<String>, span: Span) -> Self {
        Self::new(rule, span, "")
    }

    /// Creates an edit that inserts text at a position.
    #[must_use]
    pub fn insert(rule: impl Into<String>, at: Position, text: impl Into<String>) -> Self {
        Self::new(rule, Span::point(at), text)
    }
}

/// A lint finding produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule id (e.g., "duplicate-key").
    pub rule: String,
    /// Rule code (e.g., "PL001").
    pub code: String,
    /// Severity of this finding.
    pub severity: Severity,
    /// File the finding belongs to.
    pub file: PathBuf,
    /// Source range of the finding.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
    /// Whether the producing rule can fix this finding.
    pub fixable: bool,
    /// Optional hint on how to resolve the finding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Line-independent fingerprint used for baseline matching.
    #[serde(default, skip_serializing)]
    pub fingerprint: String,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        code: impl Into<String>,
        severity: Severity,
        file: impl Into<PathBuf>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            code: code.into(),
            severity,
            file: file.into(),
            span,
            message: message.into(),
            fixable: false,
            help: None,
            fingerprint: String::new(),
        }
    }

    /// Marks the finding as fixable.
    #[must_use]
    pub fn with_fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }

    /// Adds a help hint.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Start line of the finding.
    #[must_use]
    pub fn line(&self) -> usize {
        self.span.start.line
    }

    /// Start column of the finding.
    #[must_use]
    pub fn column(&self) -> usize {
        self.span.start.column
    }

    /// Returns true for synthetic rule-failure findings.
    #[must_use]
    pub fn is_rule_error(&self) -> bool {
        self.rule == RULE_ERROR
    }

    /// Deterministic ordering key: file, line, column, rule id, span end.
    ///
    /// Findings identical in file, span and rule sort next to each other.
    #[must_use]
    pub fn sort_key(&self) -> (&std::path::Path, usize, usize, &str, usize) {
        (
            self.file.as_path(),
            self.span.start.line,
            self.span.start.column,
            self.rule.as_str(),
            self.span.end.offset,
        )
    }

    /// Formats the finding for multi-line terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.file.display(),
            self.line(),
            self.column(),
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(help) = &self.help {
            let _ = writeln!(output, "  = help: {help}");
        }
        if self.fixable {
            let _ = writeln!(output, "  = fix: available with --fix");
        }
        output
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: [{}] {}",
            self.file.display(),
            self.line(),
            self.column(),
            self.rule,
            self.message
        )
    }
}

/// Kind of a file-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileErrorKind {
    /// The file could not be parsed.
    ParseError,
    /// Analysis exceeded the per-file time limit.
    Timeout,
    /// The file could not be read or written.
    IoError,
}

impl std::fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseError => write!(f, "parse-error"),
            Self::Timeout => write!(f, "timeout"),
            Self::IoError => write!(f, "io-error"),
        }
    }
}

/// A file-level failure that excluded a file from matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// Path of the failing file.
    pub file: PathBuf,
    /// Failure kind.
    pub kind: FileErrorKind,
    /// Best-known line (1-indexed).
    pub line: usize,
    /// Best-known column (1-indexed).
    pub column: usize,
    /// Failure description.
    pub message: String,
    /// Source text, kept for rich parse-error rendering.
    #[serde(skip)]
    pub source_text: Option<String>,
    /// Byte offset of the failure, for rich rendering.
    #[serde(skip)]
    pub offset: usize,
}

impl FileError {
    /// Creates a file error without source context.
    #[must_use]
    pub fn new(
        file: impl Into<PathBuf>,
        kind: FileErrorKind,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            kind,
            line,
            column,
            message: message.into(),
            source_text: None,
            offset: 0,
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: [{}] {}",
            self.file.display(),
            self.line,
            self.column,
            self.kind,
            self.message
        )
    }
}

/// Per-file summary of applied fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSummary {
    /// Fixed file.
    pub file: PathBuf,
    /// Number of edits applied across all passes.
    pub applied: usize,
    /// Number of fix passes run.
    pub passes: usize,
    /// Whether fixing converged before the pass limit.
    pub converged: bool,
}

/// Result of running lint analysis.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LintResult {
    /// All findings, sorted and deduplicated.
    pub findings: Vec<Finding>,
    /// File-level failures.
    pub file_errors: Vec<FileError>,
    /// Number of files analyzed.
    pub files_checked: usize,
    /// Number of findings removed by inline suppressions.
    pub suppressed: usize,
    /// Number of findings absorbed by the baseline.
    pub baselined: usize,
    /// Files skipped because the run was cancelled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cancelled: Vec<PathBuf>,
    /// Fix summaries, one per file that received edits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixSummary>,
    /// Selected fixable findings still outstanding after fixing.
    #[serde(default)]
    pub pending_fixes: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// Returns true if any finding meets or exceeds the given threshold.
    #[must_use]
    pub fn has_findings_at(&self, severity: Severity) -> bool {
        self.findings
            .iter()
            .filter(|f| !f.is_rule_error())
            .any(|f| f.severity >= severity)
    }

    /// Returns true if any file or rule failed during analysis.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.file_errors.is_empty() || self.findings.iter().any(Finding::is_rule_error)
    }

    /// Returns findings filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect()
    }

    /// Counts findings by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let errors = self.by_severity(Severity::Error).len();
        let warnings = self.by_severity(Severity::Warning).len();
        let infos = self.by_severity(Severity::Info).len();
        (errors, warnings, infos)
    }

    /// Sorts findings into their deterministic order.
    pub fn sort(&mut self) {
        self.findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.file_errors
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
    }

    /// Removes findings identical in file, span and rule id.
    ///
    /// Returns the number of removed duplicates. Findings must be sorted.
    pub fn dedup(&mut self) -> usize {
        let before = self.findings.len();
        self.findings
            .dedup_by(|a, b| a.file == b.file && a.span == b.span && a.rule == b.rule);
        before - self.findings.len()
    }

    /// Adds findings and errors from another result.
    pub fn extend(&mut self, other: Self) {
        self.findings.extend(other.findings);
        self.file_errors.extend(other.file_errors);
        self.files_checked += other.files_checked;
        self.suppressed += other.suppressed;
        self.baselined += other.baselined;
        self.cancelled.extend(other.cancelled);
        self.fixes.extend(other.fixes);
        self.pending_fixes += other.pending_fixes;
    }
}
