//! Rendering of lint results and exit status.

use crate::types::{FileError, FileErrorKind, LintResult, Severity};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

/// Exit status: nothing at or above the threshold.
pub const EXIT_OK: u8 = 0;
/// Exit status: findings at or above the threshold.
pub const EXIT_FINDINGS: u8 = 1;
/// Exit status: invalid configuration, nothing analyzed.
pub const EXIT_CONFIG: u8 = 2;
/// Exit status: file-level failures or rule failures.
pub const EXIT_FAILURE: u8 = 3;

/// Errors raised while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON serialization failed.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing into the output buffer failed.
    #[error("failed to format report")]
    Fmt(#[from] std::fmt::Error),
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human-readable report.
    #[default]
    Text,
    /// One line per finding.
    Compact,
    /// Machine-readable JSON.
    Json,
}

/// Renders lint results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    format: Format,
    color: bool,
}

impl Reporter {
    /// Creates a reporter without colors.
    #[must_use]
    pub fn new(format: Format) -> Self {
        Self {
            format,
            color: false,
        }
    }

    /// Enables ANSI colors in the text format.
    #[must_use]
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Renders a result.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or formatting fails.
    pub fn render(&self, result: &LintResult) -> Result<String, ReportError> {
        match self.format {
            Format::Text => self.render_text(result),
            Format::Compact => render_compact(result),
            Format::Json => Ok(serde_json::to_string_pretty(result)? + "\n"),
        }
    }

    fn render_text(&self, result: &LintResult) -> Result<String, ReportError> {
        let mut out = String::new();
        for finding in &result.findings {
            if self.color {
                let severity = paint(finding.severity);
                writeln!(
                    out,
                    "{} {} at {}:{}:{}",
                    finding.code,
                    finding.rule,
                    finding.file.display(),
                    finding.line(),
                    finding.column()
                )?;
                writeln!(out, "  {severity}: {}", finding.message)?;
                if let Some(help) = &finding.help {
                    writeln!(out, "  = help: {help}")?;
                }
                if finding.fixable {
                    writeln!(out, "  = fix: available with --fix")?;
                }
            } else {
                out.push_str(&finding.format());
            }
            out.push('\n');
        }

        for error in &result.file_errors {
            out.push_str(&self.render_file_error(error)?);
            out.push('\n');
        }

        let (errors, warnings, infos) = result.count_by_severity();
        let mut summary = format!(
            "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
            result.files_checked
        );
        if result.suppressed > 0 {
            write!(summary, ", {} suppressed", result.suppressed)?;
        }
        if result.baselined > 0 {
            write!(summary, ", {} baselined", result.baselined)?;
        }
        if !result.file_errors.is_empty() {
            write!(summary, ", {} file error(s)", result.file_errors.len())?;
        }
        let fixed: usize = result.fixes.iter().map(|f| f.applied).sum();
        if fixed > 0 {
            write!(summary, ", {fixed} fix(es) applied")?;
        }
        if result.pending_fixes > 0 {
            write!(summary, ", {} fix(es) pending", result.pending_fixes)?;
        }

        if self.color {
            let color = if errors > 0 || result.has_failures() {
                "\x1b[31m"
            } else if warnings > 0 {
                "\x1b[33m"
            } else {
                "\x1b[32m"
            };
            writeln!(out, "{color}{summary}\x1b[0m")?;
        } else {
            writeln!(out, "{summary}")?;
        }
        Ok(out)
    }

    fn render_file_error(&self, error: &FileError) -> Result<String, ReportError> {
        let mut out = String::new();
        match &error.source_text {
            Some(text) if error.kind == FileErrorKind::ParseError => {
                let diagnostic = FileDiagnostic::new(error, text);
                let theme = if self.color {
                    GraphicalTheme::unicode()
                } else {
                    GraphicalTheme::unicode_nocolor()
                };
                GraphicalReportHandler::new_themed(theme).render_report(&mut out, &diagnostic)?;
            }
            _ => writeln!(out, "{error}")?,
        }
        Ok(out)
    }
}

/// Renders a result without colors.
///
/// # Errors
///
/// Returns an error if serialization or formatting fails.
pub fn render(result: &LintResult, format: Format) -> Result<String, ReportError> {
    Reporter::new(format).render(result)
}

/// Computes the process exit status of a run.
///
/// File-level and rule failures take precedence over findings.
#[must_use]
pub fn exit_code(result: &LintResult, fail_on: Severity) -> u8 {
    if result.has_failures() {
        EXIT_FAILURE
    } else if result.has_findings_at(fail_on) {
        EXIT_FINDINGS
    } else {
        EXIT_OK
    }
}

fn render_compact(result: &LintResult) -> Result<String, ReportError> {
    let mut lines: Vec<(&Path, usize, usize, String)> = result
        .findings
        .iter()
        .map(|f| (f.file.as_path(), f.line(), f.column(), f.to_string()))
        .chain(
            result
                .file_errors
                .iter()
                .map(|e| (e.file.as_path(), e.line, e.column, e.to_string())),
        )
        .collect();
    lines.sort();
    let mut out = String::new();
    for (_, _, _, line) in lines {
        writeln!(out, "{line}")?;
    }
    Ok(out)
}

fn paint(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

/// A file error with its source, for rich terminal display.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(playlint::parse_error))]
pub struct FileDiagnostic {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
}

impl FileDiagnostic {
    /// Builds a diagnostic for a file error over its source text.
    #[must_use]
    pub fn new(error: &FileError, text: &str) -> Self {
        let offset = error.offset.min(text.len());
        Self {
            message: format!("{}: {}", error.kind, error.message),
            src: NamedSource::new(error.file.display().to_string(), text.to_string()),
            span: SourceSpan::from((offset, 0)),
        }
    }
}
