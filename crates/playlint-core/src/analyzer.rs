//! Core analyzer for orchestrating lint execution.
//!
//! The analyzer discovers files, then reads, parses, evaluates and optionally
//! fixes each one as an independent task on a `rayon` pool. Results are
//! merged once every task has finished.

use crate::baseline::{Baseline, BaselineError};
use crate::config::Config;
use crate::engine::{Engine, EngineError};
use crate::error::ConfigurationError;
use crate::fix::{FixError, FixSelection, Fixer};
use crate::parser::parse;
use crate::registry::{ResolvedRules, RuleRegistry};
use crate::types::{FileError, FileErrorKind, Finding, FixSummary, LintResult, Severity};

use glob::{MatchOptions, Pattern};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop a whole run.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Invalid configuration or a fatal rule failure.
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    /// The worker pool could not be created.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Shared flag telling outstanding tasks to stop.
///
/// Tasks that have not started yet are skipped once the token is cancelled.
/// Tasks already running finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder<'a> {
    registry: Option<&'a RuleRegistry>,
    config: Option<Config>,
    exclude_patterns: Vec<String>,
    fix: Option<FixSelection>,
    write_fixes: bool,
    baseline: Option<Baseline>,
    ignore_baseline: bool,
    cancellation: Option<CancellationToken>,
}

impl<'a> AnalyzerBuilder<'a> {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            write_fixes: true,
            ..Self::default()
        }
    }

    /// Sets the registry the rule set is resolved from.
    #[must_use]
    pub fn registry(mut self, registry: &'a RuleRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds an exclude glob pattern on top of the configured ones.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Enables fixing of the selected findings.
    #[must_use]
    pub fn fix(mut self, selection: FixSelection) -> Self {
        self.fix = Some(selection);
        self
    }

    /// Sets whether fixed text is written back to disk (default: true).
    #[must_use]
    pub fn write_fixes(mut self, write: bool) -> Self {
        self.write_fixes = write;
        self
    }

    /// Uses the given baseline instead of the configured baseline file.
    #[must_use]
    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Ignores any configured baseline file.
    #[must_use]
    pub fn ignore_baseline(mut self, ignore: bool) -> Self {
        self.ignore_baseline = ignore;
        self
    }

    /// Shares a cancellation token with the caller.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, names unknown
    /// rules, or references an unreadable baseline.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let fail_on = config.fail_on()?;

        let rules = match self.registry {
            Some(registry) => registry.resolve(&config)?,
            None => RuleRegistry::new().resolve(&config)?,
        };

        let include = compile_globs(&config.analyzer.include)?;
        let mut exclude_patterns = config.analyzer.exclude.clone();
        exclude_patterns.extend(self.exclude_patterns);
        let exclude = compile_globs(&exclude_patterns)?;

        let baseline = match (self.baseline, &config.analyzer.baseline) {
            (Some(baseline), _) => Some(baseline),
            (None, _) if self.ignore_baseline => None,
            (None, Some(path)) => load_baseline(path)?,
            (None, None) => None,
        };

        Ok(Analyzer {
            rules,
            config,
            fail_on,
            include,
            exclude,
            fix: self.fix,
            write_fixes: self.write_fixes,
            baseline,
            cancellation: self.cancellation.unwrap_or_default(),
        })
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigurationError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| ConfigurationError::InvalidGlob {
                pattern: p.clone(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

fn load_baseline(path: &Path) -> Result<Option<Baseline>, ConfigurationError> {
    match Baseline::load(path) {
        Ok(baseline) => {
            debug!(path = %path.display(), entries = baseline.len(), "loaded baseline");
            Ok(Some(baseline))
        }
        Err(BaselineError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "baseline file not found, using none");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// What happened to one file.
enum FileOutcome {
    Done(LintResult),
    Cancelled(PathBuf),
    Fatal { rule: String, message: String },
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    rules: ResolvedRules,
    config: Config,
    fail_on: Severity,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    fix: Option<FixSelection>,
    write_fixes: bool,
    baseline: Option<Baseline>,
    cancellation: CancellationToken,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder<'a>() -> AnalyzerBuilder<'a> {
        AnalyzerBuilder::new()
    }

    /// The resolved rule set, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &ResolvedRules {
        &self.rules
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured failure threshold.
    #[must_use]
    pub fn fail_on(&self) -> Severity {
        self.fail_on
    }

    /// The run's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Analyzes the given files and directories.
    ///
    /// Directories are walked for files matching the include patterns;
    /// explicit files are always analyzed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError`] if the worker pool cannot start or a rule
    /// fails fatally. File-level failures are reported in the result.
    pub fn analyze(&self, paths: &[PathBuf]) -> Result<LintResult, AnalyzerError> {
        info!(rules = self.rules.len(), "starting analysis");
        let (files, missing) = self.discover_files(paths);
        info!("Found {} files to analyze", files.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.analyzer.parallelism.unwrap_or(0))
            .build()?;
        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    if self.cancellation.is_cancelled() {
                        FileOutcome::Cancelled(path.clone())
                    } else {
                        self.analyze_file(path)
                    }
                })
                .collect()
        });

        let mut result = LintResult::new();
        result.file_errors = missing;
        let mut fatal = None;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Done(file_result) => result.extend(file_result),
                FileOutcome::Cancelled(path) => result.cancelled.push(path),
                FileOutcome::Fatal { rule, message } => {
                    fatal.get_or_insert((rule, message));
                }
            }
        }
        if let Some((rule, message)) = fatal {
            warn!(
                rule = %rule,
                cancelled = result.cancelled.len(),
                "run cancelled by a fatal rule failure"
            );
            return Err(ConfigurationError::FatalRule { rule, message }.into());
        }

        Ok(self.finish(result))
    }

    /// Analyzes in-memory text as if it were the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError`] if a rule fails fatally.
    pub fn analyze_source(&self, path: &Path, text: &str) -> Result<LintResult, AnalyzerError> {
        match self.check_source(path, text, false) {
            FileOutcome::Fatal { rule, message } => {
                Err(ConfigurationError::FatalRule { rule, message }.into())
            }
            FileOutcome::Done(result) => Ok(self.finish(result)),
            FileOutcome::Cancelled(path) => {
                let mut result = LintResult::new();
                result.cancelled.push(path);
                Ok(result)
            }
        }
    }

    /// Merges per-file results into the final report order.
    fn finish(&self, mut result: LintResult) -> LintResult {
        result.sort();
        let duplicates = result.dedup();
        if duplicates > 0 {
            debug!(duplicates, "removed duplicate findings");
        }
        if let Some(baseline) = &self.baseline {
            let (kept, absorbed) = baseline.filter(std::mem::take(&mut result.findings));
            result.findings = kept;
            result.baselined = absorbed;
        }
        info!(
            findings = result.findings.len(),
            files = result.files_checked,
            file_errors = result.file_errors.len(),
            suppressed = result.suppressed,
            baselined = result.baselined,
            "analysis complete"
        );
        result
    }

    /// Reads and analyzes one file.
    fn analyze_file(&self, path: &Path) -> FileOutcome {
        debug!("Analyzing: {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(text) => self.check_source(path, &text, self.write_fixes),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                let mut result = LintResult::new();
                result.file_errors.push(FileError::new(
                    path,
                    FileErrorKind::IoError,
                    1,
                    1,
                    e.to_string(),
                ));
                FileOutcome::Done(result)
            }
        }
    }

    fn check_source(&self, path: &Path, text: &str, write: bool) -> FileOutcome {
        let mut result = LintResult::new();
        let document = match parse(text, path) {
            Ok(document) => document,
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                let mut error = FileError::new(
                    path,
                    FileErrorKind::ParseError,
                    e.line,
                    e.column,
                    e.message,
                );
                error.source_text = Some(text.to_string());
                error.offset = e.offset;
                result.file_errors.push(error);
                return FileOutcome::Done(result);
            }
        };

        let timeout = match self.config.analyzer.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let engine = Engine::new(&self.rules)
            .timeout(timeout)
            .require_suppression_reason(self.config.analyzer.require_suppression_reason);

        let evaluation = match &self.fix {
            None => engine.evaluate_detailed(&document).map(|e| (e.findings, e.suppressed)),
            Some(selection) => {
                let fixer = Fixer::new(&self.rules, selection.clone())
                    .max_passes(self.config.analyzer.max_fix_passes);
                match fixer.run(document.clone(), &engine) {
                    Ok(outcome) => {
                        if outcome.changed() {
                            if write {
                                if let Err(e) = std::fs::write(path, outcome.document.text()) {
                                    warn!("Failed to write {}: {}", path.display(), e);
                                    result.file_errors.push(FileError::new(
                                        path,
                                        FileErrorKind::IoError,
                                        1,
                                        1,
                                        format!("failed to write fixes: {e}"),
                                    ));
                                    // The file on disk is unchanged, so report what it still contains.
                                    return self.finish_source(
                                        path,
                                        result,
                                        engine
                                            .evaluate_detailed(&document)
                                            .map(|e| (e.findings, e.suppressed)),
                                    );
                                }
                            }
                            result.fixes.push(FixSummary {
                                file: path.to_path_buf(),
                                applied: outcome.applied,
                                passes: outcome.passes,
                                converged: outcome.converged,
                            });
                        }
                        result.pending_fixes = outcome.pending.len();
                        Ok((outcome.findings, outcome.suppressed))
                    }
                    Err(FixError::BrokenOutput { rules, source }) => {
                        warn!(
                            file = %path.display(),
                            rules = %rules.join(", "),
                            error = %source,
                            "rejected fixes that broke the document"
                        );
                        engine.evaluate_detailed(&document).map(|e| (e.findings, e.suppressed))
                    }
                    Err(FixError::Engine(e)) => Err(e),
                }
            }
        };

        self.finish_source(path, result, evaluation)
    }

    fn finish_source(
        &self,
        path: &Path,
        mut result: LintResult,
        evaluation: Result<(Vec<Finding>, usize), EngineError>,
    ) -> FileOutcome {
        match evaluation {
            Ok((findings, suppressed)) => {
                result.findings = findings;
                result.suppressed = suppressed;
                result.files_checked = 1;
                FileOutcome::Done(result)
            }
            Err(EngineError::Timeout { limit_ms }) => {
                warn!("Timed out analyzing {} after {} ms", path.display(), limit_ms);
                result.file_errors.push(FileError::new(
                    path,
                    FileErrorKind::Timeout,
                    1,
                    1,
                    format!("analysis exceeded the time limit of {limit_ms} ms"),
                ));
                FileOutcome::Done(result)
            }
            Err(EngineError::Fatal { rule, message }) => {
                self.cancellation.cancel();
                FileOutcome::Fatal { rule, message }
            }
        }
    }

    /// Expands the given paths into the sorted list of files to analyze.
    ///
    /// Paths that do not exist are returned as file errors.
    fn discover_files(&self, paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<FileError>) {
        let mut files = Vec::new();
        let mut missing = Vec::new();
        for path in paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                self.walk(path, &mut files, &mut missing);
            } else {
                missing.push(FileError::new(
                    path,
                    FileErrorKind::IoError,
                    1,
                    1,
                    "no such file or directory",
                ));
            }
        }
        files.sort();
        files.dedup();
        (files, missing)
    }

    fn walk(&self, root: &Path, files: &mut Vec<PathBuf>, errors: &mut Vec<FileError>) {
        let respect = self.config.analyzer.respect_gitignore;
        let walker = ignore::WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .ignore(respect)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to walk {}: {}", root.display(), e);
                    errors.push(FileError::new(
                        root,
                        FileErrorKind::IoError,
                        1,
                        1,
                        e.to_string(),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = tidy(entry.path());
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.is_excluded(&path, relative) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            if self.is_included(&path, relative) {
                files.push(path);
            }
        }
    }

    /// Checks if a discovered path matches an include pattern.
    fn is_included(&self, path: &Path, relative: &Path) -> bool {
        self.include
            .iter()
            .any(|p| matches_either(p, path, relative))
    }

    /// Checks if a discovered path matches an exclude pattern.
    fn is_excluded(&self, path: &Path, relative: &Path) -> bool {
        self.exclude
            .iter()
            .any(|p| matches_either(p, path, relative))
    }
}

fn matches_either(pattern: &Pattern, path: &Path, relative: &Path) -> bool {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };
    pattern.matches_path_with(path, options) || pattern.matches_path_with(relative, options)
}

/// Drops a leading `./` so reported paths read naturally.
fn tidy(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::context::RuleContext;
    use crate::document::{Document, Node, NodeKind};
    use crate::error::RuleError;
    use crate::rule::{Match, Rule, RuleKind};
    use crate::types::Edit;

    struct FlagBad;

    impl Rule for FlagBad {
        fn id(&self) -> &'static str {
            "flag-bad"
        }
        fn code(&self) -> &'static str {
            "T001"
        }
        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Scalar]
        }
        fn check_node(&self, _ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
            Ok(if node.as_str() == Some("bad") {
                vec![Match::new(node.span, "bad value")]
            } else {
                vec![]
            })
        }
    }

    struct FixBad;

    impl Rule for FixBad {
        fn id(&self) -> &'static str {
            "fix-bad"
        }
        fn code(&self) -> &'static str {
            "T002"
        }
        fn kind(&self) -> RuleKind {
            RuleKind::Fixable
        }
        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Scalar]
        }
        fn check_node(&self, _ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
            Ok(if node.as_str() == Some("bad") {
                vec![Match::new(node.span, "bad value").fixable()]
            } else {
                vec![]
            })
        }
        fn fix(
            &self,
            _document: &Document,
            finding: &Finding,
            _options: &RuleConfig,
        ) -> Result<Option<Edit>, RuleError> {
            Ok(Some(Edit::new("fix-bad", finding.span, "good")))
        }
    }

    struct Fatal;

    impl Rule for Fatal {
        fn id(&self) -> &'static str {
            "fatal"
        }
        fn code(&self) -> &'static str {
            "T004"
        }
        fn check_document(&self, _ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
            Err(RuleError::Fatal("cannot continue".into()))
        }
    }

    fn registry() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry.register(FlagBad).unwrap();
        registry
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        let shared = token.clone();
        assert!(!shared.is_cancelled());
        token.cancel();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn discovery_honours_include_exclude_and_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "site.yml", "a: 1\n");
        write(dir.path(), "roles/web/tasks/main.yaml", "a: 1\n");
        write(dir.path(), "README.md", "# hi\n");
        write(dir.path(), "vendor/lib.yml", "a: 1\n");
        write(dir.path(), "build/out.yml", "a: 1\n");
        write(dir.path(), ".gitignore", "build/\n");
        let explicit = write(dir.path(), "vendor/explicit.yml", "a: 1\n");

        let registry = registry();
        let analyzer = Analyzer::builder()
            .registry(&registry)
            .exclude("vendor/**")
            .build()
            .unwrap();
        let (files, missing) =
            analyzer.discover_files(&[dir.path().to_path_buf(), explicit.clone()]);
        assert!(missing.is_empty());
        let names: Vec<String> = files
            .iter()
            .map(|f| {
                f.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(
            names,
            vec!["roles/web/tasks/main.yaml", "site.yml", "vendor/explicit.yml"]
        );
    }

    #[test]
    fn missing_paths_are_file_errors() {
        let registry = registry();
        let analyzer = Analyzer::builder().registry(&registry).build().unwrap();
        let result = analyzer
            .analyze(&[PathBuf::from("definitely/not/here.yml")])
            .unwrap();
        assert_eq!(result.file_errors.len(), 1);
        assert_eq!(result.file_errors[0].kind, FileErrorKind::IoError);
        assert_eq!(result.files_checked, 0);
    }

    #[test]
    fn parse_failures_do_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.yml", "a: bad\n");
        let broken = write(dir.path(), "broken.yml", "a: \"open\n");
        let registry = registry();
        let analyzer = Analyzer::builder().registry(&registry).build().unwrap();
        let result = analyzer.analyze(&[good, broken.clone()]).unwrap();
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.file_errors.len(), 1);
        assert_eq!(result.file_errors[0].file, broken);
        assert_eq!(result.file_errors[0].kind, FileErrorKind::ParseError);
        assert!(result.file_errors[0].source_text.is_some());
    }

    #[test]
    fn fatal_rule_cancels_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.yml", "a: 1\n");
        let mut registry = RuleRegistry::new();
        registry.register(Fatal).unwrap();
        let analyzer = Analyzer::builder().registry(&registry).build().unwrap();
        let err = analyzer.analyze(&[file]).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Config(ConfigurationError::FatalRule { ref rule, .. }) if rule == "fatal"
        ));
        assert!(analyzer.cancellation().is_cancelled());
    }

    #[test]
    fn cancelled_token_skips_unstarted_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.yml", "a: bad\n");
        let registry = registry();
        let token = CancellationToken::new();
        token.cancel();
        let analyzer = Analyzer::builder()
            .registry(&registry)
            .cancellation(token)
            .build()
            .unwrap();
        let result = analyzer.analyze(&[file.clone()]).unwrap();
        assert_eq!(result.cancelled, vec![file]);
        assert!(result.findings.is_empty());
    }

    #[test]
    fn baseline_is_applied_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.yml", "a: bad\nb: bad\n");
        let registry = registry();
        let first = Analyzer::builder().registry(&registry).build().unwrap();
        let result = first.analyze(&[file.clone()]).unwrap();
        assert_eq!(result.findings.len(), 2);

        let baseline = Baseline::from_findings(&result.findings[..1]);
        let second = Analyzer::builder()
            .registry(&registry)
            .baseline(baseline)
            .build()
            .unwrap();
        let result = second.analyze(&[file]).unwrap();
        assert_eq!(result.baselined, 1);
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn baseline_absorbs_each_repeated_finding_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.yml", "- bad\n- bad\n");
        let registry = registry();
        let first = Analyzer::builder().registry(&registry).build().unwrap();
        let result = first.analyze(&[file.clone()]).unwrap();
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.findings[0].fingerprint, result.findings[1].fingerprint);

        let second = Analyzer::builder()
            .registry(&registry)
            .baseline(Baseline::from_findings(&result.findings[..1]))
            .build()
            .unwrap();
        let result = second.analyze(&[file]).unwrap();
        assert_eq!(result.baselined, 1);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].line(), 2);
    }

    #[test]
    fn failed_fix_write_reports_the_unfixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let unwritable = dir.path().join("missing").join("a.yml");
        let mut registry = RuleRegistry::new();
        registry.register(FixBad).unwrap();
        let analyzer = Analyzer::builder()
            .registry(&registry)
            .fix(FixSelection::All)
            .build()
            .unwrap();

        let FileOutcome::Done(result) = analyzer.check_source(&unwritable, "a: bad\n", true) else {
            panic!("expected a finished file");
        };
        assert_eq!(result.file_errors.len(), 1);
        assert_eq!(result.file_errors[0].kind, FileErrorKind::IoError);
        assert!(result.fixes.is_empty());
        assert_eq!(result.pending_fixes, 0);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].rule, "fix-bad");
        assert_eq!(result.files_checked, 1);
    }

    #[test]
    fn invalid_globs_are_configuration_errors() {
        let config = Config::parse("[analyzer]\ninclude = [\"[\"]\n").unwrap();
        let err = Analyzer::builder().config(config).build().err().unwrap();
        assert!(matches!(
            err,
            AnalyzerError::Config(ConfigurationError::InvalidGlob { .. })
        ));
    }

    #[test]
    fn configured_baseline_may_not_exist_yet() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.analyzer.baseline = Some(dir.path().join("missing.json"));
        assert!(Analyzer::builder().config(config).build().is_ok());
    }

    #[test]
    fn analyze_source_lints_in_memory_text() {
        let registry = registry();
        let analyzer = Analyzer::builder().registry(&registry).build().unwrap();
        let result = analyzer
            .analyze_source(Path::new("inline.yml"), "x: bad\n")
            .unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].file, PathBuf::from("inline.yml"));
    }
}
