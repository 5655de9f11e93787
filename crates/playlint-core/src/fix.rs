//! Safe textual fixing.
//!
//! A fix pass asks each selected, fixable finding's rule for one [`Edit`],
//! applies the non-overlapping ones to the raw text and re-parses the result.
//! Bytes outside the edited spans are never touched, so comments and
//! formatting survive. [`Fixer::run`] repeats passes until nothing changes.

use crate::document::Document;
use crate::engine::{catch_quietly, panic_message, Engine, EngineError};
use crate::error::RuleError;
use crate::parser::{parse, ParseError};
use crate::registry::ResolvedRules;
use crate::types::{Edit, Finding};
use thiserror::Error;
use tracing::{debug, warn};

/// Default cap on fix passes per document.
pub const DEFAULT_MAX_FIX_PASSES: usize = 10;

/// Errors that reject a fix pass.
#[derive(Debug, Error)]
pub enum FixError {
    /// The edited text no longer parses. The original document is kept.
    #[error("fixes from {} produced unparsable output: {source}", rules.join(", "))]
    BrokenOutput {
        /// Rules whose edits were part of the rejected pass.
        rules: Vec<String>,
        /// Parse failure of the edited text.
        #[source]
        source: ParseError,
    },

    /// Re-evaluating the document failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Which findings to fix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FixSelection {
    /// Every fixable finding.
    #[default]
    All,
    /// Findings of rules matching any of these ids, codes or tags.
    Only(Vec<String>),
}

impl FixSelection {
    /// Parses a comma-separated selector list. An empty list selects all.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let selectors: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if selectors.is_empty() {
            Self::All
        } else {
            Self::Only(selectors)
        }
    }

    fn selects(&self, rules: &ResolvedRules, finding: &Finding) -> bool {
        if !finding.fixable {
            return false;
        }
        match self {
            Self::All => true,
            Self::Only(selectors) => rules
                .get(&finding.rule)
                .is_some_and(|r| selectors.iter().any(|s| r.rule.matches_selector(s))),
        }
    }
}

/// Result of one fix pass.
#[derive(Debug, Clone)]
pub struct FixPass {
    /// The re-parsed document after the pass.
    pub document: Document,
    /// Edits applied, in text order.
    pub applied: Vec<Edit>,
    /// Findings whose edits conflicted with an applied edit.
    pub pending: Vec<Finding>,
}

/// Result of fixing a document to convergence.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The final document.
    pub document: Document,
    /// Total edits applied across passes.
    pub applied: usize,
    /// Number of passes that applied at least one edit.
    pub passes: usize,
    /// False if the pass limit was hit while edits were still being applied.
    pub converged: bool,
    /// Findings of the final document.
    pub findings: Vec<Finding>,
    /// Findings of the final document removed by inline directives.
    pub suppressed: usize,
    /// Selected fixable findings still present in the final document.
    pub pending: Vec<Finding>,
}

impl FixOutcome {
    /// Returns true if the document text changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Applies rule-proposed edits.
#[derive(Debug, Clone)]
pub struct Fixer<'r> {
    rules: &'r ResolvedRules,
    selection: FixSelection,
    max_passes: usize,
}

impl<'r> Fixer<'r> {
    /// Creates a fixer over a resolved rule set.
    #[must_use]
    pub fn new(rules: &'r ResolvedRules, selection: FixSelection) -> Self {
        Self {
            rules,
            selection,
            max_passes: DEFAULT_MAX_FIX_PASSES,
        }
    }

    /// Sets the maximum number of passes for [`Fixer::run`].
    #[must_use]
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    /// Runs one fix pass over the given findings.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::BrokenOutput`] if the edited text does not parse.
    pub fn apply(&self, document: &Document, findings: &[Finding]) -> Result<FixPass, FixError> {
        let mut proposed: Vec<(Edit, &Finding)> = Vec::new();
        for finding in findings {
            if !self.selection.selects(self.rules, finding) {
                continue;
            }
            if let Some(edit) = self.propose(document, finding) {
                proposed.push((edit, finding));
            }
        }
        proposed.sort_by(|(a, _), (b, _)| {
            (a.span.start.offset, a.span.end.offset, &a.rule)
                .cmp(&(b.span.start.offset, b.span.end.offset, &b.rule))
        });

        let mut applied: Vec<Edit> = Vec::new();
        let mut pending = Vec::new();
        for (edit, finding) in proposed {
            if applied.iter().any(|a| a.span.overlaps(&edit.span)) {
                debug!(rule = %edit.rule, line = edit.span.start.line, "deferring conflicting edit");
                pending.push(finding.clone());
            } else {
                applied.push(edit);
            }
        }

        if applied.is_empty() {
            return Ok(FixPass {
                document: document.clone(),
                applied,
                pending,
            });
        }

        let text = splice(document.text(), &applied);
        let fixed = parse(&text, document.path()).map_err(|source| {
            let mut rules: Vec<String> = applied.iter().map(|e| e.rule.clone()).collect();
            rules.sort();
            rules.dedup();
            FixError::BrokenOutput { rules, source }
        })?;
        Ok(FixPass {
            document: fixed,
            applied,
            pending,
        })
    }

    /// Evaluates and fixes a document until a pass applies nothing or the
    /// pass limit is reached.
    ///
    /// # Errors
    ///
    /// Returns [`FixError`] if a pass produces unparsable output or the
    /// engine fails.
    pub fn run(&self, document: Document, engine: &Engine<'_>) -> Result<FixOutcome, FixError> {
        let mut document = document;
        let mut applied = 0;
        let mut passes = 0;
        let mut evaluation = engine.evaluate_detailed(&document)?;
        let mut converged = false;

        while passes < self.max_passes {
            let pass = self.apply(&document, &evaluation.findings)?;
            if pass.applied.is_empty() {
                converged = true;
                break;
            }
            passes += 1;
            applied += pass.applied.len();
            document = pass.document;
            evaluation = engine.evaluate_detailed(&document)?;
        }

        if !converged {
            // The last pass may have been the one that settled everything.
            converged = self.apply(&document, &evaluation.findings)?.applied.is_empty();
        }
        if !converged {
            warn!(
                file = %document.path().display(),
                passes,
                "fixes did not converge within the pass limit"
            );
        }

        let pending = evaluation
            .findings
            .iter()
            .filter(|f| self.selection.selects(self.rules, f))
            .cloned()
            .collect();
        Ok(FixOutcome {
            document,
            applied,
            passes,
            converged,
            findings: evaluation.findings,
            suppressed: evaluation.suppressed,
            pending,
        })
    }

    fn propose(&self, document: &Document, finding: &Finding) -> Option<Edit> {
        let resolved = self.rules.get(&finding.rule)?;
        let outcome = catch_quietly(|| resolved.rule.fix(document, finding, &resolved.options));
        let message = match outcome {
            Ok(Ok(Some(edit))) if document.contains(&edit.span) => return Some(edit),
            Ok(Ok(Some(_))) => "proposed an edit outside the document".to_string(),
            Ok(Ok(None)) => return None,
            Ok(Err(RuleError::Failed(m) | RuleError::Fatal(m))) => m,
            Err(payload) => panic_message(payload.as_ref()),
        };
        warn!(
            file = %document.path().display(),
            rule = %finding.rule,
            message,
            "fix failed"
        );
        None
    }
}

/// Rewrites `text` with non-overlapping edits sorted by position.
fn splice(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&text[cursor..edit.span.start.offset]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end.offset;
    }
    out.push_str(&text[cursor..]);
    out
}
