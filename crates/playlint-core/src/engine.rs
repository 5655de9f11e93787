//! Single-traversal rule evaluation.
//!
//! The engine walks each document once, in post-order, and offers every node
//! to the rules interested in its kind. Rule callbacks are isolated: an error
//! or panic inside one rule becomes a synthetic `rule-error` finding and the
//! rule is skipped for the rest of the document, while other rules keep
//! running.

use crate::baseline::fingerprint;
use crate::context::{Annotations, RuleContext};
use crate::document::{Document, NodeKind};
use crate::error::RuleError;
use crate::registry::{ResolvedRule, ResolvedRules};
use crate::rule::{Match, RuleKind};
use crate::suppression::Suppressions;
use crate::types::{
    Finding, Severity, MISSING_SUPPRESSION_REASON, MISSING_SUPPRESSION_REASON_CODE, RULE_ERROR,
    RULE_ERROR_CODE,
};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Once;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Nodes visited between two deadline checks.
const DEADLINE_STRIDE: usize = 64;

/// Errors that stop the evaluation of a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A rule reported a fatal condition. The run should be cancelled.
    #[error("rule `{rule}` failed fatally: {message}")]
    Fatal {
        /// Failing rule.
        rule: String,
        /// Failure description.
        message: String,
    },

    /// The per-document time limit was exceeded.
    #[error("analysis exceeded the time limit of {limit_ms} ms")]
    Timeout {
        /// The configured limit.
        limit_ms: u64,
    },
}

/// Findings of one document together with suppression statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Findings that survived suppression, sorted and deduplicated.
    pub findings: Vec<Finding>,
    /// Number of findings removed by inline directives.
    pub suppressed: usize,
}

/// Evaluates a resolved rule set against documents.
#[derive(Debug, Clone)]
pub struct Engine<'r> {
    rules: &'r ResolvedRules,
    timeout: Option<Duration>,
    require_suppression_reason: bool,
}

/// Outcome of one isolated rule callback.
enum Fault {
    Failed(String),
    Fatal(String),
}

impl<'r> Engine<'r> {
    /// Creates an engine over a resolved rule set.
    #[must_use]
    pub fn new(rules: &'r ResolvedRules) -> Self {
        Self {
            rules,
            timeout: None,
            require_suppression_reason: false,
        }
    }

    /// Sets the per-document time limit.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Emits a warning when an `allow` directive without a reason suppresses
    /// a rule that requires one.
    #[must_use]
    pub fn require_suppression_reason(mut self, required: bool) -> Self {
        self.require_suppression_reason = required;
        self
    }

    /// The rule set this engine evaluates.
    #[must_use]
    pub fn rules(&self) -> &'r ResolvedRules {
        self.rules
    }

    /// Evaluates a document and returns its findings in report order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Fatal`] if a rule reports a fatal failure and
    /// [`EngineError::Timeout`] if the time limit is exceeded.
    pub fn evaluate(&self, document: &Document) -> Result<Vec<Finding>, EngineError> {
        self.evaluate_detailed(document).map(|e| e.findings)
    }

    /// Like [`Engine::evaluate`], also reporting how many findings were
    /// suppressed.
    ///
    /// # Errors
    ///
    /// See [`Engine::evaluate`].
    pub fn evaluate_detailed(&self, document: &Document) -> Result<Evaluation, EngineError> {
        let started = Instant::now();
        let rules: Vec<&ResolvedRule> = self.rules.iter().collect();
        let mut annotations = Annotations::new();
        let mut disabled = vec![false; rules.len()];
        let mut raw = Vec::new();

        for (i, resolved) in rules.iter().enumerate() {
            self.check_deadline(started)?;
            let outcome = isolate(|| {
                let mut ctx = RuleContext::new(document, &resolved.options, &mut annotations);
                resolved.rule.check_document(&mut ctx)
            });
            if !collect(document, resolved, outcome, &mut raw)? {
                disabled[i] = true;
            }
        }

        let mut dispatch: [Vec<usize>; 3] = Default::default();
        for (i, resolved) in rules.iter().enumerate() {
            for kind in resolved.rule.node_kinds() {
                let slot = &mut dispatch[kind_slot(*kind)];
                if !slot.contains(&i) {
                    slot.push(i);
                }
            }
        }

        for (visited, id) in document.post_order().into_iter().enumerate() {
            if visited % DEADLINE_STRIDE == 0 {
                self.check_deadline(started)?;
            }
            let node = document.node(id);
            for &i in &dispatch[kind_slot(node.kind)] {
                if disabled[i] {
                    continue;
                }
                let resolved = rules[i];
                let outcome = isolate(|| {
                    let mut ctx = RuleContext::new(document, &resolved.options, &mut annotations);
                    resolved.rule.check_node(&mut ctx, node)
                });
                if !collect(document, resolved, outcome, &mut raw)? {
                    disabled[i] = true;
                }
            }
        }

        let evaluation = self.filter_suppressed(document, raw);
        debug!(
            file = %document.path().display(),
            findings = evaluation.findings.len(),
            suppressed = evaluation.suppressed,
            elapsed_ms = started.elapsed().as_millis(),
            "evaluated document"
        );
        Ok(evaluation)
    }

    fn check_deadline(&self, started: Instant) -> Result<(), EngineError> {
        match self.timeout {
            Some(limit) if started.elapsed() >= limit => Err(EngineError::Timeout {
                limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
            _ => Ok(()),
        }
    }

    fn filter_suppressed(&self, document: &Document, raw: Vec<Finding>) -> Evaluation {
        let suppressions = Suppressions::parse(document);
        let mut findings = Vec::with_capacity(raw.len());
        let mut reasons_missing: Vec<(usize, String)> = Vec::new();
        let mut suppressed = 0;

        for finding in raw {
            if finding.is_rule_error() || suppressions.is_empty() {
                findings.push(finding);
                continue;
            }
            let Some(hit) = suppressions.check(finding.line(), &finding.rule, &finding.code) else {
                findings.push(finding);
                continue;
            };
            suppressed += 1;
            let strict = self
                .rules
                .get(&finding.rule)
                .is_some_and(|r| r.rule.requires_allow_reason());
            if self.require_suppression_reason && strict && hit.lacks_reason() {
                let key = (hit.directive_line, finding.rule.clone());
                if !reasons_missing.contains(&key) {
                    reasons_missing.push(key);
                }
            }
        }

        for (line, rule) in reasons_missing {
            let Some(span) = document.line_span(line) else {
                continue;
            };
            findings.push(
                Finding::new(
                    MISSING_SUPPRESSION_REASON,
                    MISSING_SUPPRESSION_REASON_CODE,
                    Severity::Warning,
                    document.path(),
                    span,
                    format!("allow directive for `{rule}` has no reason"),
                )
                .with_help("add reason=\"...\" to the directive"),
            );
        }

        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        findings.dedup_by(|a, b| a.file == b.file && a.span == b.span && a.rule == b.rule);
        Evaluation {
            findings,
            suppressed,
        }
    }
}

fn kind_slot(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Mapping => 0,
        NodeKind::Sequence => 1,
        NodeKind::Scalar => 2,
    }
}

thread_local! {
    static ISOLATING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Runs `f` under `catch_unwind` with panic output muted on this thread.
///
/// The caught panic surfaces as a `rule-error` finding or a warning, so the
/// default hook's stderr message would only repeat it. Panics on other
/// threads, or outside rule callbacks, still reach the previous hook.
pub(crate) fn catch_quietly<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    QUIET_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if !ISOLATING.with(Cell::get) {
                previous(info);
            }
        }));
    });
    let outer = ISOLATING.with(|flag| flag.replace(true));
    let result = catch_unwind(AssertUnwindSafe(f));
    ISOLATING.with(|flag| flag.set(outer));
    result
}

/// Runs a rule callback, converting errors and panics into a [`Fault`].
fn isolate<T>(f: impl FnOnce() -> Result<T, RuleError>) -> Result<T, Fault> {
    match catch_quietly(f) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(RuleError::Failed(message))) => Err(Fault::Failed(message)),
        Ok(Err(RuleError::Fatal(message))) => Err(Fault::Fatal(message)),
        Err(payload) => Err(Fault::Failed(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Converts a callback outcome into findings. Returns `Ok(false)` when the
/// rule faulted and must be skipped for the rest of the document.
fn collect(
    document: &Document,
    resolved: &ResolvedRule,
    outcome: Result<Vec<Match>, Fault>,
    out: &mut Vec<Finding>,
) -> Result<bool, EngineError> {
    let rule = &resolved.rule;
    let matches = match outcome {
        Ok(matches) => matches,
        Err(Fault::Fatal(message)) => {
            return Err(EngineError::Fatal {
                rule: rule.id().to_string(),
                message,
            })
        }
        Err(Fault::Failed(message)) => {
            out.push(rule_error(document, rule.id(), &message));
            return Ok(false);
        }
    };

    let fixable_rule = rule.kind() == RuleKind::Fixable;
    let start = out.len();
    for m in matches {
        if !document.contains(&m.span) {
            out.truncate(start);
            out.push(rule_error(
                document,
                rule.id(),
                &format!(
                    "reported a span outside the document ({}..{})",
                    m.span.start.offset, m.span.end.offset
                ),
            ));
            return Ok(false);
        }
        let line = document.line(m.span.start.line).unwrap_or_default();
        let mut finding = Finding::new(
            rule.id(),
            rule.code(),
            resolved.severity,
            document.path(),
            m.span,
            m.message,
        )
        .with_fixable(fixable_rule && m.fixable);
        finding.help = m.help;
        finding.fingerprint = fingerprint(rule.id(), line);
        out.push(finding);
    }
    Ok(true)
}

fn rule_error(document: &Document, rule: &str, message: &str) -> Finding {
    warn!(file = %document.path().display(), rule, message, "rule failed");
    let mut finding = Finding::new(
        RULE_ERROR,
        RULE_ERROR_CODE,
        Severity::Info,
        document.path(),
        document.span(0, 0),
        format!("rule `{rule}` failed: {message}"),
    );
    finding.fingerprint = fingerprint(RULE_ERROR, rule);
    finding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::document::Node;
    use crate::parse;
    use crate::registry::RuleRegistry;
    use crate::rule::Rule;
    use crate::types::Span;

    /// Flags every scalar equal to `bad`.
    struct FlagBad;

    impl Rule for FlagBad {
        fn id(&self) -> &'static str {
            "flag-bad"
        }
        fn code(&self) -> &'static str {
            "T001"
        }
        fn default_severity(&self) -> Severity {
            Severity::Error
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

    struct Panics;

    impl Rule for Panics {
        fn id(&self) -> &'static str {
            "panics"
        }
        fn code(&self) -> &'static str {
            "T002"
        }
        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Scalar]
        }
        fn check_node(&self, _ctx: &mut RuleContext<'_>, _node: &Node) -> Result<Vec<Match>, RuleError> {
            panic!("boom");
        }
    }

    struct OutOfRange;

    impl Rule for OutOfRange {
        fn id(&self) -> &'static str {
            "out-of-range"
        }
        fn code(&self) -> &'static str {
            "T003"
        }
        fn check_document(&self, ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
            let mut span = ctx.span(0, 1);
            span.end.offset = ctx.document.text().len() + 10;
            Ok(vec![Match::new(span, "too far")])
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
            Err(RuleError::Fatal("plugin missing".into()))
        }
    }

    /// Reports the first byte twice and the first two bytes once.
    struct Repeats;

    impl Rule for Repeats {
        fn id(&self) -> &'static str {
            "repeats"
        }
        fn code(&self) -> &'static str {
            "T006"
        }
        fn check_document(&self, ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
            Ok(vec![
                Match::new(ctx.span(0, 1), "short"),
                Match::new(ctx.span(0, 2), "long"),
                Match::new(ctx.span(0, 1), "short"),
            ])
        }
    }

    /// Annotates mappings with their child count; reads it back on the root.
    struct CountChildren;

    impl Rule for CountChildren {
        fn id(&self) -> &'static str {
            "count-children"
        }
        fn code(&self) -> &'static str {
            "T005"
        }
        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Mapping]
        }
        fn check_node(&self, ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
            let nested = ctx
                .document
                .children(node.id)
                .filter(|c| ctx.annotation(c.id, "seen").is_some())
                .count();
            ctx.annotate(node.id, "seen", crate::Annotation::Bool(true));
            Ok(if node.parent.is_none() {
                vec![Match::new(
                    Span::point(node.span.start),
                    format!("{nested} annotated children"),
                )]
            } else {
                vec![]
            })
        }
    }

    fn resolve<R: Rule + 'static>(rules: Vec<R>) -> ResolvedRules {
        let mut registry = RuleRegistry::new();
        for rule in rules {
            registry.register(rule).unwrap();
        }
        registry.resolve(&Config::default()).unwrap()
    }

    #[test]
    fn findings_are_sorted_and_fingerprinted() {
        let rules = resolve(vec![FlagBad]);
        let doc = parse("b: bad\na: [ok, bad]\n", "t.yml").unwrap();
        let findings = Engine::new(&rules).evaluate(&doc).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line(), 1);
        assert_eq!(findings[1].line(), 2);
        assert_eq!(findings[1].column(), 9);
        assert!(!findings[0].fingerprint.is_empty());
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let rules = resolve(vec![FlagBad]);
        let doc = parse("x: bad\ny:\n  - bad\n  - bad\n", "t.yml").unwrap();
        let engine = Engine::new(&rules);
        assert_eq!(engine.evaluate(&doc).unwrap(), engine.evaluate(&doc).unwrap());
    }

    #[test]
    fn identical_findings_are_reported_once() {
        let rules = resolve(vec![Repeats]);
        let doc = parse("a: 1\n", "t.yml").unwrap();
        let findings = Engine::new(&rules).evaluate(&doc).unwrap();
        let spans: Vec<(usize, usize)> = findings
            .iter()
            .map(|f| (f.span.start.offset, f.span.end.offset))
            .collect();
        assert_eq!(spans, [(0, 1), (0, 2)]);
    }

    #[test]
    fn quiet_catch_restores_the_hook_state() {
        let caught = catch_quietly(|| -> u8 { panic!("boom") });
        let message = panic_message(caught.unwrap_err().as_ref());
        assert_eq!(message, "panicked: boom");
        assert!(!ISOLATING.with(Cell::get));
        assert_eq!(catch_quietly(|| 7).unwrap(), 7);
    }

    #[test]
    fn panicking_rule_is_isolated() {
        let mut registry = RuleRegistry::new();
        registry.register(FlagBad).unwrap();
        registry.register(Panics).unwrap();
        let rules = registry.resolve(&Config::default()).unwrap();
        let doc = parse("a: bad\nb: bad\n", "t.yml").unwrap();
        let findings = Engine::new(&rules).evaluate(&doc).unwrap();
        let errors: Vec<_> = findings.iter().filter(|f| f.is_rule_error()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("panics"));
        assert_eq!(errors[0].severity, Severity::Info);
        assert_eq!(findings.iter().filter(|f| f.rule == "flag-bad").count(), 2);
    }

    #[test]
    fn out_of_document_span_is_a_rule_error() {
        let rules = resolve(vec![OutOfRange]);
        let doc = parse("a: 1\n", "t.yml").unwrap();
        let findings = Engine::new(&rules).evaluate(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_rule_error());
    }

    #[test]
    fn fatal_rule_aborts_the_document() {
        let rules = resolve(vec![Fatal]);
        let doc = parse("a: 1\n", "t.yml").unwrap();
        assert!(matches!(
            Engine::new(&rules).evaluate(&doc),
            Err(EngineError::Fatal { rule, .. }) if rule == "fatal"
        ));
    }

    #[test]
    fn zero_timeout_expires() {
        let rules = resolve(vec![FlagBad]);
        let doc = parse("a: 1\n", "t.yml").unwrap();
        let result = Engine::new(&rules)
            .timeout(Some(Duration::ZERO))
            .evaluate(&doc);
        assert_eq!(result, Err(EngineError::Timeout { limit_ms: 0 }));
    }

    #[test]
    fn post_order_lets_parents_read_child_annotations() {
        let rules = resolve(vec![CountChildren]);
        let doc = parse("a:\n  x: 1\nb:\n  y: 2\nc: 3\n", "t.yml").unwrap();
        let findings = Engine::new(&rules).evaluate(&doc).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "2 annotated children");
    }

    #[test]
    fn suppressed_findings_are_counted() {
        let rules = resolve(vec![FlagBad]);
        let doc = parse("a: bad  # noqa: flag-bad\nb: bad\n", "t.yml").unwrap();
        let evaluation = Engine::new(&rules).evaluate_detailed(&doc).unwrap();
        assert_eq!(evaluation.suppressed, 1);
        assert_eq!(evaluation.findings.len(), 1);
        assert_eq!(evaluation.findings[0].line(), 2);
    }

    #[test]
    fn missing_reason_is_reported_when_required() {
        let rules = resolve(vec![FlagBad]);
        let doc = parse("# playlint: allow(flag-bad)\na: bad\n", "t.yml").unwrap();
        let findings = Engine::new(&rules)
            .require_suppression_reason(true)
            .evaluate(&doc)
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, MISSING_SUPPRESSION_REASON);
        assert_eq!(findings[0].line(), 1);

        let doc = parse("# playlint: allow(flag-bad) reason=\"fixture\"\na: bad\n", "t.yml").unwrap();
        let findings = Engine::new(&rules)
            .require_suppression_reason(true)
            .evaluate(&doc)
            .unwrap();
        assert!(findings.is_empty());
    }
}
