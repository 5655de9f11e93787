//! Rule trait for defining lint rules.

use crate::config::RuleConfig;
use crate::context::RuleContext;
use crate::document::{Document, Node, NodeKind};
use crate::error::RuleError;
use crate::types::{Edit, Finding, Severity, Span};
use std::sync::Arc;

/// Whether a rule only reports or can also fix what it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Reports findings only.
    Check,
    /// Reports findings and proposes edits for them.
    Fixable,
}

/// A raw match site produced by a rule.
///
/// The engine turns matches into [`Finding`]s by attaching the rule id, code,
/// effective severity and file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Source range of the match.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
    /// Whether the rule can fix this particular match.
    pub fixable: bool,
    /// Optional hint on how to resolve the match.
    pub help: Option<String>,
}

impl Match {
    /// Creates a non-fixable match.
    #[must_use]
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            fixable: false,
            help: None,
        }
    }

    /// Marks the match as fixable.
    #[must_use]
    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    /// Adds a help hint.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// A lint rule over parsed documents.
///
/// Rules are capability sets: metadata, a node predicate, an optional
/// whole-document predicate and an optional fix. The engine offers each node
/// only to the rules whose [`Rule::node_kinds`] include the node's kind, and
/// calls [`Rule::check_document`] once per document before the walk.
///
/// # Example
///
/// ```ignore
/// use playlint_core::{Match, Node, NodeKind, Rule, RuleContext, RuleError};
///
/// pub struct NoEmptyValues;
///
/// impl Rule for NoEmptyValues {
///     fn id(&self) -> &'static str { "no-empty-values" }
///     fn code(&self) -> &'static str { "PL100" }
///     fn node_kinds(&self) -> &'static [NodeKind] { &[NodeKind::Scalar] }
///
///     fn check_node(&self, _ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
///         if node.key.is_some() && node.is_null() {
///             return Ok(vec![Match::new(node.span, "empty value")]);
///         }
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case id of this rule (e.g., "duplicate-key").
    fn id(&self) -> &'static str;

    /// Returns the rule code (e.g., "PL001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for findings from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Whether this rule only checks or can also fix.
    fn kind(&self) -> RuleKind {
        RuleKind::Check
    }

    /// Tags used for selection and exclusion.
    fn tags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Ids of rules that must run before this one.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether the rule is part of the default set.
    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Whether this rule requires a reason when using allow directives.
    ///
    /// By default, rules with `Severity::Error` require a reason.
    fn requires_allow_reason(&self) -> bool {
        self.default_severity() == Severity::Error
    }

    /// Node kinds this rule wants to be offered during the walk.
    fn node_kinds(&self) -> &'static [NodeKind] {
        &[]
    }

    /// Checks one node. Called in post-order for every node whose kind is
    /// listed in [`Rule::node_kinds`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the rule cannot evaluate the node.
    fn check_node(&self, _ctx: &mut RuleContext<'_>, _node: &Node) -> Result<Vec<Match>, RuleError> {
        Ok(Vec::new())
    }

    /// Checks the document as a whole (text and line based checks).
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the rule cannot evaluate the document.
    fn check_document(&self, _ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
        Ok(Vec::new())
    }

    /// Proposes at most one edit resolving a finding of this rule.
    ///
    /// `options` are the rule's configured options, as seen by the checks.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the fix cannot be computed.
    fn fix(
        &self,
        _document: &Document,
        _finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        Ok(None)
    }

    /// Returns true if `selector` names this rule by id, code or tag.
    fn matches_selector(&self, selector: &str) -> bool {
        selector == self.id() || selector == self.code() || self.tags().contains(&selector)
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// Shared rule handle, as held by a registry.
pub type RuleRef = Arc<dyn Rule>;

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRule;

    impl Rule for TestRule {
        fn id(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn description(&self) -> &'static str {
            "A test rule"
        }
        fn tags(&self) -> &'static [&'static str] {
            &["style"]
        }
    }

    #[test]
    fn test_rule_defaults() {
        let rule = TestRule;
        assert_eq!(rule.id(), "test-rule");
        assert_eq!(rule.code(), "TEST001");
        assert_eq!(rule.default_severity(), Severity::Warning);
        assert_eq!(rule.kind(), RuleKind::Check);
        assert!(rule.enabled_by_default());
        assert!(!rule.requires_allow_reason());
    }

    #[test]
    fn test_selector_matching() {
        let rule = TestRule;
        assert!(rule.matches_selector("test-rule"));
        assert!(rule.matches_selector("TEST001"));
        assert!(rule.matches_selector("style"));
        assert!(!rule.matches_selector("other"));
    }
}
