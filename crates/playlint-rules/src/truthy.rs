//! Rule to normalize boolean-looking values.
//!
//! # Rationale
//!
//! Older loaders read `yes`, `on` or `True` as booleans while newer ones read
//! them as strings. Writing booleans as `true`/`false` removes the ambiguity.
//!
//! The rule also leaves a [`Annotation::Bool`] under [`ANNOTATION`] on every
//! boolean-looking value so later rules can read the normalized value.
//!
//! # Configuration
//!
//! - `allowed`: spellings that are accepted as-is (default: `["true", "false"]`)

use playlint_core::{
    Annotation, Document, Edit, Finding, Match, Node, NodeKind, Rule, RuleConfig, RuleContext,
    RuleError, RuleKind, ScalarStyle,
};

/// Rule code for truthy.
pub const CODE: &str = "PL004";

/// Rule id for truthy.
pub const NAME: &str = "truthy";

/// Annotation key holding the normalized boolean of a value.
pub const ANNOTATION: &str = "truthy";

const TRUE_FORMS: &[&str] = &["true", "True", "TRUE", "yes", "Yes", "YES", "on", "On", "ON"];
const FALSE_FORMS: &[&str] = &["false", "False", "FALSE", "no", "No", "NO", "off", "Off", "OFF"];

/// Reads a plain scalar spelling as a boolean, if it looks like one.
#[must_use]
pub fn boolean_value(text: &str) -> Option<bool> {
    if TRUE_FORMS.contains(&text) {
        Some(true)
    } else if FALSE_FORMS.contains(&text) {
        Some(false)
    } else {
        None
    }
}

/// Reads a node as a boolean: plain, untagged scalars only.
#[must_use]
pub fn node_boolean(node: &Node) -> Option<bool> {
    if !node.is_scalar() || node.style != ScalarStyle::Plain || node.tag.is_some() {
        return None;
    }
    boolean_value(node.as_str()?)
}

/// Reports booleans not written as `true`/`false` and rewrites them on fix.
#[derive(Debug, Clone, Default)]
pub struct Truthy;

impl Truthy {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn allowed(options: &RuleConfig) -> Vec<String> {
    options
        .get_str_array("allowed")
        .unwrap_or_else(|| vec!["true".to_string(), "false".to_string()])
}

impl Rule for Truthy {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires booleans to be written as true or false"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fixable
    }

    fn tags(&self) -> &'static [&'static str] {
        &["style"]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar]
    }

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
        let Some(value) = node_boolean(node) else {
            return Ok(Vec::new());
        };
        ctx.annotate(node.id, ANNOTATION, Annotation::Bool(value));

        let text = node.as_str().unwrap_or_default();
        if allowed(ctx.options).iter().any(|a| a == text) {
            return Ok(Vec::new());
        }
        Ok(vec![Match::new(
            node.span,
            format!("truthy value `{text}` should be `{value}`"),
        )
        .fixable()
        .with_help(format!("write `{value}`"))])
    }

    fn fix(
        &self,
        document: &Document,
        finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        let Some(value) = boolean_value(document.span_text(&finding.span)) else {
            return Ok(None);
        };
        Ok(Some(Edit::new(NAME, finding.span, value.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{check, check_with, fix};

    #[test]
    fn test_boolean_value() {
        assert_eq!(boolean_value("yes"), Some(true));
        assert_eq!(boolean_value("OFF"), Some(false));
        assert_eq!(boolean_value("y"), None);
        assert_eq!(boolean_value("maybe"), None);
    }

    #[test]
    fn test_truthy_values() {
        let text = "a: yes\nb: true\nc: 'yes'\nd: !!str on\ne: [No, false]\n";
        let findings = check(Truthy, text);
        let lines: Vec<usize> = findings.iter().map(Finding::line).collect();
        assert_eq!(lines, vec![1, 5]);
        assert_eq!(findings[0].message, "truthy value `yes` should be `true`");
        assert_eq!(findings[1].column(), 5);
    }

    #[test]
    fn test_allowed_option() {
        let config = "[rules.truthy]\nallowed = [\"true\", \"false\", \"on\", \"off\"]\n";
        assert!(check_with(Truthy, "a: on\nb: off\n", config).is_empty());
        assert_eq!(check_with(Truthy, "a: yes\n", config).len(), 1);
    }

    #[test]
    fn test_fix() {
        assert_eq!(
            fix(Truthy, "become: yes  # root\nlist: [On, no]\n"),
            "become: true  # root\nlist: [true, false]\n"
        );
    }
}
