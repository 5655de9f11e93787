//! Rule to catch `become_user` without `become`.
//!
//! # Rationale
//!
//! `become_user` only takes effect when privilege escalation is switched on
//! with `become: true`, either in the same block or in an enclosing one.
//! Without it the task silently runs as the connecting user.
//!
//! Runs after [`truthy`](crate::truthy) and reads its annotations. When that
//! rule is not enabled the values are read directly.

use crate::truthy::{self, ANNOTATION};
use playlint_core::{Annotation, Match, Node, NodeKind, Rule, RuleContext, RuleError};

/// Rule code for partial-become.
pub const CODE: &str = "PL009";

/// Rule id for partial-become.
pub const NAME: &str = "partial-become";

/// Reports `become_user` entries that are not paired with `become: true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialBecome;

impl PartialBecome {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// The boolean of a `become` entry: annotated by truthy, else read directly.
/// `None` for templated or otherwise non-boolean values.
fn become_value(ctx: &RuleContext<'_>, node: &Node) -> Option<bool> {
    ctx.annotation(node.id, ANNOTATION)
        .and_then(Annotation::as_bool)
        .or_else(|| truthy::node_boolean(node))
}

impl Rule for PartialBecome {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires become: true wherever become_user is set"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["unpredictability"]
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[truthy::NAME]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Mapping]
    }

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
        let document = ctx.document;
        let Some(user) = document.entry(node.id, "become_user") else {
            return Ok(Vec::new());
        };

        let mut scope = Some(node);
        while let Some(mapping) = scope {
            if mapping.is_mapping() {
                if let Some(become_node) = document.entry(mapping.id, "become") {
                    // Anything but an explicit false (templates included) counts as set.
                    if become_value(ctx, become_node) != Some(false) {
                        return Ok(Vec::new());
                    }
                    break;
                }
            }
            scope = document.parent(mapping.id);
        }

        let span = user.key.as_ref().map_or(user.span, |k| k.span);
        Ok(vec![Match::new(
            span,
            "`become_user` has no effect without `become: true`",
        )
        .with_help("add `become: true` next to `become_user`")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::check;

    #[test]
    fn test_become_user_without_become() {
        let text = "- name: a\n  become_user: root\n- name: b\n  become: yes\n  become_user: root\n";
        let findings = check(PartialBecome, text);
        assert_eq!(findings.len(), 1);
        assert_eq!((findings[0].line(), findings[0].column()), (2, 3));
    }

    #[test]
    fn test_explicit_false() {
        let findings = check(PartialBecome, "become: false\nbecome_user: root\n");
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_inherited_from_enclosing_block() {
        let text = "- hosts: all\n  become: true\n  tasks:\n    - name: x\n      become_user: postgres\n";
        assert!(check(PartialBecome, text).is_empty());
    }

    #[test]
    fn test_templated_become_is_trusted() {
        assert!(check(PartialBecome, "become: \"{{ escalate }}\"\nbecome_user: root\n").is_empty());
    }
}
