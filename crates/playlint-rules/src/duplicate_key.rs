//! Rule to forbid repeated keys in one mapping.
//!
//! # Rationale
//!
//! When a key appears twice, most loaders silently keep the last value, so
//! the first entry is dead configuration that still looks live.
//!
//! # Suppression
//!
//! - `# playlint: allow(duplicate-key) reason="..."` on or above the key

use playlint_core::{Match, Node, NodeKind, Rule, RuleContext, RuleError, Severity};
use std::collections::HashMap;

/// Rule code for duplicate-key.
pub const CODE: &str = "PL001";

/// Rule id for duplicate-key.
pub const NAME: &str = "duplicate-key";

/// Reports every repeated occurrence of a mapping key.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateKey;

impl DuplicateKey {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for DuplicateKey {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids keys that appear more than once in a mapping"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn tags(&self) -> &'static [&'static str] {
        &["syntax"]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Mapping]
    }

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
        let mut first_line: HashMap<&str, usize> = HashMap::new();
        let mut matches = Vec::new();
        for child in ctx.document.children(node.id) {
            let Some(key) = &child.key else {
                continue;
            };
            match first_line.get(key.text.as_str()) {
                Some(line) => matches.push(
                    Match::new(
                        key.span,
                        format!("duplicate key `{}` (first defined on line {line})", key.text),
                    )
                    .with_help("remove or rename one of the entries"),
                ),
                None => {
                    first_line.insert(key.text.as_str(), key.span.start.line);
                }
            }
        }
        Ok(matches)
    }
}
