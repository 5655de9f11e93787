//! Rule to catch file modes written as bare numbers.
//!
//! # Rationale
//!
//! `mode: 644` is read as the decimal integer 644 and `mode: 0644` as an
//! octal integer only by some loaders. Either way the resulting permissions
//! are unpredictable. Quoting the mode (`mode: '0644'`) makes it explicit.
//!
//! # Configuration
//!
//! - `keys`: mapping keys holding file modes (default: `["mode"]`)

use playlint_core::{
    Document, Edit, Finding, Match, Node, NodeKind, Rule, RuleConfig, RuleContext, RuleError,
    RuleKind, ScalarStyle, Severity,
};

/// Rule code for risky-octal.
pub const CODE: &str = "PL008";

/// Rule id for risky-octal.
pub const NAME: &str = "risky-octal";

/// Reports unquoted octal-looking file modes and quotes them on fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskyOctal;

impl RiskyOctal {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_octal_mode(text: &str) -> bool {
    (3..=4).contains(&text.len()) && text.bytes().all(|b| (b'0'..=b'7').contains(&b))
}

fn mode_keys(options: &RuleConfig) -> Vec<String> {
    options
        .get_str_array("keys")
        .unwrap_or_else(|| vec!["mode".to_string()])
}

impl Rule for RiskyOctal {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires file modes to be quoted strings"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fixable
    }

    fn tags(&self) -> &'static [&'static str] {
        &["unpredictability"]
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar]
    }

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
        let Some(key) = node.key_text() else {
            return Ok(Vec::new());
        };
        if node.style != ScalarStyle::Plain || node.tag.is_some() {
            return Ok(Vec::new());
        }
        let value = node.as_str().unwrap_or_default();
        if !is_octal_mode(value) || !mode_keys(ctx.options).iter().any(|k| k == key) {
            return Ok(Vec::new());
        }
        Ok(vec![Match::new(
            node.span,
            format!("`{key}: {value}` is read as a number; quote the mode"),
        )
        .fixable()
        .with_help(format!("write `{key}: '{}'`", quoted_mode(value)))])
    }

    fn fix(
        &self,
        document: &Document,
        finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        let value = document.span_text(&finding.span);
        if !is_octal_mode(value) {
            return Ok(None);
        }
        Ok(Some(Edit::new(
            NAME,
            finding.span,
            format!("'{}'", quoted_mode(value)),
        )))
    }
}

/// Four-digit form of a mode.
fn quoted_mode(value: &str) -> String {
    if value.len() == 3 {
        format!("0{value}")
    } else {
        value.to_string()
    }
}
