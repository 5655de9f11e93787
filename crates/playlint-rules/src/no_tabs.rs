//! Rule to forbid tab characters in indentation.
//!
//! # Configuration
//!
//! - `indent_width`: spaces written for each tab on fix (default: 2)

use playlint_core::{
    Document, Edit, Finding, Match, Rule, RuleConfig, RuleContext, RuleError, RuleKind,
};

/// Rule code for no-tabs.
pub const CODE: &str = "PL003";

/// Rule id for no-tabs.
pub const NAME: &str = "no-tabs";

/// Reports indentation containing tabs and expands them to spaces on fix.
#[derive(Debug, Clone, Copy)]
pub struct NoTabs {
    /// Default number of spaces per tab.
    pub indent_width: usize,
}

impl Default for NoTabs {
    fn default() -> Self {
        Self::new()
    }
}

impl NoTabs {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { indent_width: 2 }
    }

    fn width(&self, options: &RuleConfig) -> usize {
        let fallback = i64::try_from(self.indent_width).unwrap_or(2);
        usize::try_from(options.get_int("indent_width", fallback)).unwrap_or(self.indent_width)
    }
}

impl Rule for NoTabs {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids tab characters in indentation"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fixable
    }

    fn tags(&self) -> &'static [&'static str] {
        &["formatting"]
    }

    fn check_document(&self, ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
        let mut matches = Vec::new();
        for (number, line) in ctx.document.lines() {
            let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
            if !line[..indent].contains('\t') {
                continue;
            }
            let Some(span) = ctx.document.line_span(number) else {
                continue;
            };
            let start = span.start.offset;
            matches.push(
                Match::new(ctx.span(start, start + indent), "tab character in indentation")
                    .fixable()
                    .with_help("indent with spaces"),
            );
        }
        Ok(matches)
    }

    fn fix(
        &self,
        document: &Document,
        finding: &Finding,
        options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        let spaces = " ".repeat(self.width(options));
        let expanded = document.span_text(&finding.span).replace('\t', &spaces);
        Ok(Some(Edit::new(NAME, finding.span, expanded)))
    }
}
