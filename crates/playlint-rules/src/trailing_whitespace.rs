//! Rule to forbid spaces and tabs at the end of lines.

use playlint_core::{
    Document, Edit, Finding, Match, Rule, RuleConfig, RuleContext, RuleError, RuleKind,
};

/// Rule code for trailing-whitespace.
pub const CODE: &str = "PL002";

/// Rule id for trailing-whitespace.
pub const NAME: &str = "trailing-whitespace";

/// Reports trailing spaces and tabs and removes them on fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingWhitespace;

impl TrailingWhitespace {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for TrailingWhitespace {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids trailing spaces and tabs"
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
            let kept = line.trim_end_matches([' ', '\t']).len();
            if kept == line.len() {
                continue;
            }
            let Some(span) = ctx.document.line_span(number) else {
                continue;
            };
            let start = span.start.offset + kept;
            matches.push(
                Match::new(ctx.span(start, span.end.offset), "trailing whitespace").fixable(),
            );
        }
        Ok(matches)
    }

    fn fix(
        &self,
        _document: &Document,
        finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        Ok(Some(Edit::delete(NAME, finding.span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{check, fix};

    #[test]
    fn test_trailing_whitespace() {
        let findings = check(TrailingWhitespace, "a: 1  \nb: 2\nc: 3\t\n");
        assert_eq!(findings.len(), 2);
        assert_eq!((findings[0].line(), findings[0].column()), (1, 5));
        assert_eq!(findings[0].span.len(), 2);
        assert_eq!(findings[1].line(), 3);
        assert!(findings[0].fixable);
    }

    #[test]
    fn test_crlf_is_not_whitespace() {
        assert!(check(TrailingWhitespace, "a: 1\r\nb: 2\r\n").is_empty());
        assert_eq!(fix(TrailingWhitespace, "a: 1 \r\n"), "a: 1\r\n");
    }

    #[test]
    fn test_fix_keeps_comments() {
        assert_eq!(
            fix(TrailingWhitespace, "a: 1  # note  \n  \nb: 2\n"),
            "a: 1  # note\n\nb: 2\n"
        );
    }
}
