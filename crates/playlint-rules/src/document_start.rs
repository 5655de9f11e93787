//! Rule to require an explicit `---` document start marker.
//!
//! Disabled by default; enable it with `enable = ["document-start"]`.

use playlint_core::{
    Document, Edit, Finding, Match, Rule, RuleConfig, RuleContext, RuleError, RuleKind, Severity,
};

/// Rule code for document-start.
pub const CODE: &str = "PL006";

/// Rule id for document-start.
pub const NAME: &str = "document-start";

/// Reports files whose first document lacks a `---` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStart;

impl DocumentStart {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Line number of the first line that is not blank, a comment or a
/// `%` directive, and whether it is a `---` marker.
fn first_content_line(document: &Document) -> Option<(usize, bool)> {
    document.lines().find_map(|(number, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || line.starts_with('%') {
            return None;
        }
        let marker = line
            .strip_prefix("---")
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']));
        Some((number, marker))
    })
}

impl Rule for DocumentStart {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a --- marker at the start of the document"
    }

    fn default_severity(&self) -> Severity {
        Severity::Info
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fixable
    }

    fn tags(&self) -> &'static [&'static str] {
        &["formatting"]
    }

    fn enabled_by_default(&self) -> bool {
        false
    }

    fn check_document(&self, ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
        match first_content_line(ctx.document) {
            Some((number, false)) => {
                let Some(span) = ctx.document.line_span(number) else {
                    return Ok(Vec::new());
                };
                let at = span.start.offset;
                Ok(vec![
                    Match::new(ctx.span(at, at), "missing document start `---`").fixable(),
                ])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn fix(
        &self,
        _document: &Document,
        finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        Ok(Some(Edit::insert(NAME, finding.span.start, "---\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{check, fix};

    #[test]
    fn test_missing_marker() {
        let findings = check(DocumentStart, "# header\n\na: 1\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line(), 3);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_present_marker_and_empty_file() {
        assert!(check(DocumentStart, "# header\n--- # start\na: 1\n").is_empty());
        assert!(check(DocumentStart, "%YAML 1.2\n---\na: 1\n").is_empty());
        assert!(check(DocumentStart, "# only a comment\n").is_empty());
        assert!(check(DocumentStart, "").is_empty());
    }

    #[test]
    fn test_fix_inserts_after_header_comments() {
        assert_eq!(fix(DocumentStart, "# header\na: 1\n"), "# header\n---\na: 1\n");
    }
}
