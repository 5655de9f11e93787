//! Rule to require a newline at the end of the file.

use playlint_core::{
    Document, Edit, Finding, Match, Rule, RuleConfig, RuleContext, RuleError, RuleKind,
};

/// Rule code for new-line-at-end-of-file.
pub const CODE: &str = "PL007";

/// Rule id for new-line-at-end-of-file.
pub const NAME: &str = "new-line-at-end-of-file";

/// Reports a missing final newline and appends one on fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewLineAtEndOfFile;

impl NewLineAtEndOfFile {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NewLineAtEndOfFile {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires a newline character at the end of the file"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fixable
    }

    fn tags(&self) -> &'static [&'static str] {
        &["formatting"]
    }

    fn check_document(&self, ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
        let text = ctx.document.text();
        if text.is_empty() || text.ends_with('\n') {
            return Ok(Vec::new());
        }
        let end = text.len();
        Ok(vec![
            Match::new(ctx.span(end, end), "no new line character at the end of file").fixable(),
        ])
    }

    fn fix(
        &self,
        _document: &Document,
        finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        Ok(Some(Edit::insert(NAME, finding.span.start, "\n")))
    }
}
