//! Rule to limit line length.
//!
//! # Configuration
//!
//! - `max`: maximum number of characters per line (default: 160)
//! - `allow_non_breakable_words`: skip lines whose value is a single word,
//!   such as a long URL (default: true)

use playlint_core::{Match, Rule, RuleContext, RuleError};

/// Rule code for line-length.
pub const CODE: &str = "PL005";

/// Rule id for line-length.
pub const NAME: &str = "line-length";

/// Reports lines longer than the configured maximum.
#[derive(Debug, Clone, Copy)]
pub struct LineLength {
    /// Default maximum line length in characters.
    pub max: usize,
}

impl Default for LineLength {
    fn default() -> Self {
        Self::new()
    }
}

impl LineLength {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { max: 160 }
    }

    /// Sets the default maximum.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }
}

/// Returns true when the content of a line is one unbreakable word,
/// ignoring an item marker and a leading key.
fn is_single_word(line: &str) -> bool {
    let mut rest = line.trim();
    rest = rest.strip_prefix("- ").unwrap_or(rest).trim_start();
    if let Some(i) = rest.find(": ") {
        rest = rest[i + 2..].trim_start();
    }
    !rest.is_empty() && !rest.contains([' ', '\t'])
}

impl Rule for LineLength {
    fn id(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Limits the length of lines"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["formatting"]
    }

    fn check_document(&self, ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
        let fallback = i64::try_from(self.max).unwrap_or(i64::MAX);
        let max = usize::try_from(ctx.options.get_int("max", fallback))
            .map_err(|_| RuleError::failed("option `max` must not be negative"))?;
        let allow_words = ctx.options.get_bool("allow_non_breakable_words", true);

        let mut matches = Vec::new();
        for (number, line) in ctx.document.lines() {
            let length = line.chars().count();
            if length <= max || (allow_words && is_single_word(line)) {
                continue;
            }
            let Some(span) = ctx.document.line_span(number) else {
                continue;
            };
            let cut = line
                .char_indices()
                .nth(max)
                .map_or(line.len(), |(i, _)| i);
            matches.push(Match::new(
                ctx.span(span.start.offset + cut, span.end.offset),
                format!("line too long ({length} > {max} characters)"),
            ));
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{check, check_with};

    #[test]
    fn test_line_length() {
        let long = format!("key: {}\n", "word ".repeat(40));
        let text = format!("short: 1\n{long}");
        let findings = check(LineLength::new(), &text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line(), 2);
        assert_eq!(findings[0].column(), 161);
    }

    #[test]
    fn test_max_option() {
        let config = "[rules.line-length]\nmax = 10\n";
        let findings = check_with(LineLength::new(), "name: hello world\n", config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "line too long (17 > 10 characters)");
        assert_eq!(findings[0].column(), 11);
    }

    #[test]
    fn test_non_breakable_words() {
        let url = format!("url: https://example.com/{}\n", "a".repeat(200));
        assert!(check(LineLength::new(), &url).is_empty());
        let config = "[rules.line-length]\nallow_non_breakable_words = false\n";
        assert_eq!(check_with(LineLength::new(), &url, config).len(), 1);
    }

    #[test]
    fn test_negative_max_is_a_rule_error() {
        let findings = check_with(LineLength::new(), "a: 1\n", "[rules.line-length]\nmax = -1\n");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_rule_error());
    }
}
