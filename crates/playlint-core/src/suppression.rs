//! Inline suppression directives.
//!
//! Supported directives, all written in `#` comments:
//! ```text
//! key: yes  # noqa
//! key: yes  # noqa: truthy, PL005
//! # playlint: allow(truthy) reason="legacy inventory"
//! # playlint: disable(line-length)
//! # playlint: enable
//! ```
//!
//! A directive trailing code on line L covers line L. A directive alone on
//! line L covers L and L + 1. `disable` opens a block that runs until the
//! matching `enable` (or the end of the file).

use crate::document::{Document, ScalarStyle};
use crate::parser::scan::find_comment;
use std::collections::BTreeSet;

/// Rules named by a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSet {
    /// Every rule.
    All,
    /// Rules by id or code.
    Rules(BTreeSet<String>),
}

impl RuleSet {
    fn parse(list: &str) -> Self {
        let rules: BTreeSet<String> = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if rules.is_empty() || rules.contains("all") || rules.contains("*") {
            Self::All
        } else {
            Self::Rules(rules)
        }
    }

    /// Returns true if the set names the rule by id or code.
    #[must_use]
    pub fn covers(&self, rule: &str, code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Rules(rules) => rules.contains(rule) || rules.contains(code),
        }
    }
}

/// Kind of a parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `# noqa[: ids]`.
    Noqa,
    /// `# playlint: allow(ids) [reason="..."]`.
    Allow {
        /// Reason given for the allowance.
        reason: Option<String>,
    },
    /// `# playlint: disable[(ids)]`.
    Disable,
    /// `# playlint: enable[(ids)]`.
    Enable,
}

/// A directive found in a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive kind.
    pub kind: DirectiveKind,
    /// Rules the directive names.
    pub rules: RuleSet,
}

/// Parses a directive from comment text (without the leading `#`).
#[must_use]
pub fn parse_directive(comment: &str) -> Option<Directive> {
    let comment = comment.trim();
    if let Some(rest) = comment.strip_prefix("noqa") {
        let rules = match rest.trim_start().strip_prefix(':') {
            Some(list) => RuleSet::parse(list),
            None if rest.is_empty() || rest.starts_with(char::is_whitespace) => RuleSet::All,
            None => return None,
        };
        return Some(Directive {
            kind: DirectiveKind::Noqa,
            rules,
        });
    }

    let body = comment.strip_prefix("playlint:")?.trim();
    let (word, rest) = body
        .find(|c: char| c == '(' || c.is_whitespace())
        .map_or((body, ""), |i| (&body[..i], &body[i..]));
    let (rules, rest) = match rest.trim_start().strip_prefix('(') {
        Some(inner) => {
            let close = inner.find(')')?;
            (RuleSet::parse(&inner[..close]), inner[close + 1..].trim())
        }
        None => (RuleSet::All, rest.trim()),
    };
    let kind = match word {
        "allow" => {
            if rules == RuleSet::All && !body.contains('(') {
                return None;
            }
            DirectiveKind::Allow {
                reason: parse_reason(rest),
            }
        }
        "disable" => DirectiveKind::Disable,
        "enable" => DirectiveKind::Enable,
        _ => return None,
    };
    Some(Directive { kind, rules })
}

fn parse_reason(rest: &str) -> Option<String> {
    let value = rest.strip_prefix("reason")?.trim_start().strip_prefix('=')?.trim_start();
    let inner = value.strip_prefix('"')?;
    let end = inner.find('"')?;
    let reason = inner[..end].trim();
    (!reason.is_empty()).then(|| reason.to_string())
}

/// Why a finding was suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    /// Line of the suppressing directive.
    pub directive_line: usize,
    /// The directive kind that matched.
    pub kind: DirectiveKind,
}

impl Suppression {
    /// Returns true for an `allow` directive without a reason.
    #[must_use]
    pub fn lacks_reason(&self) -> bool {
        matches!(self.kind, DirectiveKind::Allow { reason: None })
    }
}

#[derive(Debug, Clone)]
struct LineDirective {
    line: usize,
    last_line: usize,
    directive: Directive,
}

#[derive(Debug, Clone)]
struct Block {
    start: usize,
    end: usize,
    rules: RuleSet,
}

/// All suppression directives of one document.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    lines: Vec<LineDirective>,
    blocks: Vec<Block>,
}

impl Suppressions {
    /// Collects the directives of a document. Lines inside block scalars and
    /// multi-line quoted scalars are content, not comments, and are skipped.
    /// On the line closing a quoted scalar only the text after the quote is
    /// scanned.
    #[must_use]
    pub fn parse(document: &Document) -> Self {
        let mut scalar_lines: Vec<(usize, usize)> = Vec::new();
        let mut resume_at: Vec<(usize, usize)> = Vec::new();
        for node in document.nodes() {
            let span = node.span;
            match node.style {
                ScalarStyle::Literal | ScalarStyle::Folded => {
                    scalar_lines.push((span.start.line + 1, span.end.line));
                }
                ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted
                    if span.end.line > span.start.line =>
                {
                    scalar_lines.push((span.start.line + 1, span.end.line - 1));
                    resume_at.push((span.end.line, span.end.column.saturating_sub(1)));
                }
                _ => {}
            }
        }

        let mut found = Self::default();
        let mut open: Vec<(usize, RuleSet)> = Vec::new();
        for (number, line) in document.lines() {
            if scalar_lines
                .iter()
                .any(|(from, to)| (*from..=*to).contains(&number))
            {
                continue;
            }
            let skip = resume_at
                .iter()
                .find(|(at_line, _)| *at_line == number)
                .map_or(0, |(_, column)| *column);
            let Some(text) = line.get(skip..) else {
                continue;
            };
            let Some(at) = find_comment(text) else {
                continue;
            };
            let Some(directive) = parse_directive(&text[at + 1..]) else {
                continue;
            };
            let standalone = skip == 0 && text[..at].trim().is_empty();
            match directive.kind {
                DirectiveKind::Disable => open.push((number, directive.rules)),
                DirectiveKind::Enable => {
                    let mut still_open = Vec::new();
                    for (start, rules) in open.drain(..) {
                        found.blocks.push(Block {
                            start,
                            end: number.saturating_sub(1),
                            rules: rules.clone(),
                        });
                        match (&rules, &directive.rules) {
                            (RuleSet::Rules(active), RuleSet::Rules(closing)) => {
                                let remaining: BTreeSet<String> =
                                    active.difference(closing).cloned().collect();
                                if !remaining.is_empty() {
                                    still_open.push((number + 1, RuleSet::Rules(remaining)));
                                }
                            }
                            // Re-enabling single rules cannot narrow a blanket disable.
                            (RuleSet::All, RuleSet::Rules(_)) => {
                                still_open.push((number + 1, RuleSet::All));
                            }
                            _ => {}
                        }
                    }
                    open = still_open;
                }
                DirectiveKind::Noqa | DirectiveKind::Allow { .. } => {
                    found.lines.push(LineDirective {
                        line: number,
                        last_line: if standalone { number + 1 } else { number },
                        directive,
                    });
                }
            }
        }
        for (start, rules) in open {
            found.blocks.push(Block {
                start,
                end: usize::MAX,
                rules,
            });
        }
        found
    }

    /// Returns true if the document has no directives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.blocks.is_empty()
    }

    /// Checks whether a finding of `rule`/`code` starting on `line` is
    /// suppressed, and by what.
    #[must_use]
    pub fn check(&self, line: usize, rule: &str, code: &str) -> Option<Suppression> {
        let inline = self.lines.iter().find(|d| {
            (d.line..=d.last_line).contains(&line) && d.directive.rules.covers(rule, code)
        });
        if let Some(d) = inline {
            return Some(Suppression {
                directive_line: d.line,
                kind: d.directive.kind.clone(),
            });
        }
        self.blocks
            .iter()
            .find(|b| (b.start..=b.end).contains(&line) && b.rules.covers(rule, code))
            .map(|b| Suppression {
                directive_line: b.start,
                kind: DirectiveKind::Disable,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn suppressions(text: &str) -> Suppressions {
        Suppressions::parse(&parse(text, "t.yml").unwrap())
    }

    #[test]
    fn test_parse_noqa() {
        assert_eq!(parse_directive(" noqa").unwrap().rules, RuleSet::All);
        let d = parse_directive(" noqa: truthy, PL005").unwrap();
        assert!(d.rules.covers("truthy", "PL004"));
        assert!(d.rules.covers("line-length", "PL005"));
        assert!(!d.rules.covers("no-tabs", "PL003"));
        assert!(parse_directive(" noqaz").is_none());
    }

    #[test]
    fn test_parse_allow_with_reason() {
        let d = parse_directive(" playlint: allow(risky-octal) reason=\"set by installer\"").unwrap();
        assert_eq!(
            d.kind,
            DirectiveKind::Allow {
                reason: Some("set by installer".to_string())
            }
        );
        let d = parse_directive("playlint: allow(all)").unwrap();
        assert_eq!(d.rules, RuleSet::All);
        assert_eq!(d.kind, DirectiveKind::Allow { reason: None });
        assert!(parse_directive("playlint: allow").is_none());
    }

    #[test]
    fn test_parse_blocks() {
        assert_eq!(
            parse_directive("playlint: disable").unwrap().kind,
            DirectiveKind::Disable
        );
        let d = parse_directive("playlint: enable(truthy)").unwrap();
        assert_eq!(d.kind, DirectiveKind::Enable);
        assert!(d.rules.covers("truthy", "PL004"));
        assert!(parse_directive("playlint: frobnicate").is_none());
        assert!(parse_directive("just a comment").is_none());
    }

    #[test]
    fn trailing_directive_covers_its_line_only() {
        let s = suppressions("a: yes  # noqa: truthy\nb: yes\n");
        assert!(s.check(1, "truthy", "PL004").is_some());
        assert!(s.check(2, "truthy", "PL004").is_none());
        assert!(s.check(1, "line-length", "PL005").is_none());
    }

    #[test]
    fn standalone_directive_covers_next_line() {
        let s = suppressions("# noqa: truthy\nb: yes\nc: yes\n");
        assert!(s.check(2, "truthy", "PL004").is_some());
        assert!(s.check(3, "truthy", "PL004").is_none());
    }

    #[test]
    fn blocks_run_until_enable_or_eof() {
        let text = "a: 1\n# playlint: disable(truthy)\nb: yes\n# playlint: enable\nc: yes\n# playlint: disable\nd: yes\n";
        let s = suppressions(text);
        assert!(s.check(1, "truthy", "PL004").is_none());
        assert!(s.check(3, "truthy", "PL004").is_some());
        assert!(s.check(3, "no-tabs", "PL003").is_none());
        assert!(s.check(5, "truthy", "PL004").is_none());
        assert!(s.check(7, "no-tabs", "PL003").is_some());
    }

    #[test]
    fn partial_enable_keeps_other_rules_disabled() {
        let text = "# playlint: disable(truthy, no-tabs)\na: 1\n# playlint: enable(truthy)\nb: 2\n";
        let s = suppressions(text);
        assert!(s.check(4, "truthy", "PL004").is_none());
        assert!(s.check(4, "no-tabs", "PL003").is_some());
    }

    #[test]
    fn hash_inside_quotes_and_block_scalars_is_not_a_directive() {
        let text = "a: 'x # noqa'\nb: |\n  # noqa\n  text\n";
        let s = suppressions(text);
        assert!(s.is_empty());
    }

    #[test]
    fn hash_inside_multiline_quoted_scalars_is_not_a_directive() {
        let text = "a: \"x\n  # noqa\n  y\"\nb: bad\nc: 'p\n  # playlint: disable\n  q'\nd: bad\n";
        let s = suppressions(text);
        assert!(s.is_empty());
        assert!(s.check(4, "truthy", "PL004").is_none());
        assert!(s.check(8, "truthy", "PL004").is_none());
    }

    #[test]
    fn directive_after_closing_quote_still_applies() {
        let s = suppressions("a: \"x\n  y\"  # noqa: truthy\nb: yes\n");
        assert!(s.check(2, "truthy", "PL004").is_some());
        assert!(s.check(3, "truthy", "PL004").is_none());
    }

    #[test]
    fn allow_without_reason_is_flagged() {
        let s = suppressions("# playlint: allow(duplicate-key)\nk: 1\n");
        let hit = s.check(2, "duplicate-key", "PL001").unwrap();
        assert!(hit.lacks_reason());
        assert_eq!(hit.directive_line, 1);
    }
}
