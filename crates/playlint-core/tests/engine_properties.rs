//! Engine, suppression and fixer behavior with custom rules.

use playlint_core::{
    parse, Config, Document, Edit, Engine, Finding, FixSelection, Fixer, Match, Node, NodeKind,
    Rule, RuleConfig, RuleContext, RuleError, RuleKind, RuleRegistry, RULE_ERROR,
};

const INVENTORY: &str = include_str!("fixtures/inventory.yml");

/// Flags every scalar equal to `TODO` and replaces it with `done`.
struct NoTodo;

impl Rule for NoTodo {
    fn id(&self) -> &'static str {
        "no-todo"
    }

    fn code(&self) -> &'static str {
        "T001"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fixable
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar]
    }

    fn check_node(&self, _ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
        if node.as_str() == Some("TODO") {
            return Ok(vec![Match::new(node.span, "unfinished value").fixable()]);
        }
        Ok(Vec::new())
    }

    fn fix(
        &self,
        _document: &Document,
        finding: &Finding,
        _options: &RuleConfig,
    ) -> Result<Option<Edit>, RuleError> {
        Ok(Some(Edit::new("no-todo", finding.span, "done")))
    }
}

/// Flags every key under `vars`.
struct VarsKeys;

impl Rule for VarsKeys {
    fn id(&self) -> &'static str {
        "vars-keys"
    }

    fn code(&self) -> &'static str {
        "T002"
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar]
    }

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: &Node) -> Result<Vec<Match>, RuleError> {
        match &node.key {
            Some(key) if ctx.document.is_nested_under(node.id, "vars") => {
                Ok(vec![Match::new(key.span, format!("variable `{}`", key.text))])
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Fails on every document.
struct Broken;

impl Rule for Broken {
    fn id(&self) -> &'static str {
        "broken"
    }

    fn code(&self) -> &'static str {
        "T003"
    }

    fn check_document(&self, _ctx: &mut RuleContext<'_>) -> Result<Vec<Match>, RuleError> {
        Err(RuleError::failed("cannot evaluate"))
    }
}

fn registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register(NoTodo).unwrap();
    registry.register(VarsKeys).unwrap();
    registry
}

fn evaluate(registry: &RuleRegistry, text: &str) -> Vec<Finding> {
    let rules = registry.resolve(&Config::default()).unwrap();
    let document = parse(text, "inventory.yml").unwrap();
    Engine::new(&rules).evaluate(&document).unwrap()
}

#[test]
fn round_trip_preserves_text() {
    for text in [
        INVENTORY,
        "",
        "# only a comment",
        "a: 1\r\nb: [x, y]\r\n",
        "---\nkey: |\n  keep\n\n  this\n...\n---\nother: {a: 1}\n",
    ] {
        let document = parse(text, "rt.yml").unwrap();
        assert_eq!(document.serialize(), text);
    }
}

#[test]
fn findings_are_deterministic_and_ordered() {
    let registry = registry();
    let first = evaluate(&registry, INVENTORY);
    let second = evaluate(&registry, INVENTORY);
    assert_eq!(first, second);

    let keys: Vec<_> = first.iter().map(Finding::sort_key).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn failing_rule_is_isolated() {
    let mut registry = registry();
    registry.register(Broken).unwrap();
    let findings = evaluate(&registry, INVENTORY);

    let failures: Vec<&Finding> = findings.iter().filter(|f| f.rule == RULE_ERROR).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("cannot evaluate"));
    assert!(findings.iter().any(|f| f.rule == "no-todo"));
    assert!(findings.iter().any(|f| f.rule == "vars-keys"));
}

#[test]
fn block_directives_scope_suppression() {
    let text = "\
vars:
  # playlint: disable(vars-keys)
  a: TODO
  b: 2
  # playlint: enable
  c: 3
";
    let findings = evaluate(&registry(), text);
    let located: Vec<(&str, usize)> = findings.iter().map(|f| (f.rule.as_str(), f.line())).collect();
    assert_eq!(located, [("no-todo", 3), ("vars-keys", 6)]);
}

#[test]
fn fixer_applies_disjoint_edits_and_settles() {
    let registry = registry();
    let rules = registry.resolve(&Config::default()).unwrap();
    let engine = Engine::new(&rules);
    let document = parse(INVENTORY, "inventory.yml").unwrap();
    let findings = engine.evaluate(&document).unwrap();

    let fixer = Fixer::new(&rules, FixSelection::All);
    let pass = fixer.apply(&document, &findings).unwrap();
    assert_eq!(pass.applied.len(), 2);
    for (i, a) in pass.applied.iter().enumerate() {
        for b in &pass.applied[i + 1..] {
            assert!(!a.span.overlaps(&b.span));
        }
    }

    let outcome = fixer.run(document, &engine).unwrap();
    assert!(outcome.converged);
    assert!(outcome.pending.is_empty());
    assert!(!outcome.document.text().contains("TODO"));

    let again = fixer.run(outcome.document.clone(), &engine).unwrap();
    assert!(!again.changed());
    assert_eq!(again.document.text(), outcome.document.text());
}
