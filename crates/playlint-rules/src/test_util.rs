//! Helpers for rule unit tests.

use playlint_core::{
    parse, Config, Engine, Finding, FixSelection, Fixer, Rule, RuleRegistry,
};

fn registry_with<R: Rule + 'static>(rule: R) -> (RuleRegistry, &'static str) {
    let id = rule.id();
    let mut registry = RuleRegistry::new();
    for dependency in rule.dependencies() {
        let builtin = crate::all_rules()
            .into_iter()
            .find(|r| r.id() == *dependency)
            .unwrap();
        registry.register_shared(builtin.into()).unwrap();
    }
    registry.register(rule).unwrap();
    (registry, id)
}

/// Runs one rule over `text` with the given TOML configuration.
pub(crate) fn check_with<R: Rule + 'static>(rule: R, text: &str, config: &str) -> Vec<Finding> {
    let (registry, id) = registry_with(rule);
    let mut config = Config::parse(config).unwrap();
    config.select = vec![id.to_string()];
    let rules = registry.resolve(&config).unwrap();
    let document = parse(text, "test.yml").unwrap();
    Engine::new(&rules).evaluate(&document).unwrap()
}

/// Runs one rule over `text` with default options.
pub(crate) fn check<R: Rule + 'static>(rule: R, text: &str) -> Vec<Finding> {
    check_with(rule, text, "")
}

/// Fixes `text` with one rule until it converges.
pub(crate) fn fix_with<R: Rule + 'static>(rule: R, text: &str, config: &str) -> String {
    let (registry, id) = registry_with(rule);
    let mut config = Config::parse(config).unwrap();
    config.select = vec![id.to_string()];
    let rules = registry.resolve(&config).unwrap();
    let engine = Engine::new(&rules);
    let document = parse(text, "test.yml").unwrap();
    let outcome = Fixer::new(&rules, FixSelection::All)
        .run(document, &engine)
        .unwrap();
    assert!(outcome.converged);
    outcome.document.text().to_string()
}

/// Fixes `text` with one rule and default options.
pub(crate) fn fix<R: Rule + 'static>(rule: R, text: &str) -> String {
    fix_with(rule, text, "")
}
