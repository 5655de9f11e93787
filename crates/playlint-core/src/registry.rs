//! Explicitly constructed rule registry and rule-set resolution.

use crate::config::{Config, RuleConfig};
use crate::error::ConfigurationError;
use crate::rule::{Rule, RuleRef};
use crate::types::Severity;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Holds every available rule and the named presets over them.
///
/// A registry is built once at startup and passed by reference to whatever
/// needs it; there is no process-wide catalog.
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<RuleRef>,
    presets: BTreeMap<String, Vec<String>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .field("presets", &self.presets)
            .finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateRule`] if the rule's id or code
    /// collides with an already registered rule.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> Result<(), ConfigurationError> {
        self.register_shared(Arc::new(rule))
    }

    /// Registers an already shared rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateRule`] on an id or code clash.
    pub fn register_shared(&mut self, rule: RuleRef) -> Result<(), ConfigurationError> {
        let names = [rule.id(), rule.code()];
        if let Some(clash) = self
            .rules
            .iter()
            .flat_map(|r| [r.id(), r.code()])
            .find(|existing| names.contains(existing))
        {
            return Err(ConfigurationError::DuplicateRule {
                id: clash.to_string(),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Registers a named preset listing rule ids.
    pub fn register_preset(&mut self, name: impl Into<String>, ids: &[&str]) {
        self.presets
            .insert(name.into(), ids.iter().map(|s| (*s).to_string()).collect());
    }

    /// All registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[RuleRef] {
        &self.rules
    }

    /// Looks up a rule by id or code.
    #[must_use]
    pub fn get(&self, id_or_code: &str) -> Option<&RuleRef> {
        self.rules
            .iter()
            .find(|r| r.id() == id_or_code || r.code() == id_or_code)
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the registered presets.
    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Rule ids of a preset.
    #[must_use]
    pub fn preset(&self, name: &str) -> Option<&[String]> {
        self.presets.get(name).map(Vec::as_slice)
    }

    /// Resolves the ordered set of enabled rules for a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for unknown dependencies, dependency
    /// cycles, and configuration entries naming unknown rules or presets.
    pub fn resolve(&self, config: &Config) -> Result<ResolvedRules, ConfigurationError> {
        self.check_dependencies()?;
        self.check_references(config)?;

        let mut enabled: BTreeSet<usize> = if !config.select.is_empty() {
            self.matching(config.select.as_slice())
        } else if let Some(name) = &config.preset {
            let ids = self
                .presets
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownPreset { name: name.clone() })?;
            self.matching(ids.as_slice())
        } else {
            self.indices()
                .filter(|&i| self.rules[i].enabled_by_default())
                .collect()
        };

        let explicit = |want: bool| {
            self.indices().filter(move |&i| {
                self.rule_config(config, i).and_then(|c| c.enabled) == Some(want)
            })
        };
        let disabled: Vec<usize> = self
            .matching(config.disable.as_slice())
            .into_iter()
            .chain(explicit(false))
            .collect();
        for i in disabled {
            enabled.remove(&i);
        }
        enabled.extend(self.matching(config.enable.as_slice()));
        enabled.extend(explicit(true));

        let rules: Vec<ResolvedRule> = self
            .topological(&enabled)
            .into_iter()
            .map(|i| {
                let rule = Arc::clone(&self.rules[i]);
                let options = self.rule_config(config, i).cloned().unwrap_or_default();
                let severity = options.severity.unwrap_or_else(|| rule.default_severity());
                ResolvedRule {
                    rule,
                    severity,
                    options,
                }
            })
            .collect();
        debug!(
            rules = ?rules.iter().map(ResolvedRule::id).collect::<Vec<_>>(),
            "resolved rule set"
        );
        Ok(ResolvedRules { rules })
    }

    fn indices(&self) -> std::ops::Range<usize> {
        0..self.rules.len()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id() == id)
    }

    fn matching<S: AsRef<str>>(&self, selectors: &[S]) -> BTreeSet<usize> {
        self.indices()
            .filter(|&i| {
                selectors
                    .iter()
                    .any(|s| self.rules[i].matches_selector(s.as_ref()))
            })
            .collect()
    }

    fn rule_config<'c>(&self, config: &'c Config, index: usize) -> Option<&'c RuleConfig> {
        let rule = &self.rules[index];
        config
            .rules
            .get(rule.id())
            .or_else(|| config.rules.get(rule.code()))
    }

    fn check_references(&self, config: &Config) -> Result<(), ConfigurationError> {
        let mut keys: Vec<&String> = config.rules.keys().collect();
        keys.sort();
        for key in keys {
            if self.get(key).is_none() {
                return Err(ConfigurationError::UnknownRule { id: key.clone() });
            }
        }
        let presets = config
            .preset
            .as_ref()
            .and_then(|p| self.presets.get(p))
            .into_iter()
            .flatten();
        for selector in config
            .select
            .iter()
            .chain(&config.enable)
            .chain(&config.disable)
            .chain(presets)
        {
            if !self.rules.iter().any(|r| r.matches_selector(selector)) {
                return Err(ConfigurationError::UnknownRule {
                    id: selector.clone(),
                });
            }
        }
        Ok(())
    }

    /// Rejects unknown dependency ids and dependency cycles.
    fn check_dependencies(&self) -> Result<(), ConfigurationError> {
        let mut order: Vec<usize> = self.indices().collect();
        order.sort_by_key(|&i| self.rules[i].id());

        for &i in &order {
            let rule = &self.rules[i];
            if let Some(missing) = rule
                .dependencies()
                .iter()
                .find(|dep| self.index_of(dep).is_none())
            {
                return Err(ConfigurationError::UnknownDependency {
                    rule: rule.id().to_string(),
                    dependency: (*missing).to_string(),
                });
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }
        let mut marks = vec![Mark::New; self.rules.len()];
        for &start in &order {
            if marks[start] != Mark::New {
                continue;
            }
            // Iterative DFS; `path` holds the active chain for cycle reporting.
            let mut path = vec![start];
            let mut cursors = vec![0usize];
            marks[start] = Mark::Active;
            while let Some(&node) = path.last() {
                let deps = self.rules[node].dependencies();
                let cursor = cursors.last_mut().map_or(usize::MAX, |c| {
                    *c += 1;
                    *c - 1
                });
                let Some(dep) = deps.get(cursor).and_then(|d| self.index_of(d)) else {
                    marks[node] = Mark::Done;
                    path.pop();
                    cursors.pop();
                    continue;
                };
                match marks[dep] {
                    Mark::Done => {}
                    Mark::New => {
                        marks[dep] = Mark::Active;
                        path.push(dep);
                        cursors.push(0);
                    }
                    Mark::Active => {
                        let from = path.iter().position(|&n| n == dep).unwrap_or(0);
                        let mut names: Vec<&str> =
                            path[from..].iter().map(|&n| self.rules[n].id()).collect();
                        names.push(self.rules[dep].id());
                        return Err(ConfigurationError::DependencyCycle {
                            cycle: names.join(" -> "),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Orders the enabled rules so dependencies run first, breaking ties by id.
    fn topological(&self, enabled: &BTreeSet<usize>) -> Vec<usize> {
        let mut pending: HashMap<usize, usize> = HashMap::new();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
        for &i in enabled {
            let deps: Vec<usize> = self.rules[i]
                .dependencies()
                .iter()
                .filter_map(|d| self.index_of(d))
                .filter(|d| enabled.contains(d))
                .collect();
            pending.insert(i, deps.len());
            for d in deps {
                dependents.entry(d).or_default().push(i);
            }
        }
        let mut ready: BTreeSet<(&str, usize)> = pending
            .iter()
            .filter(|(_, &n)| n == 0)
            .map(|(&i, _)| (self.rules[i].id(), i))
            .collect();
        let mut order = Vec::with_capacity(enabled.len());
        while let Some(next) = ready.pop_first() {
            let (_, i) = next;
            order.push(i);
            for &dependent in dependents.get(&i).map(Vec::as_slice).unwrap_or_default() {
                if let Some(n) = pending.get_mut(&dependent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert((self.rules[dependent].id(), dependent));
                    }
                }
            }
        }
        order
    }
}

/// A rule selected for a run, with its effective severity and options.
#[derive(Clone)]
pub struct ResolvedRule {
    /// The rule implementation.
    pub rule: RuleRef,
    /// Effective severity (override or default).
    pub severity: Severity,
    /// Options from `[rules.<id>]`.
    pub options: RuleConfig,
}

impl ResolvedRule {
    /// Id of the rule.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.rule.id()
    }
}

impl std::fmt::Debug for ResolvedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedRule")
            .field("id", &self.rule.id())
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// The ordered, immutable rule set of a run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRules {
    rules: Vec<ResolvedRule>,
}

impl ResolvedRules {
    /// Iterates over the rules in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedRule> {
        self.rules.iter()
    }

    /// Rule ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(ResolvedRule::id).collect()
    }

    /// Looks up a resolved rule by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResolvedRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    /// Number of enabled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResolvedRules {
    type Item = &'a ResolvedRule;
    type IntoIter = std::slice::Iter<'a, ResolvedRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
