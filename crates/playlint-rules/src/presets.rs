//! Rule presets for common configurations.

use crate::{
    duplicate_key, risky_octal, DocumentStart, DuplicateKey, LineLength, NewLineAtEndOfFile,
    NoTabs, PartialBecome, RiskyOctal, TrailingWhitespace, Truthy,
};
use playlint_core::{ConfigurationError, RuleBox, RuleRegistry};

/// Preset configurations for playlint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Every rule that is enabled by default.
    Recommended,
    /// Every built-in rule, opt-in rules included.
    Strict,
    /// Only rules that catch outright mistakes, for gradual adoption.
    Minimal,
}

impl Preset {
    /// All presets.
    pub const ALL: [Self; 3] = [Self::Recommended, Self::Strict, Self::Minimal];

    /// Name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }

    /// Ids of the rules in this preset.
    #[must_use]
    pub fn rule_ids(self) -> Vec<&'static str> {
        match self {
            Self::Recommended => all_rules()
                .iter()
                .filter(|r| r.enabled_by_default())
                .map(|r| r.id())
                .collect(),
            Self::Strict => all_rules().iter().map(|r| r.id()).collect(),
            Self::Minimal => vec![duplicate_key::NAME, risky_octal::NAME],
        }
    }
}

/// Returns all built-in rules, in code order.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Box::new(DuplicateKey::new()),
        Box::new(TrailingWhitespace::new()),
        Box::new(NoTabs::new()),
        Box::new(Truthy::new()),
        Box::new(LineLength::new()),
        Box::new(DocumentStart::new()),
        Box::new(NewLineAtEndOfFile::new()),
        Box::new(RiskyOctal::new()),
        Box::new(PartialBecome::new()),
    ]
}

/// Builds a registry holding every built-in rule and preset.
///
/// # Errors
///
/// Returns an error if two built-in rules share an id or code.
pub fn builtin_registry() -> Result<RuleRegistry, ConfigurationError> {
    let mut registry = RuleRegistry::new();
    for rule in all_rules() {
        registry.register_shared(rule.into())?;
    }
    for preset in Preset::ALL {
        registry.register_preset(preset.name(), &preset.rule_ids());
    }
    Ok(registry)
}

/// Ids of the rules that are off unless enabled.
#[must_use]
pub fn opt_in_rules() -> Vec<&'static str> {
    all_rules()
        .iter()
        .filter(|r| !r.enabled_by_default())
        .map(|r| r.id())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{document_start, partial_become, truthy};
    use playlint_core::Config;

    #[test]
    fn test_preset_rules() {
        assert_eq!(Preset::Strict.rule_ids().len(), 9);
        assert_eq!(Preset::Recommended.rule_ids().len(), 8);
        assert!(!Preset::Recommended.rule_ids().contains(&document_start::NAME));
        assert_eq!(Preset::Minimal.rule_ids(), ["duplicate-key", "risky-octal"]);
    }

    #[test]
    fn test_builtin_registry_resolves() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.len(), 9);
        let rules = registry.resolve(&Config::default()).unwrap();
        let ids = rules.ids();
        assert_eq!(ids.len(), 8);
        let truthy_at = ids.iter().position(|id| *id == truthy::NAME).unwrap();
        let become_at = ids.iter().position(|id| *id == partial_become::NAME).unwrap();
        assert!(truthy_at < become_at);
    }

    #[test]
    fn test_preset_selection() {
        let registry = builtin_registry().unwrap();
        let config = Config::parse("preset = \"minimal\"\n").unwrap();
        let rules = registry.resolve(&config).unwrap();
        assert_eq!(rules.ids(), ["duplicate-key", "risky-octal"]);
    }

    #[test]
    fn test_codes_are_unique_and_ordered() {
        let codes: Vec<&str> = all_rules().iter().map(|r| r.code()).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(codes, sorted);
    }
}
