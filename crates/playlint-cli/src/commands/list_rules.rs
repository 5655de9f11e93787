//! List rules command implementation.

use playlint_core::RuleKind;
use playlint_rules::{all_rules, Preset};

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<8} {:<26} {:<9} {:<8} Description",
        "Code", "Name", "Severity", "Fix"
    );
    println!("{}", "-".repeat(90));

    for rule in all_rules() {
        let fix = match rule.kind() {
            RuleKind::Fixable => "yes",
            RuleKind::Check => "",
        };
        let opt_in = if rule.enabled_by_default() {
            ""
        } else {
            " (opt-in)"
        };
        println!(
            "{:<8} {:<26} {:<9} {:<8} {}{}",
            rule.code(),
            rule.id(),
            rule.default_severity().to_string(),
            fix,
            rule.description(),
            opt_in
        );
    }

    println!("\nPresets:");
    for preset in Preset::ALL {
        let default = if preset == Preset::Recommended {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<12} - {}{}",
            preset.name(),
            preset.rule_ids().join(", "),
            default
        );
    }

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  playlint check --rules duplicate-key,truthy");
    println!("  playlint check --rules PL001,PL004 --fix");
}
