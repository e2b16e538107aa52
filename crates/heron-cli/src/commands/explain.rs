//! Explain command - provides detailed explanation of a rule

use clap::Args;
use colored::Colorize;
use heron_core::analysis::AnalysisEngine;
use heron_core::config::load_config_or_default_with_warnings;
use heron_core::rules::{RuleCategory, Severity};
use std::env;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(
        value_name = "RULE_ID",
        help = "Rule ID or name to explain (e.g., \"A001\", \"img-alt\")"
    )]
    pub rule_id: String,
}

impl ExplainArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        let config = load_config_or_default_with_warnings(&cwd).config;
        let engine = AnalysisEngine::with_config(&config);
        let registry = engine.registry();

        match registry.get_rule(&self.rule_id) {
            Some(rule) => {
                let metadata = rule.metadata();

                println!();
                println!("{}", format!("Rule {}", metadata.id).bold());
                println!();
                println!("  {}: {}", "Name".cyan(), metadata.name);
                println!("  {}: {}", "Description".cyan(), metadata.description);
                println!(
                    "  {}: {}",
                    "Category".cyan(),
                    format_category(metadata.category)
                );
                println!(
                    "  {}: {}",
                    "Severity".cyan(),
                    format_severity(metadata.severity)
                );
                if !metadata.wcag.is_empty() {
                    println!("  {}: {}", "WCAG".cyan(), metadata.wcag.join(", "));
                }
                println!();

                Ok(())
            }
            None => {
                eprintln!(
                    "{} Unknown rule '{}'",
                    "error:".red().bold(),
                    self.rule_id
                );
                eprintln!();
                eprintln!("Available rules:");
                for rule in registry.rules() {
                    let meta = rule.metadata();
                    eprintln!("  {} ({})", meta.id, meta.name);
                }
                std::process::exit(1);
            }
        }
    }
}

fn format_category(category: RuleCategory) -> &'static str {
    match category {
        RuleCategory::Structure => "structure",
        RuleCategory::Interaction => "interaction",
    }
}

fn format_severity(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".red().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".blue().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use heron_core::analysis::AnalysisEngine;

    #[test]
    fn explain_known_rule_returns_metadata() {
        let engine = AnalysisEngine::new();
        let registry = engine.registry();

        let rule = registry.get_rule("A001");
        assert!(rule.is_some(), "A001 rule should exist");

        let metadata = rule.unwrap().metadata();
        assert_eq!(metadata.id, "A001");
        assert_eq!(metadata.name, "img-alt");
        assert!(!metadata.description.is_empty());
    }

    #[test]
    fn explain_rule_by_name() {
        let engine = AnalysisEngine::new();
        let registry = engine.registry();

        let rule = registry.get_rule("img-alt");
        assert!(rule.is_some(), "rules resolve by name too");
        assert_eq!(rule.unwrap().metadata().id, "A001");
    }

    #[test]
    fn explain_unknown_rule_returns_none() {
        let engine = AnalysisEngine::new();
        assert!(engine.registry().get_rule("A999").is_none());
    }

    #[test]
    fn every_builtin_rule_cites_wcag_criteria() {
        let engine = AnalysisEngine::new();
        for rule in engine.registry().rules() {
            assert!(
                !rule.metadata().wcag.is_empty(),
                "{} should cite at least one WCAG criterion",
                rule.metadata().id
            );
        }
    }
}
