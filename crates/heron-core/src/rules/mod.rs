//! Rule system for accessibility analysis
//!
//! Every check implements the one `Rule` contract. The framework invokes
//! each registered rule with the best-available context (a full merged page
//! when the background builder has one, else a single file's behavior
//! collection) and concatenates the results. Identical inputs yield
//! identical issue sets in identical order.

pub mod interaction;
pub mod structure;

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::error;

use crate::behavior::BehaviorCollection;
use crate::config::RulesConfig;
use crate::confidence::ConfidenceReport;
use crate::diagnostic::Issue;
use crate::merge::MergedDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 3,
            Severity::Warning => 2,
            Severity::Info => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Checks over markup structure and naming.
    Structure,
    /// Checks over observed behavior and its wiring to markup.
    Interaction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    /// WCAG success criteria this rule enforces.
    pub wcag: &'static [&'static str],
}

/// Best-available input for one rule invocation. Rules must handle either
/// variant and self-skip when a variant lacks what they need; an absent
/// optional resource is never a fault.
pub enum RuleContext<'a> {
    /// Full merged page model: markup, behaviors, styles, attachments.
    Page(&'a MergedDocument),
    /// Single-file fallback: one behavior collection, no markup.
    BehaviorOnly(&'a BehaviorCollection),
}

impl RuleContext<'_> {
    pub fn page(&self) -> Option<&MergedDocument> {
        match self {
            RuleContext::Page(doc) => Some(doc),
            RuleContext::BehaviorOnly(_) => None,
        }
    }

    /// The confidence every issue from this context inherits unless a rule
    /// sets a stricter one.
    pub fn confidence(&self) -> ConfidenceReport {
        match self {
            RuleContext::Page(doc) => doc.confidence.clone(),
            RuleContext::BehaviorOnly(_) => ConfidenceReport::behavior_only(),
        }
    }
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;
    fn check(&self, ctx: &RuleContext) -> Vec<Issue>;
}

pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    disabled_rules: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
    structure_enabled: bool,
    interaction_enabled: bool,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
            structure_enabled: true,
            interaction_enabled: true,
        }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.disabled_rules.clear();
        self.severity_overrides.clear();

        for rule_ref in &config.disabled {
            self.disabled_rules.insert(rule_ref.clone());
        }
        for (rule_ref, severity_value) in &config.severity {
            self.severity_overrides
                .insert(rule_ref.clone(), (*severity_value).into());
        }
        self.structure_enabled = config.structure.unwrap_or(true);
        self.interaction_enabled = config.interaction.unwrap_or(true);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Runs every enabled rule against the context, in registration order.
    /// A panicking rule is isolated: it contributes no issues this run and
    /// the others proceed. Issues a rule did not score explicitly inherit
    /// the context confidence.
    pub fn run_all(&self, ctx: &RuleContext) -> Vec<Issue> {
        let context_confidence = ctx.confidence();
        self.rules
            .iter()
            .filter(|rule| self.should_run_rule(rule.as_ref()))
            .flat_map(|rule| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(ctx)));
                let mut issues = match outcome {
                    Ok(issues) => issues,
                    Err(_) => {
                        error!(
                            rule = rule.metadata().id,
                            "rule panicked; skipping its results for this run"
                        );
                        Vec::new()
                    }
                };
                self.apply_severity_overrides(rule.as_ref(), &mut issues);
                for issue in issues.iter_mut() {
                    if !issue.is_scored() {
                        issue.inherit_confidence(context_confidence.clone());
                    }
                }
                issues
            })
            .collect()
    }

    fn should_run_rule(&self, rule: &dyn Rule) -> bool {
        let metadata = rule.metadata();
        if !self.structure_enabled && metadata.category == RuleCategory::Structure {
            return false;
        }
        if !self.interaction_enabled && metadata.category == RuleCategory::Interaction {
            return false;
        }
        !self.disabled_rules.contains(metadata.id) && !self.disabled_rules.contains(metadata.name)
    }

    fn apply_severity_overrides(&self, rule: &dyn Rule, issues: &mut [Issue]) {
        let metadata = rule.metadata();
        let override_severity = self
            .severity_overrides
            .get(metadata.id)
            .or_else(|| self.severity_overrides.get(metadata.name));
        if let Some(severity) = override_severity {
            for issue in issues.iter_mut() {
                issue.severity = *severity;
            }
        }
    }

    pub fn get_rule(&self, id_or_name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().id == id_or_name || r.metadata().name == id_or_name)
            .map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        category = $cat:ident,
        severity = $sev:ident,
        wcag = [$($criterion:literal),* $(,)?]
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::rules::RuleMetadata {
                        id: $id,
                        name: $rule_name,
                        description: $desc,
                        category: $crate::rules::RuleCategory::$cat,
                        severity: $crate::rules::Severity::$sev,
                        wcag: &[$($criterion),*],
                    },
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}
