//! Analysis engine
//!
//! Wires the rule registry to whichever context is available: a merged page
//! when the background builder has one, or a lone behavior collection in
//! single-file fallback mode. Parse errors recorded on the markup surface
//! as synthetic `analysis-error` issues ahead of the rule results.

use crate::behavior::BehaviorCollection;
use crate::config::Config;
use crate::diagnostic::Issue;
use crate::merge::MergedDocument;
use crate::rules::interaction::ClickWithoutKeyboard;
use crate::rules::structure::{AriaAttr, AriaRef, ControlName, ImgAlt, PositiveTabindex};
use crate::rules::{RuleContext, RuleRegistry, Severity};

pub const ANALYSIS_ERROR: &str = "analysis-error";

pub struct AnalysisEngine {
    registry: RuleRegistry,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            registry: create_default_registry(),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let mut registry = create_default_registry();
        registry.configure(&config.rules);
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Full-context analysis of one merged page.
    pub fn analyze_page(&self, doc: &MergedDocument) -> Vec<Issue> {
        let mut issues = Vec::new();

        for error in doc.markup.parse_errors() {
            issues.push(
                Issue::at(
                    ANALYSIS_ERROR,
                    Severity::Warning,
                    &error.message,
                    &error.location,
                )
                .with_confidence(doc.confidence.clone()),
            );
        }

        issues.extend(self.registry.run_all(&RuleContext::Page(doc)));
        issues
    }

    /// Degraded single-file analysis: behavior collection only, low
    /// confidence, never blocks on a page build.
    pub fn analyze_behavior(&self, behaviors: &BehaviorCollection) -> Vec<Issue> {
        self.registry.run_all(&RuleContext::BehaviorOnly(behaviors))
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn create_default_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();

    registry.register(Box::new(ImgAlt::new()));
    registry.register(Box::new(ControlName::new()));
    registry.register(Box::new(AriaAttr::new()));
    registry.register(Box::new(PositiveTabindex::new()));
    registry.register(Box::new(AriaRef::new()));
    registry.register(Box::new(ClickWithoutKeyboard::new()));

    registry
}
