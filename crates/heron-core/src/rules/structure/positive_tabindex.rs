//! positive-tabindex rule (A004): tabindex greater than zero breaks focus order

use crate::declare_rule;
use crate::diagnostic::Issue;
use crate::rules::{Rule, RuleContext, RuleMetadata, Severity};

declare_rule!(
    PositiveTabindex,
    id = "A004",
    name = "positive-tabindex",
    description = "Disallow tabindex values above zero, which override document focus order",
    category = Structure,
    severity = Warning,
    wcag = ["2.4.3"]
);

impl Rule for PositiveTabindex {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, ctx: &RuleContext) -> Vec<Issue> {
        let Some(doc) = ctx.page() else {
            return Vec::new();
        };

        let mut issues = Vec::new();
        for id in doc.markup.all_elements() {
            let node = doc.markup.node(id);
            let Some(value) = node.attr("tabindex") else {
                continue;
            };
            let Ok(tabindex) = value.trim().parse::<i32>() else {
                continue;
            };
            if tabindex > 0 {
                issues.push(
                    Issue::at(
                        "A004",
                        Severity::Warning,
                        format!("tabindex=\"{tabindex}\" overrides the natural focus order"),
                        &node.location,
                    )
                    .with_wcag(self.metadata.wcag)
                    .with_suggestion("Use tabindex=\"0\" and rely on document order"),
                );
            }
        }
        issues
    }
}
