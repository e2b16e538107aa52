//! control-name rule (A002): interactive controls need an accessible name

use crate::context::element_context;
use crate::declare_rule;
use crate::diagnostic::Issue;
use crate::rules::{Rule, RuleContext, RuleMetadata, Severity};

declare_rule!(
    ControlName,
    id = "A002",
    name = "control-name",
    description = "Require an accessible name on buttons, links, and custom controls",
    category = Structure,
    severity = Error,
    wcag = ["4.1.2", "2.4.4"]
);

const NAMED_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "tab", "menuitem", "switch", "combobox",
];

impl Rule for ControlName {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, ctx: &RuleContext) -> Vec<Issue> {
        let Some(doc) = ctx.page() else {
            return Vec::new();
        };

        let mut issues = Vec::new();
        for id in doc.markup.all_elements() {
            let element = element_context(doc, id);
            let Some(role) = element.role.as_deref() else {
                continue;
            };
            if !NAMED_ROLES.contains(&role) {
                continue;
            }
            if element.label.is_some() {
                // an unresolved aria-labelledby still counts as authored;
                // A005 reports the dangling reference separately
                continue;
            }
            let node = doc.markup.node(id);
            issues.push(
                Issue::at(
                    "A002",
                    Severity::Error,
                    format!(
                        "<{}> with role '{}' has no accessible name",
                        node.tag_name, role
                    ),
                    &node.location,
                )
                .with_wcag(self.metadata.wcag)
                .with_suggestion("Add visible text, aria-label, or aria-labelledby"),
            );
        }
        issues
    }
}
