//! aria-ref rule (A005): dangling ARIA id references
//!
//! Unresolved references are expected while a page is under construction,
//! so this reports at info severity; the same counts already lower the
//! page's completeness score.

use crate::confidence::ARIA_REFERENCE_ATTRIBUTES;
use crate::declare_rule;
use crate::diagnostic::Issue;
use crate::rules::{Rule, RuleContext, RuleMetadata, Severity};

declare_rule!(
    AriaRef,
    id = "A005",
    name = "aria-ref",
    description = "Flag aria-labelledby/describedby/controls references whose target id does not exist",
    category = Structure,
    severity = Info,
    wcag = ["1.3.1", "4.1.2"]
);

impl Rule for AriaRef {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, ctx: &RuleContext) -> Vec<Issue> {
        let Some(doc) = ctx.page() else {
            return Vec::new();
        };

        let known_ids: Vec<&str> = doc
            .markup
            .all_elements()
            .filter_map(|id| doc.markup.node(id).attr("id"))
            .collect();

        let mut issues = Vec::new();
        for id in doc.markup.all_elements() {
            let node = doc.markup.node(id);
            for attr in ARIA_REFERENCE_ATTRIBUTES {
                let Some(value) = node.attr(attr) else {
                    continue;
                };
                for target in value.split_whitespace() {
                    if !known_ids.contains(&target) {
                        issues.push(
                            Issue::at(
                                "A005",
                                Severity::Info,
                                format!("{attr} references '{target}', which exists in no fragment"),
                                &node.location,
                            )
                            .with_wcag(self.metadata.wcag)
                            .with_suggestion(
                                "The target may live in a file not yet written or not yet linked",
                            ),
                        );
                    }
                }
            }
        }
        issues
    }
}
