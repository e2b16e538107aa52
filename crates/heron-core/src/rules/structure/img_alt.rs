//! img-alt rule (A001): images must carry an alt attribute

use crate::declare_rule;
use crate::diagnostic::{Fix, Issue};
use crate::rules::{Rule, RuleContext, RuleMetadata, Severity};

declare_rule!(
    ImgAlt,
    id = "A001",
    name = "img-alt",
    description = "Require an alt attribute on every <img> element",
    category = Structure,
    severity = Error,
    wcag = ["1.1.1"]
);

impl Rule for ImgAlt {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, ctx: &RuleContext) -> Vec<Issue> {
        let Some(doc) = ctx.page() else {
            // needs markup; nothing to do in behavior-only mode
            return Vec::new();
        };

        let mut issues = Vec::new();
        for id in doc.markup.all_elements() {
            let node = doc.markup.node(id);
            if node.tag_name != "img" || node.has_attr("alt") {
                continue;
            }
            let insert_at = crate::location::SourceLocation::new(
                node.location.file.clone(),
                node.location.line,
                node.location.column + "<img".len(),
            );
            issues.push(
                Issue::at(
                    "A001",
                    Severity::Error,
                    "<img> element is missing an alt attribute",
                    &node.location,
                )
                .with_wcag(self.metadata.wcag)
                .with_suggestion(
                    "Add alt text describing the image, or alt=\"\" if it is decorative",
                )
                .with_fix(Fix {
                    description: "Insert an empty alt attribute".to_string(),
                    replacement: " alt=\"\"".to_string(),
                    location: insert_at,
                }),
            );
        }
        issues
    }
}
