//! aria-attr rule (A003): unknown ARIA attribute names are probable typos

use crate::declare_rule;
use crate::diagnostic::Issue;
use crate::markup::ARIA_ATTRIBUTES;
use crate::rules::{Rule, RuleContext, RuleMetadata, Severity};

declare_rule!(
    AriaAttr,
    id = "A003",
    name = "aria-attr",
    description = "Flag aria-* attributes that are not in the ARIA vocabulary",
    category = Structure,
    severity = Warning,
    wcag = ["4.1.2"]
);

impl Rule for AriaAttr {
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
            for name in node.attributes.keys() {
                if !name.starts_with("aria-") || ARIA_ATTRIBUTES.contains(&name.as_str()) {
                    continue;
                }
                let mut issue = Issue::at(
                    "A003",
                    Severity::Warning,
                    format!("'{name}' is not a known ARIA attribute"),
                    &node.location,
                )
                .with_wcag(self.metadata.wcag);
                if let Some(closest) = closest_aria_attribute(name) {
                    issue = issue.with_suggestion(format!("Did you mean '{closest}'?"));
                }
                issues.push(issue);
            }
        }
        issues
    }
}

/// Nearest known attribute within edit distance 2, for typo suggestions.
fn closest_aria_attribute(name: &str) -> Option<&'static str> {
    ARIA_ATTRIBUTES
        .iter()
        .map(|&known| (known, edit_distance(name, known)))
        .filter(|&(_, distance)| distance <= 2)
        .min_by_key(|&(_, distance)| distance)
        .map(|(known, _)| known)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
