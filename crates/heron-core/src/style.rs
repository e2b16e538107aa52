//! Style rule collection model
//!
//! A flat list of style rules with computed specificity. Matching uses the
//! same single-token selector subset as the markup layer; there is no
//! cascade or inheritance resolution. Callers receive every matching rule
//! ranked by specificity, not a single winning value.

use crate::location::SourceLocation;
use crate::markup::selector::Selector;
use crate::markup::Node;

/// Standard specificity counts: (inline, id, class-or-attribute-or-
/// pseudo-class, element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32, pub u32);

impl Specificity {
    /// Counts selector components. Tolerates selectors outside the matching
    /// subset (descendant parts, pseudo-classes) so real-world stylesheets
    /// still get a sensible rank.
    pub fn of(selector: &str) -> Specificity {
        let mut spec = Specificity::default();
        let mut chars = selector.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    spec.1 += 1;
                    skip_name(&mut chars);
                }
                '.' => {
                    spec.2 += 1;
                    skip_name(&mut chars);
                }
                '[' => {
                    spec.2 += 1;
                    for inner in chars.by_ref() {
                        if inner == ']' {
                            break;
                        }
                    }
                }
                ':' => {
                    // ::before is a pseudo-element, counts as an element
                    if chars.peek() == Some(&':') {
                        chars.next();
                        spec.3 += 1;
                    } else {
                        spec.2 += 1;
                    }
                    skip_name(&mut chars);
                }
                c if c.is_ascii_alphabetic() => {
                    spec.3 += 1;
                    skip_name(&mut chars);
                }
                _ => {}
            }
        }
        spec
    }

    pub fn inline() -> Specificity {
        Specificity(1, 0, 0, 0)
    }
}

fn skip_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            chars.next();
        } else {
            break;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: String,
    /// Declaration order is preserved; later declarations win within a rule.
    pub properties: Vec<StyleProperty>,
    pub specificity: Specificity,
    pub location: SourceLocation,
}

impl StyleRule {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Default)]
pub struct StyleCollection {
    rules: Vec<StyleRule>,
    source_file: String,
}

impl StyleCollection {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            source_file: source_file.into(),
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn push(&mut self, rule: StyleRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Indices of rules matching `element`, specificity descending,
    /// source order on ties.
    pub fn matching_rules(&self, element: &Node) -> Vec<usize> {
        let mut matches: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| {
                Selector::parse(&rule.selector)
                    .map(|sel| sel.matches(element))
                    .unwrap_or(false)
            })
            .map(|(index, _)| index)
            .collect();
        matches.sort_by(|&a, &b| {
            self.rules[b]
                .specificity
                .cmp(&self.rules[a].specificity)
                .then(a.cmp(&b))
        });
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::markup::MarkupTree;

    fn rule(selector: &str, line: usize) -> StyleRule {
        StyleRule {
            selector: selector.to_string(),
            properties: vec![StyleProperty {
                name: "color".to_string(),
                value: "red".to_string(),
            }],
            specificity: Specificity::of(selector),
            location: SourceLocation::new("styles.css", line, 1),
        }
    }

    #[test]
    fn specificity_counts_follow_the_standard_rule() {
        assert_eq!(Specificity::of("#save"), Specificity(0, 1, 0, 0));
        assert_eq!(Specificity::of(".btn"), Specificity(0, 0, 1, 0));
        assert_eq!(Specificity::of("button"), Specificity(0, 0, 0, 1));
        assert_eq!(Specificity::of("[aria-hidden]"), Specificity(0, 0, 1, 0));
        assert_eq!(Specificity::of("a:hover"), Specificity(0, 0, 1, 1));
        assert_eq!(Specificity::of("p::before"), Specificity(0, 0, 0, 2));
        assert_eq!(Specificity::of("#nav .item a"), Specificity(0, 1, 1, 1));
    }

    #[test]
    fn inline_outranks_any_stylesheet_selector() {
        assert!(Specificity::inline() > Specificity::of("#a #b #c"));
    }

    #[test]
    fn matching_rules_sorted_by_specificity_descending() {
        let mut styles = StyleCollection::new("styles.css");
        styles.push(rule("button", 1));
        styles.push(rule("#save", 2));
        styles.push(rule(".btn", 3));

        let mut tree = MarkupTree::new("test.html");
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), "save".to_string());
        attrs.insert("class".to_string(), "btn".to_string());
        let button = tree.create_element("button", attrs, SourceLocation::new("test.html", 1, 1));
        tree.add_root(button);

        let matched = styles.matching_rules(tree.node(button));
        let selectors: Vec<&str> = matched
            .iter()
            .map(|&i| styles.rules()[i].selector.as_str())
            .collect();
        assert_eq!(selectors, ["#save", ".btn", "button"]);
    }

    #[test]
    fn ties_keep_source_order() {
        let mut styles = StyleCollection::new("styles.css");
        styles.push(rule(".first", 1));
        styles.push(rule(".second", 2));

        let mut tree = MarkupTree::new("test.html");
        let mut attrs = BTreeMap::new();
        attrs.insert("class".to_string(), "first second".to_string());
        let div = tree.create_element("div", attrs, SourceLocation::new("test.html", 1, 1));
        tree.add_root(div);

        assert_eq!(styles.matching_rules(tree.node(div)), vec![0, 1]);
    }

    #[test]
    fn later_declaration_wins_within_a_rule() {
        let mut r = rule(".btn", 1);
        r.properties.push(StyleProperty {
            name: "color".to_string(),
            value: "blue".to_string(),
        });
        assert_eq!(r.property("color"), Some("blue"));
        assert_eq!(r.property("display"), None);
    }
}
