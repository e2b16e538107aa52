//! click-without-keyboard rule (A010): mouse-only interaction
//!
//! With a merged page the check is precise: an element with a click handler
//! and no keyboard path (no key handler, not natively focusable) cannot be
//! operated without a pointer. In behavior-only fallback mode the same
//! pattern is reported per selector, at the low confidence the context
//! already carries, since the target markup is unknown.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::element_context;
use crate::declare_rule;
use crate::diagnostic::Issue;
use crate::rules::{Rule, RuleContext, RuleMetadata, Severity};

declare_rule!(
    ClickWithoutKeyboard,
    id = "A010",
    name = "click-without-keyboard",
    description = "Require a keyboard path wherever a click handler is attached",
    category = Interaction,
    severity = Error,
    wcag = ["2.1.1"]
);

/// Tags whose native activation already covers Enter/Space.
const NATIVE_TAGS: &[&str] = &["button", "a", "input", "select", "textarea", "summary"];

impl Rule for ClickWithoutKeyboard {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, ctx: &RuleContext) -> Vec<Issue> {
        match ctx {
            RuleContext::Page(doc) => {
                let mut issues = Vec::new();
                for id in doc.markup.all_elements() {
                    let node = doc.markup.node(id);
                    if NATIVE_TAGS.contains(&node.tag_name.as_str()) {
                        continue;
                    }
                    let element = element_context(doc, id);
                    if element.has_click_handler
                        && !element.has_keyboard_handler
                        && !element.focusable
                    {
                        issues.push(
                            Issue::at(
                                "A010",
                                Severity::Error,
                                format!(
                                    "<{}> handles click but is unreachable by keyboard",
                                    node.tag_name
                                ),
                                &node.location,
                            )
                            .with_wcag(self.metadata.wcag)
                            .with_suggestion(
                                "Add tabindex=\"0\" and a keydown handler, or use a <button>",
                            ),
                        );
                    }
                }
                issues
            }
            RuleContext::BehaviorOnly(behaviors) => {
                // group events per selector; deterministic order via BTree
                let mut events: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
                let mut locations = BTreeMap::new();
                for node in behaviors.event_handlers() {
                    let selector = node.element_ref.selector.as_str();
                    if let Some(event) = node.event.as_deref() {
                        events.entry(selector).or_default().insert(event);
                        locations.entry(selector).or_insert(&node.location);
                    }
                }
                events
                    .into_iter()
                    .filter(|(selector, events)| {
                        events.contains("click")
                            && !events
                                .iter()
                                .any(|e| matches!(*e, "keydown" | "keypress" | "keyup"))
                            && !NATIVE_TAGS.contains(selector)
                    })
                    .map(|(selector, _)| {
                        Issue::at(
                            "A010",
                            Severity::Warning,
                            format!("'{selector}' gets a click handler but no keyboard handler"),
                            locations[selector],
                        )
                        .with_wcag(self.metadata.wcag)
                        .with_suggestion(
                            "Add a keydown/keyup handler unless the target is natively focusable",
                        )
                    })
                    .collect()
            }
        }
    }
}
