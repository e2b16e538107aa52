//! Cross-reference merge engine
//!
//! Given markup fragments plus any number of behavior and style collections
//! (usually from different source files), produces one queryable graph in
//! which every element knows its attached handlers and style rules.
//!
//! Attachments are stored beside the tree and rebuilt from scratch on every
//! merge, so the markup stays immutable and re-merging unchanged inputs is
//! idempotent. A behavior whose selector matches no element is silently
//! dropped here; incomplete wiring is expected during development and is
//! reflected in the confidence score, not reported as an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::behavior::{BehaviorCollection, BehaviorNode};
use crate::confidence::{self, ConfidenceReport};
use crate::markup::{MarkupTree, Node, NodeId};
use crate::style::{StyleCollection, StyleRule};

/// Identity of one behavior node across collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorRef {
    pub collection: usize,
    pub node: usize,
}

/// Identity of one style rule across collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleRuleRef {
    pub collection: usize,
    pub rule: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ElementAttachments {
    pub handlers: Vec<BehaviorRef>,
    pub rules: Vec<StyleRuleRef>,
}

/// The merged, queryable result of one page build.
#[derive(Debug)]
pub struct MergedDocument {
    pub markup: Arc<MarkupTree>,
    pub behaviors: Vec<Arc<BehaviorCollection>>,
    pub styles: Vec<Arc<StyleCollection>>,
    pub confidence: ConfidenceReport,
    /// Behavior nodes whose selector matched no element in any fragment.
    pub unattached_behaviors: usize,
    attachments: HashMap<NodeId, ElementAttachments>,
}

impl MergedDocument {
    pub fn attachments(&self, id: NodeId) -> Option<&ElementAttachments> {
        self.attachments.get(&id)
    }

    pub fn behavior(&self, reference: BehaviorRef) -> &BehaviorNode {
        &self.behaviors[reference.collection].nodes()[reference.node]
    }

    pub fn style_rule(&self, reference: StyleRuleRef) -> &StyleRule {
        &self.styles[reference.collection].rules()[reference.rule]
    }

    /// Attached behavior nodes of one element, in attachment order.
    pub fn handlers(&self, id: NodeId) -> Vec<&BehaviorNode> {
        self.attachments
            .get(&id)
            .map(|a| a.handlers.iter().map(|&r| self.behavior(r)).collect())
            .unwrap_or_default()
    }

    /// Attached style rules of one element, specificity descending per
    /// collection.
    pub fn style_rules(&self, id: NodeId) -> Vec<&StyleRule> {
        self.attachments
            .get(&id)
            .map(|a| a.rules.iter().map(|&r| self.style_rule(r)).collect())
            .unwrap_or_default()
    }
}

/// The selector set of one element, in the fixed attachment order:
/// `#id`, one `.class` per class token, bare tag name, `[role="value"]`,
/// then `[attr]` for every `aria-*` attribute. Pure function of the
/// element's current attributes.
pub fn selector_set(node: &Node) -> Vec<String> {
    let mut selectors = Vec::new();
    if let Some(id) = node.attr("id") {
        selectors.push(format!("#{id}"));
    }
    for class in node.classes() {
        selectors.push(format!(".{class}"));
    }
    selectors.push(node.tag_name.clone());
    if let Some(role) = node.attr("role") {
        selectors.push(format!("[role=\"{role}\"]"));
    }
    for name in node.attributes.keys() {
        if name.starts_with("aria-") {
            selectors.push(format!("[{name}]"));
        }
    }
    selectors
}

#[derive(Debug, Default)]
pub struct MergeEngine;

impl MergeEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        markup: Arc<MarkupTree>,
        behaviors: Vec<Arc<BehaviorCollection>>,
        styles: Vec<Arc<StyleCollection>>,
    ) -> MergedDocument {
        let mut attachments: HashMap<NodeId, ElementAttachments> = HashMap::new();
        let mut attached: HashSet<BehaviorRef> = HashSet::new();

        for element in markup.all_elements() {
            let node = markup.node(element);
            let mut entry = ElementAttachments::default();
            let mut seen: HashSet<BehaviorRef> = HashSet::new();

            for selector in selector_set(node) {
                for (collection, behavior) in behaviors.iter().enumerate() {
                    for index in behavior.find_by_selector(&selector) {
                        let reference = BehaviorRef {
                            collection,
                            node: index,
                        };
                        // union by reference identity only
                        if seen.insert(reference) {
                            entry.handlers.push(reference);
                        }
                        attached.insert(reference);
                    }
                }
            }

            for (collection, style) in styles.iter().enumerate() {
                for rule in style.matching_rules(node) {
                    entry.rules.push(StyleRuleRef { collection, rule });
                }
            }

            if !entry.handlers.is_empty() || !entry.rules.is_empty() {
                attachments.insert(element, entry);
            }
        }

        let total_behaviors: usize = behaviors.iter().map(|b| b.len()).sum();
        let unattached_behaviors = total_behaviors - attached.len();
        if unattached_behaviors > 0 {
            debug!(
                file = markup.source_file(),
                unattached = unattached_behaviors,
                "behavior references did not match any element"
            );
        }

        let confidence = confidence::estimate(&markup);

        MergedDocument {
            markup,
            behaviors,
            styles,
            confidence,
            unattached_behaviors,
            attachments,
        }
    }
}
