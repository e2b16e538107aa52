//! Behavior collection model
//!
//! A flat list of observed code actions (event bindings, ARIA mutations,
//! focus changes, DOM manipulation, portal renders). Each node holds a
//! selector-based reference to the markup element it targets; selector
//! string equality is the sole mechanism that lets a behavior declared in
//! one file attach to markup declared in another.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::location::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionType {
    EventHandler,
    AriaStateChange,
    FocusChange,
    DomManipulation,
    Portal,
}

/// Reference from observed code to a markup element: the selector string
/// used in the code plus the local binding name it was assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub selector: String,
    pub binding: String,
}

/// One observed code action. Immutable once produced by an extractor.
#[derive(Debug, Clone)]
pub struct BehaviorNode {
    pub id: String,
    pub action: ActionType,
    /// Event name for `EventHandler` nodes (`click`, `keydown`, ...).
    pub event: Option<String>,
    pub element_ref: ElementRef,
    pub location: SourceLocation,
    /// Framework metadata (component name, directive, ...).
    pub meta: BTreeMap<String, String>,
}

impl BehaviorNode {
    pub fn is_event(&self, name: &str) -> bool {
        self.action == ActionType::EventHandler && self.event.as_deref() == Some(name)
    }

    pub fn is_keyboard_event(&self) -> bool {
        self.action == ActionType::EventHandler
            && matches!(self.event.as_deref(), Some("keydown" | "keypress" | "keyup"))
    }
}

#[derive(Debug, Default)]
pub struct BehaviorCollection {
    nodes: Vec<BehaviorNode>,
    source_file: String,
}

impl BehaviorCollection {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            source_file: source_file.into(),
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn push(&mut self, node: BehaviorNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[BehaviorNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of nodes whose selector or binding equals `selector`.
    /// Plain string equality; selector semantics live with the caller.
    pub fn find_by_selector(&self, selector: &str) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.element_ref.selector == selector || node.element_ref.binding == selector
            })
            .map(|(index, _)| index)
            .collect()
    }

    pub fn event_handlers(&self) -> impl Iterator<Item = &BehaviorNode> {
        self.nodes
            .iter()
            .filter(|node| node.action == ActionType::EventHandler)
    }
}
