//! Element context derivation
//!
//! A pure function of the merged graph: focusability, interactivity, role,
//! and accessible label for one element, recomputed on demand and never
//! persisted. Rules consume this instead of re-deriving facts themselves.

use crate::markup::NodeId;
use crate::merge::{BehaviorRef, MergedDocument, StyleRuleRef};

/// Accessible label of an element. `Unresolved` means an `aria-labelledby`
/// reference whose target id exists in no fragment; the element is
/// authored as labeled, but the text cannot be resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Resolved(String),
    Unresolved(String),
}

impl Label {
    pub fn text(&self) -> &str {
        match self {
            Label::Resolved(text) => text,
            Label::Unresolved(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementContext {
    pub focusable: bool,
    pub interactive: bool,
    pub has_click_handler: bool,
    pub has_keyboard_handler: bool,
    pub role: Option<String>,
    pub label: Option<Label>,
    pub handlers: Vec<BehaviorRef>,
    pub rules: Vec<StyleRuleRef>,
}

/// Derives the context of one element from the merged document.
pub fn element_context(doc: &MergedDocument, id: NodeId) -> ElementContext {
    let node = doc.markup.node(id);
    let attachments = doc.attachments(id).cloned().unwrap_or_default();

    let mut has_click_handler = false;
    let mut has_keyboard_handler = false;
    for &reference in &attachments.handlers {
        let behavior = doc.behavior(reference);
        if behavior.is_event("click") {
            has_click_handler = true;
        }
        if behavior.is_keyboard_event() {
            has_keyboard_handler = true;
        }
    }
    // inline on* attributes count even when no behavior collection was
    // merged for this page
    if node.has_attr("onclick") {
        has_click_handler = true;
    }
    if ["onkeydown", "onkeypress", "onkeyup"]
        .iter()
        .any(|a| node.has_attr(a))
    {
        has_keyboard_handler = true;
    }

    let focusable = node.is_focusable();
    let interactive = !attachments.handlers.is_empty()
        || has_click_handler
        || has_keyboard_handler
        || focusable;

    ElementContext {
        focusable,
        interactive,
        has_click_handler,
        has_keyboard_handler,
        role: derive_role(doc, id),
        label: derive_label(doc, id),
        handlers: attachments.handlers,
        rules: attachments.rules,
    }
}

fn derive_role(doc: &MergedDocument, id: NodeId) -> Option<String> {
    let node = doc.markup.node(id);
    if let Some(role) = node.attr("role") {
        return Some(role.to_string());
    }
    let implicit = match node.tag_name.as_str() {
        "button" => "button",
        "a" => {
            if node.has_attr("href") {
                "link"
            } else {
                return None;
            }
        }
        "input" | "textarea" => "textbox",
        "select" => "combobox",
        "img" => "img",
        "nav" => "navigation",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "header" => "banner",
        "footer" => "contentinfo",
        "main" => "main",
        "aside" => "complementary",
        "form" => "form",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "table" => "table",
        _ => return None,
    };
    Some(implicit.to_string())
}

fn derive_label(doc: &MergedDocument, id: NodeId) -> Option<Label> {
    let node = doc.markup.node(id);

    if let Some(label) = node.attr("aria-label") {
        if !label.trim().is_empty() {
            return Some(Label::Resolved(label.trim().to_string()));
        }
    }

    if let Some(targets) = node.attr("aria-labelledby") {
        let mut parts = Vec::new();
        let mut missing = Vec::new();
        for target in targets.split_whitespace() {
            match find_by_html_id(doc, target) {
                Some(target_id) => parts.push(doc.markup.text_content(target_id)),
                None => missing.push(target),
            }
        }
        if missing.is_empty() && !parts.is_empty() {
            return Some(Label::Resolved(parts.join(" ").trim().to_string()));
        }
        return Some(Label::Unresolved(format!(
            "unresolved aria-labelledby target(s): {}",
            missing.join(", ")
        )));
    }

    let text = doc.markup.text_content(id);
    if !text.is_empty() {
        return Some(Label::Resolved(text));
    }

    if node.tag_name == "img" {
        if let Some(alt) = node.attr("alt") {
            if !alt.trim().is_empty() {
                return Some(Label::Resolved(alt.trim().to_string()));
            }
        }
        return None;
    }

    if matches!(node.tag_name.as_str(), "input" | "button" | "textarea" | "select") {
        for attr in ["value", "placeholder"] {
            if let Some(value) = node.attr(attr) {
                if !value.trim().is_empty() {
                    return Some(Label::Resolved(value.trim().to_string()));
                }
            }
        }
    }

    None
}

fn find_by_html_id(doc: &MergedDocument, html_id: &str) -> Option<NodeId> {
    doc.markup
        .all_elements()
        .find(|&id| doc.markup.node(id).attr("id") == Some(html_id))
}
