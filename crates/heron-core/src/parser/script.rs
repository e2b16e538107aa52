//! Pattern-based behavior extraction from script sources
//!
//! Observes what a script does to the page without executing or fully
//! parsing it: element lookups, event listener registration, ARIA state
//! mutation, focus moves, DOM manipulation, and portal renders. The output
//! is the flat behavior collection the merge engine cross-references
//! against markup from other files.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::behavior::{ActionType, BehaviorCollection, BehaviorNode, ElementRef};
use crate::location::SourceLocation;
use crate::markup::MarkupTree;

static BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:const|let|var)\s+(\w+)\s*=\s*document\.(?:querySelector\(\s*['"]([^'"]+)['"]\s*\)|getElementById\(\s*['"]([^'"]+)['"]\s*\))"#,
    )
    .expect("binding pattern")
});

static DIRECT_LISTENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"document\.(?:querySelector\(\s*['"]([^'"]+)['"]\s*\)|getElementById\(\s*['"]([^'"]+)['"]\s*\))\s*\.addEventListener\(\s*['"](\w+)['"]"#,
    )
    .expect("direct listener pattern")
});

static BOUND_LISTENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(\w+)\.addEventListener\(\s*['"](\w+)['"]"#).expect("bound listener pattern")
});

static ARIA_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(\w+)\.setAttribute\(\s*['"](aria-[\w-]+)['"]"#).expect("aria set pattern")
});

static FOCUS_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\w+)\.focus\(\s*\)").expect("focus pattern"));

static DOM_MUTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\w+)\.(?:appendChild|removeChild|replaceChildren|insertAdjacentHTML|innerHTML)\b")
        .expect("dom mutation pattern")
});

static PORTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"createPortal\s*\(\s*[^,]+,\s*(?:document\.(?:querySelector\(\s*['"]([^'"]+)['"]\s*\)|getElementById\(\s*['"]([^'"]+)['"]\s*\))|(\w+))"#)
        .expect("portal pattern")
});

pub fn extract_behaviors(file: &str, source: &str) -> BehaviorCollection {
    let mut collection = BehaviorCollection::new(file);
    let mut counter = 0;

    // first pass: local bindings to element lookups
    let mut bindings: BTreeMap<String, String> = BTreeMap::new();
    for capture in BINDING.captures_iter(source) {
        let name = capture[1].to_string();
        let selector = lookup_selector(capture.get(2), capture.get(3));
        bindings.insert(name, selector);
    }

    for capture in DIRECT_LISTENER.captures_iter(source) {
        let selector = lookup_selector(capture.get(1), capture.get(2));
        let offset = capture.get(0).map(|m| m.start()).unwrap_or(0);
        push(
            &mut collection,
            &mut counter,
            ActionType::EventHandler,
            Some(&capture[3]),
            selector,
            String::new(),
            location_at(file, source, offset),
        );
    }

    for capture in BOUND_LISTENER.captures_iter(source) {
        let binding = &capture[1];
        if binding == "document" || binding == "window" {
            continue;
        }
        let Some(selector) = bindings.get(binding) else {
            continue;
        };
        let offset = capture.get(0).map(|m| m.start()).unwrap_or(0);
        push(
            &mut collection,
            &mut counter,
            ActionType::EventHandler,
            Some(&capture[2]),
            selector.clone(),
            binding.to_string(),
            location_at(file, source, offset),
        );
    }

    for capture in ARIA_SET.captures_iter(source) {
        if let Some(selector) = bindings.get(&capture[1]) {
            let offset = capture.get(0).map(|m| m.start()).unwrap_or(0);
            let mut node_location = location_at(file, source, offset);
            node_location.length = capture.get(0).map(|m| m.as_str().len());
            let mut node = BehaviorNode {
                id: format!("{file}#{counter}"),
                action: ActionType::AriaStateChange,
                event: None,
                element_ref: ElementRef {
                    selector: selector.clone(),
                    binding: capture[1].to_string(),
                },
                location: node_location,
                meta: BTreeMap::new(),
            };
            node.meta
                .insert("attribute".to_string(), capture[2].to_string());
            counter += 1;
            collection.push(node);
        }
    }

    for capture in FOCUS_CALL.captures_iter(source) {
        if let Some(selector) = bindings.get(&capture[1]) {
            let offset = capture.get(0).map(|m| m.start()).unwrap_or(0);
            push(
                &mut collection,
                &mut counter,
                ActionType::FocusChange,
                None,
                selector.clone(),
                capture[1].to_string(),
                location_at(file, source, offset),
            );
        }
    }

    for capture in DOM_MUTATION.captures_iter(source) {
        if let Some(selector) = bindings.get(&capture[1]) {
            let offset = capture.get(0).map(|m| m.start()).unwrap_or(0);
            push(
                &mut collection,
                &mut counter,
                ActionType::DomManipulation,
                None,
                selector.clone(),
                capture[1].to_string(),
                location_at(file, source, offset),
            );
        }
    }

    for capture in PORTAL.captures_iter(source) {
        let offset = capture.get(0).map(|m| m.start()).unwrap_or(0);
        let selector = if let Some(direct) = capture.get(1).or_else(|| capture.get(2)) {
            normalize_lookup(capture.get(1).is_none(), direct.as_str())
        } else if let Some(binding) = capture.get(3) {
            bindings.get(binding.as_str()).cloned().unwrap_or_default()
        } else {
            String::new()
        };
        if selector.is_empty() {
            continue;
        }
        push(
            &mut collection,
            &mut counter,
            ActionType::Portal,
            None,
            selector,
            String::new(),
            location_at(file, source, offset),
        );
    }

    collection
}

/// Inline `on*` attributes in markup are event bindings too; surface them
/// as behavior nodes so behavior-only consumers see them.
pub fn extract_inline_behaviors(tree: &MarkupTree) -> BehaviorCollection {
    let mut collection = BehaviorCollection::new(tree.source_file());
    let mut counter = 0;
    for id in tree.all_elements() {
        let node = tree.node(id);
        let selector = match node.attr("id") {
            Some(html_id) => format!("#{html_id}"),
            None => node.tag_name.clone(),
        };
        for name in node.attributes.keys() {
            let Some(event) = name.strip_prefix("on") else {
                continue;
            };
            if event.is_empty() {
                continue;
            }
            collection.push(BehaviorNode {
                id: format!("{}#{counter}", tree.source_file()),
                action: ActionType::EventHandler,
                event: Some(event.to_string()),
                element_ref: ElementRef {
                    selector: selector.clone(),
                    binding: String::new(),
                },
                location: node.location.clone(),
                meta: BTreeMap::new(),
            });
            counter += 1;
        }
    }
    collection
}

fn lookup_selector(query: Option<regex::Match>, by_id: Option<regex::Match>) -> String {
    match (query, by_id) {
        (Some(selector), _) => selector.as_str().to_string(),
        (None, Some(id)) => format!("#{}", id.as_str()),
        (None, None) => String::new(),
    }
}

fn normalize_lookup(is_by_id: bool, value: &str) -> String {
    if is_by_id {
        format!("#{value}")
    } else {
        value.to_string()
    }
}

fn push(
    collection: &mut BehaviorCollection,
    counter: &mut usize,
    action: ActionType,
    event: Option<&str>,
    selector: String,
    binding: String,
    location: SourceLocation,
) {
    let id = format!("{}#{}", collection.source_file(), counter);
    collection.push(BehaviorNode {
        id,
        action,
        event: event.map(str::to_string),
        element_ref: ElementRef { selector, binding },
        location,
        meta: BTreeMap::new(),
    });
    *counter += 1;
}

fn location_at(file: &str, source: &str, byte_offset: usize) -> SourceLocation {
    let prefix = &source[..byte_offset];
    let line = prefix.matches('\n').count() + 1;
    let column = prefix
        .rfind('\n')
        .map(|last| byte_offset - last)
        .unwrap_or(byte_offset + 1);
    SourceLocation::new(file, line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_chained_listener_is_observed() {
        let behaviors = extract_behaviors(
            "app.js",
            r#"document.querySelector('#save').addEventListener('click', onSave);"#,
        );
        assert_eq!(behaviors.len(), 1);
        let node = &behaviors.nodes()[0];
        assert!(node.is_event("click"));
        assert_eq!(node.element_ref.selector, "#save");
    }

    #[test]
    fn get_element_by_id_becomes_an_id_selector() {
        let behaviors = extract_behaviors(
            "app.js",
            r#"document.getElementById('menu').addEventListener('keydown', onKey);"#,
        );
        assert_eq!(behaviors.nodes()[0].element_ref.selector, "#menu");
    }

    #[test]
    fn bindings_carry_the_selector_to_later_uses() {
        let behaviors = extract_behaviors(
            "app.js",
            r#"
const saveButton = document.querySelector('#save');
saveButton.addEventListener('click', onSave);
saveButton.setAttribute('aria-pressed', 'true');
saveButton.focus();
"#,
        );

        assert_eq!(behaviors.len(), 3);
        let selectors: Vec<&str> = behaviors
            .nodes()
            .iter()
            .map(|n| n.element_ref.selector.as_str())
            .collect();
        assert!(selectors.iter().all(|&s| s == "#save"));
        assert_eq!(behaviors.nodes()[0].action, ActionType::EventHandler);
        assert_eq!(behaviors.nodes()[1].action, ActionType::AriaStateChange);
        assert_eq!(
            behaviors.nodes()[1].meta.get("attribute").map(String::as_str),
            Some("aria-pressed")
        );
        assert_eq!(behaviors.nodes()[2].action, ActionType::FocusChange);
        assert_eq!(behaviors.nodes()[0].element_ref.binding, "saveButton");
    }

    #[test]
    fn document_level_listeners_are_not_element_references() {
        let behaviors = extract_behaviors(
            "app.js",
            r#"document.addEventListener('keydown', globalShortcuts);"#,
        );
        assert!(behaviors.is_empty());
    }

    #[test]
    fn unknown_binding_uses_are_skipped() {
        let behaviors =
            extract_behaviors("app.js", r#"mystery.addEventListener('click', run);"#);
        assert!(behaviors.is_empty());
    }

    #[test]
    fn dom_mutation_through_binding_is_observed() {
        let behaviors = extract_behaviors(
            "app.js",
            r#"
const list = document.querySelector('.results');
list.appendChild(item);
"#,
        );
        assert_eq!(behaviors.len(), 1);
        assert_eq!(behaviors.nodes()[0].action, ActionType::DomManipulation);
        assert_eq!(behaviors.nodes()[0].element_ref.selector, ".results");
    }

    #[test]
    fn portal_target_is_the_container_selector() {
        let behaviors = extract_behaviors(
            "modal.jsx",
            r#"return createPortal(children, document.getElementById('overlay'));"#,
        );
        assert_eq!(behaviors.len(), 1);
        assert_eq!(behaviors.nodes()[0].action, ActionType::Portal);
        assert_eq!(behaviors.nodes()[0].element_ref.selector, "#overlay");
    }

    #[test]
    fn locations_point_at_the_registration_site() {
        let behaviors = extract_behaviors(
            "app.js",
            "\n\nconst b = document.querySelector('#x');\nb.addEventListener('click', f);",
        );
        assert_eq!(behaviors.nodes()[0].location.line, 4);
    }

    #[test]
    fn inline_on_attributes_become_event_handlers() {
        let tree = crate::parser::html::parse_markup(
            "index.html",
            r#"<button id="save" onclick="save()">Save</button><div onmouseover="peek()"></div>"#,
        );
        let behaviors = extract_inline_behaviors(&tree);

        assert_eq!(behaviors.len(), 2);
        assert_eq!(behaviors.nodes()[0].element_ref.selector, "#save");
        assert!(behaviors.nodes()[0].is_event("click"));
        assert_eq!(behaviors.nodes()[1].element_ref.selector, "div");
        assert!(behaviors.nodes()[1].is_event("mouseover"));
    }
}
