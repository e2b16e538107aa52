//! Markup tree model
//!
//! An ordered tree of elements, text, and comments produced by a markup
//! parser. Child order is semantically meaningful (tab and reading order).
//! Nodes live in an arena; parent links are arena ids, never owning
//! references, so disconnected fragments and upward lookups cannot form
//! ownership cycles.

pub mod selector;

use std::collections::BTreeMap;

use id_arena::{Arena, Id};

use crate::location::SourceLocation;
use selector::Selector;

pub type NodeId = Id<Node>;

/// ARIA attributes recognized by `validate` and the `aria-attr` rule.
/// Names outside this list are flagged as probable typos.
pub const ARIA_ATTRIBUTES: &[&str] = &[
    "aria-activedescendant",
    "aria-atomic",
    "aria-autocomplete",
    "aria-busy",
    "aria-checked",
    "aria-colcount",
    "aria-colindex",
    "aria-colspan",
    "aria-controls",
    "aria-current",
    "aria-describedby",
    "aria-details",
    "aria-disabled",
    "aria-errormessage",
    "aria-expanded",
    "aria-flowto",
    "aria-haspopup",
    "aria-hidden",
    "aria-invalid",
    "aria-keyshortcuts",
    "aria-label",
    "aria-labelledby",
    "aria-level",
    "aria-live",
    "aria-modal",
    "aria-multiline",
    "aria-multiselectable",
    "aria-orientation",
    "aria-owns",
    "aria-placeholder",
    "aria-posinset",
    "aria-pressed",
    "aria-readonly",
    "aria-relevant",
    "aria-required",
    "aria-roledescription",
    "aria-rowcount",
    "aria-rowindex",
    "aria-rowspan",
    "aria-selected",
    "aria-setsize",
    "aria-sort",
    "aria-valuemax",
    "aria-valuemin",
    "aria-valuenow",
    "aria-valuetext",
];

/// Tags that never take a closing tag or children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Parser-assigned id, unique within one tree. Distinct from the html
    /// `id` attribute, which selector matching uses.
    pub element_id: String,
    pub kind: NodeKind,
    /// Lower-cased tag name; empty for text and comment nodes.
    pub tag_name: String,
    /// Content of text and comment nodes; empty for elements.
    pub text: String,
    /// Attribute keys are lower-cased. Insertion order is not significant,
    /// so a sorted map keeps serialization deterministic.
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub location: SourceLocation,
    /// Opaque per-dialect metadata (framework directives, binding names).
    pub meta: BTreeMap<String, String>,
}

impl Node {
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Focusable per markup alone: explicit non-negative tabindex, or a
    /// naturally focusable tag that is not disabled.
    pub fn is_focusable(&self) -> bool {
        if !self.is_element() {
            return false;
        }
        if let Some(tabindex) = self.attr("tabindex") {
            if let Ok(value) = tabindex.trim().parse::<i32>() {
                return value >= 0;
            }
        }
        match self.tag_name.as_str() {
            "a" => self.has_attr("href"),
            "button" | "input" | "select" | "textarea" => !self.has_attr("disabled"),
            _ => false,
        }
    }
}

/// A recoverable parse problem recorded by a producer. Surfaces as one
/// synthetic `analysis-error` issue; never aborts analysis.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// One parse unit of markup. `roots` is the fragment list: zero or more
/// disconnected rooted trees. Multiple fragments are a normal state of
/// incomplete development, not an error.
#[derive(Debug, Default)]
pub struct MarkupTree {
    nodes: Arena<Node>,
    roots: Vec<NodeId>,
    source_file: String,
    parse_errors: Vec<ParseError>,
}

impl MarkupTree {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            nodes: Arena::new(),
            roots: Vec::new(),
            source_file: source_file.into(),
            parse_errors: Vec::new(),
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of fragments. Only element roots count; top-level comments
    /// and stray text are kept in `roots` but are not fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragment_roots().count()
    }

    fn fragment_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(|&id| self.nodes[id].is_element())
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    pub fn push_parse_error(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.parse_errors.push(ParseError {
            message: message.into(),
            location,
        });
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn create_element(
        &mut self,
        tag_name: &str,
        attributes: BTreeMap<String, String>,
        location: SourceLocation,
    ) -> NodeId {
        let element_id = format!("e{}", self.nodes.len());
        self.nodes.alloc(Node {
            element_id,
            kind: NodeKind::Element,
            tag_name: tag_name.to_ascii_lowercase(),
            text: String::new(),
            attributes,
            children: Vec::new(),
            parent: None,
            location,
            meta: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str, location: SourceLocation) -> NodeId {
        self.create_leaf(NodeKind::Text, text, location)
    }

    pub fn create_comment(&mut self, text: &str, location: SourceLocation) -> NodeId {
        self.create_leaf(NodeKind::Comment, text, location)
    }

    fn create_leaf(&mut self, kind: NodeKind, text: &str, location: SourceLocation) -> NodeId {
        let element_id = format!("e{}", self.nodes.len());
        self.nodes.alloc(Node {
            element_id,
            kind,
            tag_name: String::new(),
            text: text.to_string(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            location,
            meta: BTreeMap::new(),
        })
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn add_root(&mut self, root: NodeId) {
        self.roots.push(root);
    }

    pub fn set_meta(&mut self, id: NodeId, key: &str, value: &str) {
        self.nodes[id].meta.insert(key.to_string(), value.to_string());
    }

    /// Looks up the parser-assigned element id.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.all_nodes().find(|&id| self.nodes[id].element_id == element_id)
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let sel = Selector::parse(selector)?;
        self.all_elements().find(|&id| sel.matches(&self.nodes[id]))
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.all_elements()
            .filter(|&id| sel.matches(&self.nodes[id]))
            .collect()
    }

    /// All element nodes, depth-first, fragments in order.
    pub fn all_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.all_nodes().filter(|&id| self.nodes[id].is_element())
    }

    fn all_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        DepthFirst::new(self)
    }

    /// Depth-first walk of one fragment only.
    pub fn fragment_elements(&self, fragment: usize) -> Vec<NodeId> {
        let Some(root) = self.fragment_roots().nth(fragment) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.nodes[id].is_element() {
                out.push(id);
            }
            for &child in self.nodes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn focusable_elements(&self) -> Vec<NodeId> {
        self.all_elements()
            .filter(|&id| self.nodes[id].is_focusable())
            .collect()
    }

    /// Interactive per markup alone: focusable, or carrying any inline
    /// `on*` event attribute. Handler-based interactivity needs the merged
    /// graph and lives in the context builder.
    pub fn interactive_elements(&self) -> Vec<NodeId> {
        self.all_elements()
            .filter(|&id| {
                let node = &self.nodes[id];
                node.is_focusable() || node.attributes.keys().any(|k| k.starts_with("on"))
            })
            .collect()
    }

    /// Concatenated text of all descendant text nodes, whitespace-trimmed.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.kind == NodeKind::Text {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(node.text.trim());
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out.trim().to_string()
    }

    /// Structural well-formedness and baseline accessibility checks.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        for id in self.all_elements() {
            let node = &self.nodes[id];
            match node.tag_name.as_str() {
                "img" if !node.has_attr("alt") => {
                    report
                        .errors
                        .push(format!("{}: <img> without alt attribute", node.location));
                }
                "button" if !self.has_accessible_label(id) => {
                    report
                        .errors
                        .push(format!("{}: <button> without accessible label", node.location));
                }
                _ => {}
            }
            for name in node.attributes.keys() {
                if name.starts_with("aria-") && !ARIA_ATTRIBUTES.contains(&name.as_str()) {
                    report
                        .warnings
                        .push(format!("{}: unknown ARIA attribute '{}'", node.location, name));
                }
            }
        }
        report.valid = report.errors.is_empty();
        report
    }

    fn has_accessible_label(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.attr("aria-label").is_some_and(|v| !v.trim().is_empty())
            || node.has_attr("aria-labelledby")
            || node.attr("value").is_some_and(|v| !v.trim().is_empty())
            || !self.text_content(id).is_empty()
    }

    /// Text reproduction of all fragments. `parse(serialize(t))` is
    /// structurally equivalent to `t` (tag, attributes, child count).
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.serialize_node(root, &mut out);
        }
        out
    }

    fn serialize_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::Text => out.push_str(&escape_text(&node.text)),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&node.text);
                out.push_str("-->");
            }
            NodeKind::Element => {
                out.push('<');
                out.push_str(&node.tag_name);
                for (name, value) in &node.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&node.tag_name.as_str()) {
                    return;
                }
                for &child in &node.children {
                    self.serialize_node(child, out);
                }
                out.push_str("</");
                out.push_str(&node.tag_name);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

struct DepthFirst<'a> {
    tree: &'a MarkupTree,
    stack: Vec<NodeId>,
}

impl<'a> DepthFirst<'a> {
    fn new(tree: &'a MarkupTree) -> Self {
        let mut stack: Vec<NodeId> = tree.roots.iter().copied().collect();
        stack.reverse();
        Self { tree, stack }
    }
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for &child in self.tree.nodes[id].children.iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}
