//! Tolerant HTML parser producing the markup tree model
//!
//! Handles tags, attributes (quoted, single-quoted, unquoted, bare), text,
//! comments, doctype, void and self-closing elements, and raw-text elements
//! (`script`/`style`). Tag and attribute names are lower-cased. Mismatched
//! or unclosed tags are repaired and recorded as parse errors rather than
//! aborting; multiple top-level elements become multiple fragments.

use std::collections::BTreeMap;

use crate::location::SourceLocation;
use crate::markup::{MarkupTree, NodeId, VOID_ELEMENTS};

pub fn parse_markup(file: &str, source: &str) -> MarkupTree {
    Parser::new(file, source).run()
}

struct Parser<'a> {
    file: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tree: MarkupTree,
    /// Open elements with the tag name they were opened as.
    stack: Vec<(NodeId, String)>,
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, source: &str) -> Self {
        Self {
            file,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tree: MarkupTree::new(file),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> MarkupTree {
        while self.pos < self.chars.len() {
            if self.starts_with("<!--") {
                self.parse_comment();
            } else if self.starts_with("<!") {
                self.skip_until('>');
            } else if self.starts_with("</") {
                self.parse_close_tag();
            } else if self.peek() == Some('<') && self.peek_at(1).is_some_and(|c| c.is_ascii_alphabetic()) {
                self.parse_open_tag();
            } else {
                self.parse_text();
            }
        }

        while let Some((_, tag)) = self.stack.pop() {
            let location = self.location();
            self.tree
                .push_parse_error(format!("unclosed <{tag}> auto-closed at end of input"), location);
        }
        self.tree
    }

    fn parse_comment(&mut self) {
        let location = self.location();
        self.advance_n(4);
        let mut text = String::new();
        while self.pos < self.chars.len() && !self.starts_with("-->") {
            text.push(self.advance());
        }
        if self.starts_with("-->") {
            self.advance_n(3);
        } else {
            self.tree
                .push_parse_error("unterminated comment", location.clone());
        }
        let comment = self.tree.create_comment(&text, location);
        self.attach(comment);
    }

    fn parse_open_tag(&mut self) {
        let location = self.location();
        self.advance(); // '<'
        let tag = self.read_name();
        let mut attributes = BTreeMap::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    self.tree
                        .push_parse_error(format!("unterminated <{tag}> tag"), location.clone());
                    break;
                }
                Some('>') => {
                    self.advance();
                    break;
                }
                Some('/') => {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let name = self.read_attr_name();
                    if name.is_empty() {
                        // stray character; skip it to make progress
                        self.advance();
                        continue;
                    }
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.advance();
                        self.skip_whitespace();
                        self.read_attr_value()
                    } else {
                        String::new()
                    };
                    attributes.insert(name.to_ascii_lowercase(), value);
                }
            }
        }

        let element = self.tree.create_element(&tag, attributes, location);
        self.attach(element);

        let tag = tag.to_ascii_lowercase();
        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            return;
        }
        if tag == "script" || tag == "style" {
            self.parse_raw_text(element, &tag);
            return;
        }
        self.stack.push((element, tag));
    }

    fn parse_raw_text(&mut self, parent: NodeId, tag: &str) {
        let close = format!("</{tag}");
        let location = self.location();
        let mut text = String::new();
        while self.pos < self.chars.len() && !self.starts_with_ignore_case(&close) {
            text.push(self.advance());
        }
        if !text.is_empty() {
            let node = self.tree.create_text(&text, location);
            self.tree.append_child(parent, node);
        }
        if self.starts_with_ignore_case(&close) {
            self.advance_n(close.chars().count());
            self.skip_until('>');
        }
    }

    fn parse_close_tag(&mut self) {
        let location = self.location();
        self.advance_n(2);
        let tag = self.read_name().to_ascii_lowercase();
        self.skip_until('>');

        if let Some(depth) = self.stack.iter().rposition(|(_, open)| *open == tag) {
            // implicitly close everything inside the matched element
            while self.stack.len() > depth + 1 {
                if let Some((_, unclosed)) = self.stack.pop() {
                    self.tree.push_parse_error(
                        format!("unclosed <{unclosed}> implicitly closed by </{tag}>"),
                        location.clone(),
                    );
                }
            }
            self.stack.pop();
        } else {
            self.tree
                .push_parse_error(format!("stray closing tag </{tag}>"), location);
        }
    }

    fn parse_text(&mut self) {
        let location = self.location();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '<' {
                break;
            }
            text.push(self.advance());
        }
        if text.trim().is_empty() {
            return;
        }
        let node = self.tree.create_text(&unescape(&text), location);
        self.attach(node);
    }

    fn attach(&mut self, node: NodeId) {
        match self.stack.last() {
            Some(&(parent, _)) => self.tree.append_child(parent, node),
            None => self.tree.add_root(node),
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' {
                name.push(self.advance());
            } else {
                break;
            }
        }
        name
    }

    fn read_attr_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            name.push(self.advance());
        }
        name
    }

    fn read_attr_value(&mut self) -> String {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let mut value = String::new();
                while let Some(c) = self.peek() {
                    if c == quote {
                        self.advance();
                        break;
                    }
                    value.push(self.advance());
                }
                unescape(&value)
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    value.push(self.advance());
                }
                unescape(&value)
            }
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        prefix
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        prefix.chars().enumerate().all(|(i, c)| {
            self.peek_at(i)
                .is_some_and(|found| found.eq_ignore_ascii_case(&c))
        })
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.pos < self.chars.len() {
                self.advance();
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn skip_until(&mut self, target: char) {
        while let Some(c) = self.peek() {
            self.advance();
            if c == target {
                break;
            }
        }
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::NodeKind;

    #[test]
    fn parses_nested_elements_with_attributes() {
        let tree = parse_markup(
            "index.html",
            r#"<div id="app" class="shell"><button id="save">Save</button></div>"#,
        );

        assert_eq!(tree.fragment_count(), 1);
        let button = tree.query_selector("#save").expect("button");
        assert_eq!(tree.node(button).tag_name, "button");
        assert_eq!(tree.text_content(button), "Save");
        let div = tree.query_selector("#app").expect("div");
        assert_eq!(tree.node(button).parent, Some(div));
    }

    #[test]
    fn attribute_names_are_lowercased() {
        let tree = parse_markup("t.html", r#"<div ARIA-LABEL="Menu" TabIndex=0></div>"#);
        let div = tree.query_selector("div").unwrap();
        assert_eq!(tree.node(div).attr("aria-label"), Some("Menu"));
        assert_eq!(tree.node(div).attr("tabindex"), Some("0"));
    }

    #[test]
    fn multiple_top_level_elements_become_fragments() {
        let tree = parse_markup("t.html", "<header></header><main></main><footer></footer>");
        assert_eq!(tree.fragment_count(), 3);
        assert!(tree.parse_errors().is_empty());
    }

    #[test]
    fn void_and_self_closing_elements_take_no_children() {
        let tree = parse_markup("t.html", r#"<div><img src="a.png"><br><custom-icon /></div>"#);
        let div = tree.query_selector("div").unwrap();
        assert_eq!(tree.node(div).children.len(), 3);
        assert!(tree.parse_errors().is_empty());
    }

    #[test]
    fn unclosed_tag_is_repaired_and_recorded() {
        let tree = parse_markup("t.html", "<div><span>text");
        assert_eq!(tree.fragment_count(), 1);
        assert_eq!(tree.parse_errors().len(), 2, "both div and span are open");
        assert!(tree.parse_errors()[0].message.contains("unclosed"));
    }

    #[test]
    fn stray_closing_tag_is_recorded() {
        let tree = parse_markup("t.html", "<div></span></div>");
        assert_eq!(tree.parse_errors().len(), 1);
        assert!(tree.parse_errors()[0].message.contains("</span>"));
    }

    #[test]
    fn comments_and_doctype_are_tolerated() {
        let tree = parse_markup("t.html", "<!DOCTYPE html><!-- header --><div></div>");
        assert_eq!(tree.fragment_count(), 1, "the comment is not a fragment");
        let kinds: Vec<NodeKind> = tree.roots().iter().map(|&r| tree.node(r).kind).collect();
        assert_eq!(kinds, [NodeKind::Comment, NodeKind::Element]);
    }

    #[test]
    fn script_content_is_raw_text() {
        let tree = parse_markup("t.html", "<script>if (a < b) { go(); }</script>");
        let script = tree.query_selector("script").unwrap();
        let body = tree.node(tree.node(script).children[0]);
        assert!(body.text.contains("a < b"));
        assert!(tree.parse_errors().is_empty());
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let tree = parse_markup("t.html", "<div>\n  <img>\n</div>");
        let img = tree.query_selector("img").unwrap();
        assert_eq!(tree.node(img).location.line, 2);
        assert_eq!(tree.node(img).location.column, 3);
    }

    #[test]
    fn entities_in_text_are_unescaped() {
        let tree = parse_markup("t.html", "<span>a &amp; b &lt;c&gt;</span>");
        let span = tree.query_selector("span").unwrap();
        assert_eq!(tree.text_content(span), "a & b <c>");
    }

    #[test]
    fn round_trip_preserves_structure() {
        let original = parse_markup(
            "t.html",
            r#"<section id="s" class="wide"><h2 id="t">Title</h2><img alt="x"><p>Body <em>text</em></p></section><aside></aside>"#,
        );
        let reparsed = parse_markup("t.html", &original.serialize());

        assert_eq!(original.fragment_count(), reparsed.fragment_count());
        let originals: Vec<_> = original.all_elements().collect();
        let reparseds: Vec<_> = reparsed.all_elements().collect();
        assert_eq!(originals.len(), reparseds.len());
        for (&a, &b) in originals.iter().zip(&reparseds) {
            let left = original.node(a);
            let right = reparsed.node(b);
            assert_eq!(left.tag_name, right.tag_name);
            assert_eq!(left.attributes, right.attributes);
            assert_eq!(left.children.len(), right.children.len());
        }
    }
}
