//! Stylesheet parser producing the style rule model
//!
//! Splits a stylesheet into rules with selector, ordered declarations, and
//! computed specificity. Selector groups are expanded into one rule per
//! selector. `@media` blocks are recursed into; other at-rules are skipped.
//! No cascade resolution happens here.

use crate::location::SourceLocation;
use crate::style::{Specificity, StyleCollection, StyleProperty, StyleRule};

pub fn parse_stylesheet(file: &str, source: &str) -> StyleCollection {
    let mut collection = StyleCollection::new(file);
    let cleaned: Vec<char> = blank_comments(source).chars().collect();
    parse_range(file, &cleaned, 0, cleaned.len(), &mut collection);
    collection
}

/// Replaces `/* ... */` comments with spaces so offsets and line numbers
/// stay valid.
fn blank_comments(source: &str) -> String {
    let mut out: Vec<char> = source.chars().collect();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i + 1 < chars.len() {
        if chars[i] == '/' && chars[i + 1] == '*' {
            let start = i;
            i += 2;
            while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                i += 1;
            }
            let end = (i + 2).min(chars.len());
            for slot in out.iter_mut().take(end).skip(start) {
                if *slot != '\n' {
                    *slot = ' ';
                }
            }
            i = end;
        } else {
            i += 1;
        }
    }
    out.into_iter().collect()
}

fn parse_range(
    file: &str,
    chars: &[char],
    start: usize,
    end: usize,
    collection: &mut StyleCollection,
) {
    let mut i = start;
    while i < end {
        // read the prelude up to '{', ';', or end
        let prelude_start = i;
        while i < end && chars[i] != '{' && chars[i] != ';' && chars[i] != '}' {
            i += 1;
        }
        let prelude: String = chars[prelude_start..i].iter().collect();
        let prelude_trimmed = prelude.trim();
        let lead = prelude.chars().take_while(|c| c.is_whitespace()).count();
        let anchor = prelude_start + lead;

        match chars.get(i) {
            Some('{') if i < end => {
                let body_start = i + 1;
                let body_end = matching_brace(chars, i).min(end);
                let body: String = chars[body_start..body_end].iter().collect();

                if prelude_trimmed.starts_with("@media") || prelude_trimmed.starts_with("@supports")
                {
                    parse_range(file, chars, body_start, body_end, collection);
                } else if !prelude_trimmed.starts_with('@') && !prelude_trimmed.is_empty() {
                    let properties = parse_declarations(&body);
                    let location = offset_location(file, chars, anchor);
                    for selector in prelude_trimmed.split(',') {
                        let selector = selector.trim();
                        if selector.is_empty() {
                            continue;
                        }
                        collection.push(StyleRule {
                            selector: selector.to_string(),
                            properties: properties.clone(),
                            specificity: Specificity::of(selector),
                            location: location.clone(),
                        });
                    }
                }
                i = (body_end + 1).min(end);
            }
            Some(_) => i += 1,
            None => break,
        }
    }
}

fn matching_brace(chars: &[char], open: usize) -> usize {
    let mut depth = 0;
    for (i, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    chars.len()
}

fn parse_declarations(body: &str) -> Vec<StyleProperty> {
    body.split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(StyleProperty {
                name: name.to_ascii_lowercase(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Char offset into the full source, converted to 1-based line/column.
fn offset_location(file: &str, chars: &[char], offset: usize) -> SourceLocation {
    let mut line = 1;
    let mut column = 1;
    for &c in chars.iter().take(offset) {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    SourceLocation::new(file, line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_with_declarations() {
        let styles = parse_stylesheet(
            "styles.css",
            ".btn { color: red; cursor: pointer; }\n#save { font-weight: bold; }",
        );

        assert_eq!(styles.len(), 2);
        let btn = &styles.rules()[0];
        assert_eq!(btn.selector, ".btn");
        assert_eq!(btn.properties.len(), 2);
        assert_eq!(btn.property("cursor"), Some("pointer"));
        assert_eq!(btn.specificity, Specificity(0, 0, 1, 0));
        assert_eq!(styles.rules()[1].specificity, Specificity(0, 1, 0, 0));
    }

    #[test]
    fn selector_groups_expand_to_one_rule_each() {
        let styles = parse_stylesheet("s.css", "h1, h2, .title { margin: 0; }");
        let selectors: Vec<&str> = styles.rules().iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, ["h1", "h2", ".title"]);
    }

    #[test]
    fn media_blocks_are_recursed_into() {
        let styles = parse_stylesheet(
            "s.css",
            "@media (max-width: 600px) { .nav { display: none; } }",
        );
        assert_eq!(styles.len(), 1);
        assert_eq!(styles.rules()[0].selector, ".nav");
    }

    #[test]
    fn other_at_rules_are_skipped() {
        let styles = parse_stylesheet(
            "s.css",
            "@import url(a.css);\n@keyframes spin { from { opacity: 0; } }\n.real { color: red; }",
        );
        assert_eq!(styles.len(), 1);
        assert_eq!(styles.rules()[0].selector, ".real");
    }

    #[test]
    fn comments_do_not_shift_line_numbers() {
        let styles = parse_stylesheet("s.css", "/* header\nstyles */\n.btn { color: red; }");
        assert_eq!(styles.rules()[0].location.line, 3);
    }

    #[test]
    fn malformed_declarations_are_dropped_silently() {
        let styles = parse_stylesheet("s.css", ".a { color red; ; background: blue }");
        assert_eq!(styles.rules()[0].properties.len(), 1);
        assert_eq!(styles.rules()[0].property("background"), Some("blue"));
    }

    #[test]
    fn empty_stylesheet_yields_empty_collection() {
        assert!(parse_stylesheet("s.css", "").is_empty());
        assert!(parse_stylesheet("s.css", "   \n/* only a comment */").is_empty());
    }
}
