//! Single-token selector matching
//!
//! Supports exactly `#id`, `.class`, `[attr]`, `[attr="value"]`, and bare
//! tag names. Combinators, pseudo-classes, and compound selectors are out
//! of scope and fail to parse rather than silently mismatching.

use super::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
    Tag(String),
    Attr { name: String, value: Option<String> },
}

impl Selector {
    /// Parses one selector token. Returns `None` for anything outside the
    /// supported subset, including whitespace or combinator characters.
    pub fn parse(input: &str) -> Option<Selector> {
        let input = input.trim();
        if input.is_empty() || input.chars().any(|c| c.is_whitespace() || c == '>' || c == '~' || c == '+') {
            return None;
        }
        if let Some(id) = input.strip_prefix('#') {
            if id.is_empty() || id.contains(['#', '.', '[']) {
                return None;
            }
            return Some(Selector::Id(id.to_string()));
        }
        if let Some(class) = input.strip_prefix('.') {
            if class.is_empty() || class.contains(['#', '.', '[']) {
                return None;
            }
            return Some(Selector::Class(class.to_string()));
        }
        if input.starts_with('[') {
            let inner = input.strip_prefix('[')?.strip_suffix(']')?;
            return match inner.split_once('=') {
                None => Some(Selector::Attr {
                    name: inner.to_ascii_lowercase(),
                    value: None,
                }),
                Some((name, value)) => {
                    let value = value.trim_matches(['"', '\'']);
                    Some(Selector::Attr {
                        name: name.to_ascii_lowercase(),
                        value: Some(value.to_string()),
                    })
                }
            };
        }
        if input.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Some(Selector::Tag(input.to_ascii_lowercase()));
        }
        None
    }

    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Selector::Id(id) => node.attr("id") == Some(id.as_str()),
            Selector::Class(class) => node.classes().any(|c| c == class),
            Selector::Tag(tag) => node.tag_name == *tag,
            Selector::Attr { name, value } => match value {
                None => node.has_attr(name),
                Some(expected) => node.attr(name) == Some(expected.as_str()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_supported_form() {
        assert_eq!(Selector::parse("#save"), Some(Selector::Id("save".into())));
        assert_eq!(Selector::parse(".btn"), Some(Selector::Class("btn".into())));
        assert_eq!(Selector::parse("BUTTON"), Some(Selector::Tag("button".into())));
        assert_eq!(
            Selector::parse("[aria-hidden]"),
            Some(Selector::Attr {
                name: "aria-hidden".into(),
                value: None
            })
        );
        assert_eq!(
            Selector::parse("[role=\"dialog\"]"),
            Some(Selector::Attr {
                name: "role".into(),
                value: Some("dialog".into())
            })
        );
    }

    #[test]
    fn rejects_combinators_and_compounds() {
        assert_eq!(Selector::parse("div > span"), None);
        assert_eq!(Selector::parse("div span"), None);
        assert_eq!(Selector::parse("ul ~ p"), None);
        assert_eq!(Selector::parse("a + b"), None);
        assert_eq!(Selector::parse("button.btn"), None);
        assert_eq!(Selector::parse(""), None);
        assert_eq!(Selector::parse("#"), None);
        assert_eq!(Selector::parse("."), None);
    }

    #[test]
    fn attribute_value_quotes_are_optional() {
        assert_eq!(
            Selector::parse("[role=dialog]"),
            Some(Selector::Attr {
                name: "role".into(),
                value: Some("dialog".into())
            })
        );
    }
}
