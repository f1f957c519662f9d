//! A thin element view over a Tree-sitter HTML parse.

use std::ops::Range;
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

/// Errors produced while parsing markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("tree-sitter language error: {0}")]
    /// Setting the Tree-sitter language failed.
    Language(String),

    #[error("tree-sitter returned no parse tree")]
    /// The parser gave up on the input.
    Parse,
}

/// A single attribute as written in the markup (values are not entity-decoded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'s> {
    /// Attribute name.
    pub name: &'s str,
    /// Attribute value, `None` for bare attributes like `hidden`.
    pub value: Option<&'s str>,
}

/// An element found in an [`HtmlFragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'s> {
    source: &'s str,
    tag_name: &'s str,
    attributes: Vec<Attribute<'s>>,
    outer: Range<usize>,
    inner: Range<usize>,
}

impl<'s> Element<'s> {
    fn from_node(node: Node<'_>, source: &'s str) -> Option<Self> {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

        let open = children.iter().find(|c| is_open_tag(c.kind()))?;

        let mut open_cursor = open.walk();
        let (tag_name, attributes) = read_open_tag(open.named_children(&mut open_cursor), source);

        let inner = if open.kind() == "self_closing_tag" {
            open.end_byte()..open.end_byte()
        } else {
            let end = match children.last() {
                Some(last) if last.kind() == "end_tag" => last.start_byte(),
                _ => node.end_byte(),
            };
            open.end_byte()..end.max(open.end_byte())
        };

        Some(Self {
            source,
            tag_name,
            attributes,
            outer: node.byte_range(),
            inner,
        })
    }

    /// An element known only by its opening tag, left outside any `element` node by error
    /// recovery. `outer` spans the tag and the inner markup is empty.
    fn from_open_tag(
        tag_name: &'s str,
        attributes: Vec<Attribute<'s>>,
        outer: Range<usize>,
        source: &'s str,
    ) -> Self {
        Self {
            source,
            tag_name,
            attributes,
            inner: outer.end..outer.end,
            outer,
        }
    }

    /// The element's tag name as written.
    pub fn tag_name(&self) -> &'s str {
        self.tag_name
    }

    /// All attributes, in source order.
    pub fn attributes(&self) -> &[Attribute<'s>] {
        &self.attributes
    }

    /// Value of the first attribute named `name` (ASCII case-insensitive).
    ///
    /// Bare attributes yield `Some("")`.
    pub fn attribute(&self, name: &str) -> Option<&'s str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.unwrap_or(""))
    }

    /// Whether the element carries `name`.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// The whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &'s str> + use<'s> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    /// Whether `class` contains `class_name`.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    /// Markup between the start and end tags.
    pub fn inner_html(&self) -> &'s str {
        &self.source[self.inner.clone()]
    }

    /// Markup of the whole element, tags included.
    pub fn outer_html(&self) -> &'s str {
        &self.source[self.outer.clone()]
    }

    /// Byte range of the whole element in the fragment source.
    pub fn byte_range(&self) -> Range<usize> {
        self.outer.clone()
    }
}

fn attribute_from_node<'s>(node: Node<'_>, source: &'s str) -> Option<Attribute<'s>> {
    let mut name = None;
    let mut value = None;

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "attribute_name" => name = Some(&source[child.byte_range()]),
            "attribute_value" => value = Some(&source[child.byte_range()]),
            "quoted_attribute_value" => {
                // `""` has no inner attribute_value node.
                let mut inner_cursor = child.walk();
                let inner = child
                    .named_children(&mut inner_cursor)
                    .find(|n| n.kind() == "attribute_value");
                value = Some(inner.map_or("", |n| &source[n.byte_range()]));
            }
            _ => {}
        }
    }

    Some(Attribute { name: name?, value })
}

fn read_open_tag<'t, 's>(
    nodes: impl Iterator<Item = Node<'t>>,
    source: &'s str,
) -> (&'s str, Vec<Attribute<'s>>) {
    let mut tag_name = "";
    let mut attributes = Vec::new();
    for child in nodes {
        match child.kind() {
            "tag_name" => tag_name = &source[child.byte_range()],
            "attribute" => {
                if let Some(attribute) = attribute_from_node(child, source) {
                    attributes.push(attribute);
                }
            }
            _ => {}
        }
    }
    (tag_name, attributes)
}

fn is_element(kind: &str) -> bool {
    matches!(kind, "element" | "script_element" | "style_element")
}

fn is_open_tag(kind: &str) -> bool {
    matches!(
        kind,
        "start_tag" | "self_closing_tag" | "script_start_tag" | "style_start_tag"
    )
}

/// Opening tags whose tokens were left loose inside an `ERROR` node.
///
/// Each `tag_name` after `<` starts a tag; the `attribute` children after it belong to that
/// tag until the next `>`, `/>` or other token.
fn loose_tags_in_error<'t, 's>(error: Node<'t>, source: &'s str) -> Vec<Element<'s>> {
    struct LooseTag<'s> {
        tag_name: &'s str,
        attributes: Vec<Attribute<'s>>,
        outer: Range<usize>,
    }

    impl<'s> LooseTag<'s> {
        fn finish(self, source: &'s str) -> Element<'s> {
            Element::from_open_tag(self.tag_name, self.attributes, self.outer, source)
        }
    }

    let mut out = Vec::new();
    let mut open: Option<LooseTag<'s>> = None;
    let mut previous: Option<Node<'t>> = None;

    let mut cursor = error.walk();
    for child in error.children(&mut cursor) {
        match child.kind() {
            "attribute" => {
                if let Some(tag) = open.as_mut() {
                    if let Some(attribute) = attribute_from_node(child, source) {
                        tag.attributes.push(attribute);
                    }
                    tag.outer.end = child.end_byte();
                }
            }
            kind => {
                if let Some(mut tag) = open.take() {
                    if matches!(kind, ">" | "/>") {
                        tag.outer.end = child.end_byte();
                    }
                    out.push(tag.finish(source));
                }
                if kind == "tag_name"
                    && let Some(lt) = previous.filter(|p| p.kind() == "<")
                {
                    open = Some(LooseTag {
                        tag_name: &source[child.byte_range()],
                        attributes: Vec::new(),
                        outer: lt.start_byte()..child.end_byte(),
                    });
                }
            }
        }
        previous = Some(child);
    }
    if let Some(tag) = open {
        out.push(tag.finish(source));
    }
    out
}

/// Parsed HTML (a full document or a fragment).
pub struct HtmlFragment<'s> {
    source: &'s str,
    tree: Tree,
}

impl std::fmt::Debug for HtmlFragment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlFragment")
            .field("len", &self.source.len())
            .field("has_errors", &self.has_errors())
            .finish()
    }
}

impl<'s> HtmlFragment<'s> {
    /// Parse `source` as HTML.
    pub fn parse(source: &'s str) -> Result<Self, MarkupError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_html::LANGUAGE.into())
            .map_err(|e| MarkupError::Language(e.to_string()))?;
        let tree = parser.parse(source, None).ok_or(MarkupError::Parse)?;
        Ok(Self { source, tree })
    }

    /// The parsed text.
    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Whether Tree-sitter had to recover from malformed markup.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Every element, in document order (parents before their children).
    ///
    /// Opening tags that error recovery left outside an element are included too, with empty
    /// inner markup.
    pub fn elements(&self) -> Vec<Element<'s>> {
        let mut out = Vec::new();
        let mut cursor = self.tree.walk();

        loop {
            let node = cursor.node();
            let kind = node.kind();
            if is_element(kind) {
                if let Some(element) = Element::from_node(node, self.source) {
                    out.push(element);
                }
            } else if is_open_tag(kind) && !node.parent().is_some_and(|p| is_element(p.kind())) {
                let mut tag_cursor = node.walk();
                let (tag_name, attributes) =
                    read_open_tag(node.named_children(&mut tag_cursor), self.source);
                out.push(Element::from_open_tag(
                    tag_name,
                    attributes,
                    node.byte_range(),
                    self.source,
                ));
            } else if node.is_error() {
                out.extend(loose_tags_in_error(node, self.source));
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    // Loose tags are collected when their `ERROR` node is visited.
                    out.sort_by_key(|element| element.outer.start);
                    return out;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_elements_in_document_order() {
        let html = r#"<div id="a"><p class="x y">one</p><br/><span>two</span></div>"#;
        let fragment = HtmlFragment::parse(html).unwrap();
        let tags: Vec<&str> = fragment.elements().iter().map(Element::tag_name).collect();
        assert_eq!(tags, vec!["div", "p", "br", "span"]);
    }

    #[test]
    fn test_attributes_and_classes() {
        let html = r#"<p class="error-msg  UNCLOSED_TAG" data-x='1' hidden title="">t</p>"#;
        let fragment = HtmlFragment::parse(html).unwrap();
        let elements = fragment.elements();
        let p = &elements[0];

        assert_eq!(p.classes().collect::<Vec<_>>(), vec!["error-msg", "UNCLOSED_TAG"]);
        assert!(p.has_class("UNCLOSED_TAG"));
        assert!(!p.has_class("error"));
        assert_eq!(p.attribute("data-x"), Some("1"));
        assert_eq!(p.attribute("DATA-X"), Some("1"));
        assert_eq!(p.attribute("hidden"), Some(""));
        assert_eq!(p.attribute("title"), Some(""));
        assert_eq!(p.attribute("missing"), None);
        assert!(p.has_attribute("hidden"));
    }

    #[test]
    fn test_inner_and_outer_html() {
        let html = "<div class=\"error-msg T\">Line <code>{{line}}</code></div>";
        let fragment = HtmlFragment::parse(html).unwrap();
        let elements = fragment.elements();

        assert_eq!(elements[0].inner_html(), "Line <code>{{line}}</code>");
        assert_eq!(elements[0].outer_html(), html);
        assert_eq!(elements[1].tag_name(), "code");
        assert_eq!(elements[1].inner_html(), "{{line}}");
    }

    #[test]
    fn test_self_closing_has_empty_inner() {
        let fragment = HtmlFragment::parse(r#"<img src="a.png"/>"#).unwrap();
        let elements = fragment.elements();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].inner_html(), "");
        assert_eq!(elements[0].attribute("src"), Some("a.png"));
    }

    #[test]
    fn test_script_and_style_elements_are_found() {
        let html = r#"<script data-highlight="0,6">let a;</script><style id="s">p {}</style>"#;
        let fragment = HtmlFragment::parse(html).unwrap();
        let elements = fragment.elements();
        let tags: Vec<&str> = elements.iter().map(Element::tag_name).collect();

        assert_eq!(tags, vec!["script", "style"]);
        assert_eq!(elements[0].attribute("data-highlight"), Some("0,6"));
        assert_eq!(elements[0].inner_html(), "let a;");
        assert_eq!(elements[1].attribute("id"), Some("s"));
    }

    #[test]
    fn test_recovered_markup_keeps_every_opening_tag() {
        let html = r#"<p>a <em data-highlight="1,2">b<p>c <b data-highlight="3">d</b>"#;
        let fragment = HtmlFragment::parse(html).unwrap();
        let descriptors: Vec<&str> = fragment
            .elements()
            .iter()
            .filter_map(|e| e.attribute("data-highlight"))
            .collect();
        assert_eq!(descriptors, vec!["1,2", "3"]);
    }
}
