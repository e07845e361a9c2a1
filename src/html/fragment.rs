//! Top-level node structure of an HTML fragment.

use std::ops::Range;

use super::tokenizer::{Tag, Token, Tokenizer};

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

/// One top-level node of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Span of the node's outer markup in the source.
    pub span: Range<usize>,
    /// Start tags inside this node in document order; the first one is the
    /// node's own tag for elements.
    pub tags: Vec<Tag>,
}

impl Node {
    /// The node's own start tag, for element nodes.
    pub fn element(&self) -> Option<&Tag> {
        match self.kind {
            NodeKind::Element => self.tags.first(),
            _ => None,
        }
    }

    /// First start tag in this node (itself included) carrying `attribute`.
    pub fn find_tag_with(&self, attribute: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.attribute(attribute).is_some())
    }
}

/// A fragment split into top-level nodes, plus well-formedness errors.
#[derive(Debug, Clone)]
pub struct Fragment<'a> {
    source: &'a str,
    nodes: Vec<Node>,
    errors: Vec<String>,
}

impl<'a> Fragment<'a> {
    /// Scans `source`. Never fails; problems are collected in [`Fragment::errors`].
    pub fn parse(source: &'a str) -> Self {
        let mut builder = FragmentBuilder::default();
        for token in Tokenizer::new(source) {
            builder.push(token);
        }
        builder.finish(source)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_well_formed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Verbatim markup of `node`.
    pub fn html(&self, node: &Node) -> &'a str {
        &self.source[node.span.clone()]
    }
}

#[derive(Default)]
struct FragmentBuilder {
    nodes: Vec<Node>,
    errors: Vec<String>,
    open: Vec<String>,
    current: Option<Node>,
}

impl FragmentBuilder {
    fn push(&mut self, token: Token) {
        match token {
            Token::Text(span) => {
                if self.open.is_empty() {
                    self.push_text(span);
                }
            }
            Token::Comment(span) => {
                if self.open.is_empty() {
                    self.nodes.push(Node {
                        kind: NodeKind::Comment,
                        span,
                        tags: Vec::new(),
                    });
                }
            }
            Token::Invalid(span) => {
                self.errors
                    .push(format!("unexpected character at offset {}", span.start));
                if self.open.is_empty() {
                    self.push_text(span);
                }
            }
            Token::StartTag(tag) => self.push_start_tag(tag),
            Token::EndTag { name, span } => self.push_end_tag(name, span),
        }
    }

    fn push_text(&mut self, span: Range<usize>) {
        if let Some(last) = self.nodes.last_mut() {
            if last.kind == NodeKind::Text && last.span.end == span.start {
                last.span.end = span.end;
                return;
            }
        }
        self.nodes.push(Node {
            kind: NodeKind::Text,
            span,
            tags: Vec::new(),
        });
    }

    fn push_start_tag(&mut self, tag: Tag) {
        let closed = tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str());

        if self.open.is_empty() {
            if closed {
                self.nodes.push(Node {
                    kind: NodeKind::Element,
                    span: tag.span.clone(),
                    tags: vec![tag],
                });
            } else {
                self.open.push(tag.name.clone());
                self.current = Some(Node {
                    kind: NodeKind::Element,
                    span: tag.span.clone(),
                    tags: vec![tag],
                });
            }
            return;
        }

        if !closed {
            self.open.push(tag.name.clone());
        }
        if let Some(current) = self.current.as_mut() {
            current.tags.push(tag);
        }
    }

    fn push_end_tag(&mut self, name: String, span: Range<usize>) {
        let Some(position) = self.open.iter().rposition(|open| *open == name) else {
            self.errors.push(format!("unexpected </{name}>"));
            if self.open.is_empty() {
                self.push_text(span);
            }
            return;
        };

        for unclosed in self.open.drain(position + 1..) {
            self.errors.push(format!("unclosed <{unclosed}>"));
        }
        self.open.pop();

        if self.open.is_empty() {
            if let Some(mut node) = self.current.take() {
                node.span.end = span.end;
                self.nodes.push(node);
            }
        }
    }

    fn finish(mut self, source: &str) -> Fragment<'_> {
        for unclosed in self.open.drain(..) {
            self.errors.push(format!("unclosed <{unclosed}>"));
        }
        if let Some(mut node) = self.current.take() {
            node.span.end = source.len();
            self.nodes.push(node);
        }

        Fragment {
            source,
            nodes: self.nodes,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_nodes_keep_verbatim_markup() {
        let source =
            r#"<p>One <b>two</b></p>text<figure data-image-id="i1"><img src="x"></figure><br>"#;
        let fragment = Fragment::parse(source);

        let html: Vec<&str> = fragment.nodes().iter().map(|n| fragment.html(n)).collect();
        assert_eq!(
            html,
            vec![
                "<p>One <b>two</b></p>",
                "text",
                r#"<figure data-image-id="i1"><img src="x"></figure>"#,
                "<br>"
            ]
        );
        assert!(fragment.is_well_formed());
        assert_eq!(fragment.nodes()[2].tags.len(), 2);
    }

    #[test]
    fn test_unbalanced_markup_reports_errors() {
        let fragment = Fragment::parse("<div><span>open</div></p>");
        assert_eq!(
            fragment.errors(),
            &["unclosed <span>".to_string(), "unexpected </p>".to_string()]
        );
        assert_eq!(fragment.nodes().len(), 2);
    }

    #[test]
    fn test_unclosed_element_runs_to_end() {
        let fragment = Fragment::parse("<p>never closed");
        assert_eq!(fragment.nodes().len(), 1);
        assert_eq!(fragment.html(&fragment.nodes()[0]), "<p>never closed");
        assert!(!fragment.is_well_formed());
    }

    #[test]
    fn test_find_tag_with_attribute_inside_node() {
        let fragment = Fragment::parse(r#"<figure><img data-image-id="abc" src="u"></figure>"#);
        let tag = fragment.nodes()[0]
            .find_tag_with("data-image-id")
            .expect("nested image tag");
        assert_eq!(tag.name, "img");
    }
}
