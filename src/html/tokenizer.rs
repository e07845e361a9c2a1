//! Tokenizer for HTML fragments.
//!
//! Produces start tags (with attribute spans), end tags, text, comments and
//! stray `<` characters. Offsets are byte offsets into the source, so callers
//! can copy or rewrite the original markup without re-serializing it.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::render::unescape_html;

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

fn start_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"^<([A-Za-z][A-Za-z0-9:_-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
        )
        .expect("start tag pattern is valid")
    })
}

fn end_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^</([A-Za-z][A-Za-z0-9:_-]*)\s*>").expect("end tag pattern is valid")
    })
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

/// A single attribute of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Entity-decoded value; empty for bare attributes.
    pub value: String,
    /// Span of the whole `name="value"` text.
    pub span: Range<usize>,
}

/// A start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercased element name.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub span: Range<usize>,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_str())
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag(Tag),
    EndTag {
        name: String,
        span: Range<usize>,
    },
    Text(Range<usize>),
    Comment(Range<usize>),
    /// A `<` that does not open a tag or comment, or an unterminated comment.
    Invalid(Range<usize>),
}

/// Iterator over the tokens of a fragment.
pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    raw_text: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            raw_text: None,
        }
    }

    fn advance(&mut self, len: usize) -> Range<usize> {
        let start = self.pos;
        self.pos += len;
        start..self.pos
    }

    fn parse_start_tag(&self, captures: &regex::Captures<'_>) -> Tag {
        let whole = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
        let name = captures
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        let self_closing = captures.get(3).is_some_and(|m| !m.as_str().is_empty());

        let attributes = captures
            .get(2)
            .map(|attrs| {
                let offset = self.pos + attrs.start();
                attribute_pattern()
                    .captures_iter(attrs.as_str())
                    .filter_map(|attr| {
                        let full = attr.get(0)?;
                        let value = attr
                            .get(2)
                            .or_else(|| attr.get(3))
                            .or_else(|| attr.get(4))
                            .map(|v| unescape_html(v.as_str()))
                            .unwrap_or_default();
                        Some(Attribute {
                            name: attr.get(1)?.as_str().to_ascii_lowercase(),
                            value,
                            span: offset + full.start()..offset + full.end(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Tag {
            name,
            attributes,
            self_closing,
            span: self.pos..self.pos + whole.len(),
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.pos >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.pos..];

        if let Some(element) = self.raw_text.take() {
            let closing = format!("</{element}");
            let end = rest
                .to_ascii_lowercase()
                .find(&closing)
                .unwrap_or(rest.len());
            if end > 0 {
                return Some(Token::Text(self.advance(end)));
            }
            return self.next();
        }

        if rest.starts_with("<!--") {
            return Some(match rest[4..].find("-->") {
                Some(end) => Token::Comment(self.advance(end + 7)),
                None => Token::Invalid(self.advance(rest.len())),
            });
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            return Some(Token::Comment(self.advance(end)));
        }

        if let Some(captures) = end_tag_pattern().captures(rest) {
            let len = captures.get(0).map(|m| m.len()).unwrap_or_default();
            let name = captures
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            return Some(Token::EndTag {
                name,
                span: self.advance(len),
            });
        }

        if let Some(captures) = start_tag_pattern().captures(rest) {
            let tag = self.parse_start_tag(&captures);
            self.pos = tag.span.end;
            if !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                self.raw_text = Some(tag.name.clone());
            }
            return Some(Token::StartTag(tag));
        }

        if rest.starts_with('<') {
            return Some(Token::Invalid(self.advance(1)));
        }

        let end = rest.find('<').unwrap_or(rest.len());
        Some(Token::Text(self.advance(end)))
    }
}
