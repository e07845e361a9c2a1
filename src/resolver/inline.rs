//! Inline item markers in rich text: substitution and stripping.
//!
//! A marker is an `<object type="application/kenticocloud" data-type="item"
//! data-codename="…">` element. Substitution replaces each marker with the
//! output of a formatter; stripping removes markers and keeps everything
//! else byte-for-byte.

use std::collections::HashMap;
use std::ops::Range;

use log::{debug, warn};

use crate::core::model::ContentModel;
use crate::html::{Fragment, Tag, Token, Tokenizer};

const MARKER_TYPE: &str = "application/kenticocloud";

/// Whether `tag` opens an inline item marker.
pub(crate) fn is_item_marker(tag: &Tag) -> bool {
    tag.name == "object"
        && tag.attr("type") == Some(MARKER_TYPE)
        && tag.attr("data-type") == Some("item")
}

/// An inline item marker found in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Marker {
    pub codename: String,
    /// Span from the opening tag through the matching `</object>`.
    pub span: Range<usize>,
}

/// Finds the markers of `fragment` in document order.
pub(crate) fn find_markers(fragment: &str) -> Vec<Marker> {
    let tokens: Vec<Token> = Tokenizer::new(fragment).collect();
    let mut markers = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        if let Token::StartTag(tag) = &tokens[i] {
            if is_item_marker(tag) {
                let start = tag.span.start;
                let mut end = tag.span.end;
                if !tag.self_closing {
                    let mut depth = 1usize;
                    for (j, token) in tokens.iter().enumerate().skip(i + 1) {
                        match token {
                            Token::StartTag(inner)
                                if inner.name == "object" && !inner.self_closing =>
                            {
                                depth += 1;
                            }
                            Token::EndTag { name, span } if name == "object" => {
                                depth -= 1;
                                if depth == 0 {
                                    end = span.end;
                                    i = j;
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                markers.push(Marker {
                    codename: tag.attr("data-codename").unwrap_or_default().to_string(),
                    span: start..end,
                });
            }
        }
        i += 1;
    }

    markers
}

/// An inline item as seen by a formatter.
#[derive(Debug, Clone, Copy)]
pub enum InlineItem<'a> {
    Resolved {
        codename: &'a str,
        item_type: &'a str,
        model: &'a dyn ContentModel,
    },
    /// Referenced but absent from the linked-item pool.
    Unresolved {
        codename: &'a str,
    },
    /// Present, but no model is registered for its content type.
    UnknownType {
        codename: &'a str,
        item_type: &'a str,
    },
}

impl<'a> InlineItem<'a> {
    pub fn codename(&self) -> &'a str {
        match *self {
            InlineItem::Resolved { codename, .. }
            | InlineItem::Unresolved { codename }
            | InlineItem::UnknownType { codename, .. } => codename,
        }
    }

    pub fn item_type(&self) -> Option<&'a str> {
        match *self {
            InlineItem::Resolved { item_type, .. } | InlineItem::UnknownType { item_type, .. } => {
                Some(item_type)
            }
            InlineItem::Unresolved { .. } => None,
        }
    }
}

/// Renders an inline item to an HTML fragment.
pub trait InlineItemFormatter: Send + Sync {
    fn format(&self, item: &InlineItem<'_>) -> String;
}

impl<F> InlineItemFormatter for F
where
    F: Fn(&InlineItem<'_>) -> String + Send + Sync,
{
    fn format(&self, item: &InlineItem<'_>) -> String {
        self(item)
    }
}

fn format_default(item: &InlineItem<'_>) -> String {
    match item {
        InlineItem::Resolved {
            codename,
            item_type,
            ..
        } => format!(
            "No formatter is registered for content type '{item_type}'; content item '{codename}' was not rendered."
        ),
        InlineItem::Unresolved { .. } => format_unresolved(item),
        InlineItem::UnknownType { .. } => format_unknown_type(item),
    }
}

fn format_unresolved(item: &InlineItem<'_>) -> String {
    format!(
        "Content item '{}' is not part of the response; request more depth of linked items.",
        item.codename()
    )
}

fn format_unknown_type(item: &InlineItem<'_>) -> String {
    format!(
        "Content type '{}' of content item '{}' has no registered model.",
        item.item_type().unwrap_or_default(),
        item.codename()
    )
}

/// Selects formatters for inline items and applies them to rich text.
pub struct InlineItemProcessor {
    formatters: HashMap<String, Box<dyn InlineItemFormatter>>,
    default: Box<dyn InlineItemFormatter>,
    unresolved: Box<dyn InlineItemFormatter>,
    unknown_type: Box<dyn InlineItemFormatter>,
}

impl Default for InlineItemProcessor {
    fn default() -> Self {
        Self {
            formatters: HashMap::new(),
            default: Box::new(format_default),
            unresolved: Box::new(format_unresolved),
            unknown_type: Box::new(format_unknown_type),
        }
    }
}

impl std::fmt::Debug for InlineItemProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineItemProcessor")
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl InlineItemProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the formatter for resolved items of `item_type`.
    pub fn with_formatter(
        mut self,
        item_type: impl Into<String>,
        formatter: impl InlineItemFormatter + 'static,
    ) -> Self {
        self.formatters.insert(item_type.into(), Box::new(formatter));
        self
    }

    /// Formatter for resolved items whose type has no formatter of its own.
    pub fn with_default_formatter(mut self, formatter: impl InlineItemFormatter + 'static) -> Self {
        self.default = Box::new(formatter);
        self
    }

    pub fn with_unresolved_formatter(
        mut self,
        formatter: impl InlineItemFormatter + 'static,
    ) -> Self {
        self.unresolved = Box::new(formatter);
        self
    }

    pub fn with_unknown_type_formatter(
        mut self,
        formatter: impl InlineItemFormatter + 'static,
    ) -> Self {
        self.unknown_type = Box::new(formatter);
        self
    }

    /// Replaces every marker in `fragment` with its formatted item.
    ///
    /// Markers whose codename is missing from `items` are formatted by the
    /// default formatter as unresolved items. Output that does not parse as
    /// well-formed HTML is replaced by a diagnostic text.
    pub fn substitute(&self, fragment: &str, items: &HashMap<String, InlineItem<'_>>) -> String {
        self.rewrite_markers(fragment, |codename| self.format_marker(codename, items))
    }

    /// Removes every marker from `fragment`. Applying it twice changes nothing.
    pub fn strip(&self, fragment: &str) -> String {
        self.rewrite_markers(fragment, |_| String::new())
    }

    fn rewrite_markers(&self, fragment: &str, mut replace: impl FnMut(&str) -> String) -> String {
        let markers = find_markers(fragment);
        if markers.is_empty() {
            return fragment.to_string();
        }

        let mut out = String::with_capacity(fragment.len());
        let mut last = 0;
        for marker in markers {
            out.push_str(&fragment[last..marker.span.start]);
            out.push_str(&replace(&marker.codename));
            last = marker.span.end;
        }
        out.push_str(&fragment[last..]);
        out
    }

    fn format_marker(&self, codename: &str, items: &HashMap<String, InlineItem<'_>>) -> String {
        let item = match items.get(codename) {
            Some(item) => *item,
            None => {
                debug!(codename; "Inline item missing from resolved items");
                InlineItem::Unresolved { codename }
            }
        };
        let formatter: &dyn InlineItemFormatter = match item {
            InlineItem::Resolved { item_type, .. } => self
                .formatters
                .get(item_type)
                .map_or(self.default.as_ref(), |formatter| formatter.as_ref()),
            InlineItem::Unresolved { .. } if items.contains_key(codename) => {
                self.unresolved.as_ref()
            }
            InlineItem::Unresolved { .. } => self.default.as_ref(),
            InlineItem::UnknownType { .. } => self.unknown_type.as_ref(),
        };

        let output = formatter.format(&item);
        let parsed = Fragment::parse(&output);
        if parsed.is_well_formed() {
            return output;
        }

        let item_type = item.item_type().unwrap_or("unknown");
        warn!(
            codename,
            item_type,
            errors = parsed.errors().len();
            "Inline item formatter produced invalid HTML"
        );
        format!(
            "[Inline item formatter produced an invalid HTML fragment ({} errors detected) for content item '{}' of type '{}']",
            parsed.errors().len(),
            codename,
            item_type
        )
    }
}
