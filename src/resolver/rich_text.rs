//! Rich-text expansion into blocks and processed HTML.

use std::borrow::Cow;
use std::collections::HashMap;

use log::debug;

use super::assets::AssetUrlRewriter;
use super::context::ResolvingContext;
use super::inline::{find_markers, is_item_marker};
use super::links::LinkResolver;
use crate::core::blocks::{EmbeddedItem, RichTextBlock};
use crate::core::raw::RichTextElement;
use crate::html::{Fragment, NodeKind};

pub(crate) struct RichTextExpander;

impl RichTextExpander {
    /// Splits a rich-text element into HTML, image and item blocks.
    pub(crate) fn expand(
        codename: &str,
        element: &str,
        rich_text: &RichTextElement,
        context: &mut ResolvingContext<'_>,
    ) -> Vec<RichTextBlock> {
        if !context.begin_rich_text(codename, element) {
            debug!(
                codename,
                element;
                "Rich text is already being expanded, stripping inline items"
            );
            let stripped = context.resolver().inline_processor().strip(&rich_text.value);
            return vec![RichTextBlock::Html(stripped)];
        }

        let blocks = Self::expand_blocks(rich_text, context);
        context.end_rich_text(codename, element);
        blocks
    }

    /// Renders a rich-text element to HTML with links resolved and inline
    /// items replaced by their formatter output.
    pub(crate) fn render_html(
        codename: &str,
        element: &str,
        rich_text: &RichTextElement,
        context: &mut ResolvingContext<'_>,
    ) -> String {
        let processor = context.resolver().inline_processor();
        if !context.begin_rich_text(codename, element) {
            debug!(
                codename,
                element;
                "Rich text is already being rendered, stripping inline items"
            );
            return processor.strip(&rich_text.value);
        }

        let html = Self::resolve_links(rich_text, context);

        let mut embedded: Vec<(String, EmbeddedItem)> = Vec::new();
        for marker in find_markers(&html) {
            if embedded.iter().any(|(seen, _)| *seen == marker.codename) {
                continue;
            }
            let item = context.embedded_item(&marker.codename);
            embedded.push((marker.codename, item));
        }

        let output = {
            let items: HashMap<String, _> = embedded
                .iter()
                .map(|(name, item)| (name.clone(), context.inline_item(name, item)))
                .collect();
            processor.substitute(&html, &items)
        };

        context.end_rich_text(codename, element);
        output
    }

    fn resolve_links<'r>(
        rich_text: &'r RichTextElement,
        context: &ResolvingContext<'_>,
    ) -> Cow<'r, str> {
        match context.link_url_resolver() {
            Some(urls) if context.options().resolve_links && !rich_text.links.is_empty() => {
                Cow::Owned(
                    LinkResolver::new(urls).resolve_links(&rich_text.value, &rich_text.links),
                )
            }
            _ => Cow::Borrowed(&rich_text.value),
        }
    }

    fn expand_blocks(
        rich_text: &RichTextElement,
        context: &mut ResolvingContext<'_>,
    ) -> Vec<RichTextBlock> {
        let html = Self::resolve_links(rich_text, context);
        let fragment = Fragment::parse(&html);
        let rewriter = AssetUrlRewriter::new(context.options().asset_url_replacement.as_deref());

        let mut blocks = Vec::new();
        for node in fragment.nodes() {
            let markup = fragment.html(node);

            if node.kind == NodeKind::Text && markup.trim().is_empty() {
                continue;
            }

            if let Some(tag) = node.element() {
                if is_item_marker(tag) {
                    if let Some(codename) = tag.attr("data-codename").filter(|c| !c.is_empty()) {
                        blocks.push(RichTextBlock::Item(context.embedded_item(codename)));
                        continue;
                    }
                }

                if tag.name == "figure" || tag.name == "img" {
                    let image = node
                        .find_tag_with("data-image-id")
                        .and_then(|image| image.attr("data-image-id"))
                        .and_then(|id| {
                            let found = rich_text.images.get(id);
                            if found.is_none() {
                                debug!(
                                    image_id = id;
                                    "Inline image not in element images, keeping markup"
                                );
                            }
                            found
                        });
                    if let Some(image) = image {
                        blocks.push(RichTextBlock::Image(rewriter.rewrite_image(image)));
                        continue;
                    }
                }
            }

            blocks.push(RichTextBlock::Html(markup.to_string()));
        }

        blocks
    }
}
