//! Structured rich-text content.

use super::graph::ItemHandle;
use super::raw::InlineImage;

/// One block of an expanded rich-text element, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextBlock {
    /// Markup kept verbatim.
    Html(String),
    /// Image embedded in the text, with its URL already rewritten.
    Image(InlineImage),
    /// Content item embedded in the text.
    Item(EmbeddedItem),
}

/// Outcome of resolving an item embedded in rich text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedItem {
    Resolved(ItemHandle),
    /// The codename is not part of the linked-item pool.
    Unresolved {
        codename: String,
    },
    /// The item exists but its content type has no model.
    UnknownType {
        codename: String,
        item_type: String,
    },
}

impl EmbeddedItem {
    pub fn handle(&self) -> Option<ItemHandle> {
        match self {
            EmbeddedItem::Resolved(handle) => Some(*handle),
            _ => None,
        }
    }
}
