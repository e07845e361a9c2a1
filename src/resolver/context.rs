//! Per-call resolution state.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use super::graph::{GraphResolver, Target};
use super::inline::InlineItem;
use super::links::LinkUrlResolver;
use super::rich_text::RichTextExpander;
use super::ContentResolver;
use crate::core::blocks::{EmbeddedItem, RichTextBlock};
use crate::core::graph::{ContentGraph, GraphEntry, ItemHandle};
use crate::core::model::{ContentModel, FieldValue};
use crate::core::raw::{ElementValue, LinkedItemSource, RawElement, RawItem};
use crate::ResolveOptions;

/// State shared by everything reached from one top-level resolution.
///
/// Holds the instances built so far, keyed by codename, so every reference
/// to an item resolves to the same handle, plus the rich-text elements
/// currently being expanded. Custom field converters receive it to resolve
/// linked items and expand rich text themselves.
pub struct ResolvingContext<'a> {
    resolver: &'a ContentResolver,
    pool: &'a dyn LinkedItemSource,
    entries: Vec<GraphEntry>,
    processed: HashMap<String, ItemHandle>,
    in_progress: HashSet<(String, String)>,
}

impl<'a> ResolvingContext<'a> {
    pub(crate) fn new(resolver: &'a ContentResolver, pool: &'a dyn LinkedItemSource) -> Self {
        Self {
            resolver,
            pool,
            entries: Vec::new(),
            processed: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub(crate) fn resolver(&self) -> &'a ContentResolver {
        self.resolver
    }

    pub fn options(&self) -> &'a ResolveOptions {
        self.resolver.options()
    }

    /// Caller-supplied link URL policy, if any.
    pub fn link_url_resolver(&self) -> Option<&'a dyn LinkUrlResolver> {
        self.resolver.link_url_resolver()
    }

    /// Raw item stored in the linked-item pool under `codename`.
    pub fn raw_item(&self, codename: &str) -> Option<&'a RawItem> {
        self.pool.linked_item(codename)
    }

    /// Handle of an item already built in this call.
    pub fn processed(&self, codename: &str) -> Option<ItemHandle> {
        self.processed.get(codename).copied()
    }

    pub fn model(&self, handle: ItemHandle) -> Option<&dyn ContentModel> {
        self.entries
            .get(handle.index())
            .map(|entry| entry.model.as_ref())
    }

    /// Resolves a linked item by codename, reusing the instance if it was
    /// already built. `None` if it is missing from the pool or has no model.
    pub fn linked_item(&mut self, codename: &str) -> Option<ItemHandle> {
        self.embedded_item(codename).handle()
    }

    /// Resolves an item referenced from rich text.
    pub fn embedded_item(&mut self, codename: &str) -> EmbeddedItem {
        if let Some(handle) = self.processed(codename) {
            return EmbeddedItem::Resolved(handle);
        }

        let Some(raw) = self.raw_item(codename) else {
            debug!(codename; "Linked item not in response");
            return EmbeddedItem::Unresolved {
                codename: codename.to_string(),
            };
        };

        let Some(item_type) = raw.item_type() else {
            debug!(codename; "Linked item has no usable system section");
            return EmbeddedItem::Unresolved {
                codename: codename.to_string(),
            };
        };

        match GraphResolver::resolve(Target::Lookup, raw, self) {
            Some(handle) => EmbeddedItem::Resolved(handle),
            None => EmbeddedItem::UnknownType {
                codename: codename.to_string(),
                item_type: item_type.to_string(),
            },
        }
    }

    /// View of `embedded` for inline item formatters.
    pub(crate) fn inline_item<'c>(
        &'c self,
        codename: &'c str,
        embedded: &'c EmbeddedItem,
    ) -> InlineItem<'c> {
        match embedded {
            EmbeddedItem::Resolved(handle) => match self.entries.get(handle.index()) {
                Some(entry) => InlineItem::Resolved {
                    codename: &entry.codename,
                    item_type: &entry.item_type,
                    model: entry.model.as_ref(),
                },
                None => InlineItem::Unresolved { codename },
            },
            EmbeddedItem::Unresolved { codename } => InlineItem::Unresolved { codename },
            EmbeddedItem::UnknownType {
                codename,
                item_type,
            } => InlineItem::UnknownType {
                codename,
                item_type,
            },
        }
    }

    /// Expands a rich-text element of the item `codename` into blocks.
    ///
    /// If the same element of the same item is already being expanded
    /// further up, the markup comes back as a single HTML block with inline
    /// items stripped. `None` if `element` is not rich text.
    pub fn expand_rich_text(
        &mut self,
        codename: &str,
        element: &RawElement,
    ) -> Option<Vec<RichTextBlock>> {
        match &element.value {
            ElementValue::RichText(rich_text) => Some(RichTextExpander::expand(
                codename,
                &element.codename,
                rich_text,
                self,
            )),
            _ => None,
        }
    }

    /// Renders a rich-text element of the item `codename` to HTML with
    /// links resolved and inline items formatted.
    pub fn render_rich_text(&mut self, codename: &str, element: &RawElement) -> Option<String> {
        match &element.value {
            ElementValue::RichText(rich_text) => Some(RichTextExpander::render_html(
                codename,
                &element.codename,
                rich_text,
                self,
            )),
            _ => None,
        }
    }

    pub(crate) fn register(
        &mut self,
        codename: &str,
        item_type: &str,
        model: Box<dyn ContentModel>,
    ) -> ItemHandle {
        let handle = ItemHandle::new(self.entries.len());
        self.entries.push(GraphEntry {
            codename: codename.to_string(),
            item_type: item_type.to_string(),
            model,
        });
        self.processed.insert(codename.to_string(), handle);
        trace!(codename, item_type, handle = handle.index(); "Registered item");
        handle
    }

    pub(crate) fn assign(&mut self, handle: ItemHandle, field: &str, value: FieldValue) {
        if let Some(entry) = self.entries.get_mut(handle.index()) {
            entry.model.assign(field, value);
        }
    }

    /// Marks a rich-text element as being expanded. `false` if it already is.
    pub(crate) fn begin_rich_text(&mut self, codename: &str, element: &str) -> bool {
        self.in_progress
            .insert((codename.to_string(), element.to_string()))
    }

    pub(crate) fn end_rich_text(&mut self, codename: &str, element: &str) {
        self.in_progress
            .remove(&(codename.to_string(), element.to_string()));
    }

    pub(crate) fn into_graph(self, root: ItemHandle) -> ContentGraph {
        ContentGraph::new(self.entries, self.processed, root)
    }
}
