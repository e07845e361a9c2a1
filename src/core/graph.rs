//! The resolved graph: every model instance built by one resolution call.

use std::collections::HashMap;

use serde::Serialize;

use super::model::ContentModel;

/// Identity of a model instance within one [`ContentGraph`].
///
/// Two references to the same codename resolved in the same call carry the
/// same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemHandle(usize);

impl ItemHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct GraphEntry {
    pub(crate) codename: String,
    pub(crate) item_type: String,
    pub(crate) model: Box<dyn ContentModel>,
}

/// Arena of resolved model instances with the root they were resolved from.
#[derive(Debug)]
pub struct ContentGraph {
    entries: Vec<GraphEntry>,
    index: HashMap<String, ItemHandle>,
    root: ItemHandle,
}

impl ContentGraph {
    pub(crate) fn new(
        entries: Vec<GraphEntry>,
        index: HashMap<String, ItemHandle>,
        root: ItemHandle,
    ) -> Self {
        Self {
            entries,
            index,
            root,
        }
    }

    pub fn root(&self) -> ItemHandle {
        self.root
    }

    /// Number of distinct items in the graph.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handle of the instance resolved for `codename`, if it was reached.
    pub fn handle(&self, codename: &str) -> Option<ItemHandle> {
        self.index.get(codename).copied()
    }

    pub fn codename(&self, handle: ItemHandle) -> Option<&str> {
        self.entries
            .get(handle.index())
            .map(|entry| entry.codename.as_str())
    }

    pub fn item_type(&self, handle: ItemHandle) -> Option<&str> {
        self.entries
            .get(handle.index())
            .map(|entry| entry.item_type.as_str())
    }

    pub fn model(&self, handle: ItemHandle) -> Option<&dyn ContentModel> {
        self.entries
            .get(handle.index())
            .map(|entry| entry.model.as_ref())
    }

    /// Returns the instance behind `handle` if it is a `T`.
    pub fn get<T: ContentModel + 'static>(&self, handle: ItemHandle) -> Option<&T> {
        self.model(handle)
            .and_then(|model| model.as_any().downcast_ref::<T>())
    }

    pub fn root_as<T: ContentModel + 'static>(&self) -> Option<&T> {
        self.get(self.root)
    }

    /// Iterates instances in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemHandle, &str, &dyn ContentModel)> {
        self.entries.iter().enumerate().map(|(i, entry)| {
            (
                ItemHandle::new(i),
                entry.codename.as_str(),
                entry.model.as_ref(),
            )
        })
    }
}
