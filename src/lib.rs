//! # contentgraph
//!
//! Resolves headless-CMS content items into graphs of typed models.
//!
//! Items reference each other through linked-item elements and through
//! rich text. Every reference reachable from the requested item is resolved
//! against the linked-item pool of the response, each codename exactly once
//! per call, so cyclic content produces a cyclic graph of handles instead of
//! infinite recursion.
//!
//! ## Example
//!
//! ```no_run
//! use contentgraph::{
//!     ContentResolver, FieldKind, FieldSpec, ItemResponse, ResolveOptions, TypeRegistry,
//! };
//!
//! let mut types = TypeRegistry::new();
//! types.register_dynamic(
//!     "article",
//!     vec![
//!         FieldSpec::new("title", FieldKind::Text),
//!         FieldSpec::new("body_copy", FieldKind::RichText),
//!         FieldSpec::new("related_articles", FieldKind::LinkedItems),
//!     ],
//! );
//!
//! let resolver = ContentResolver::new(types, ResolveOptions::default());
//! let response = ItemResponse::from_json(&std::fs::read_to_string("item.json").unwrap()).unwrap();
//! let graph = resolver.resolve_response(&response).expect("article is registered");
//! println!("{} items", graph.len());
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod html;
pub mod render;
pub mod resolver;

pub use crate::core::blocks::{EmbeddedItem, RichTextBlock};
pub use crate::core::graph::{ContentGraph, ItemHandle};
pub use crate::core::model::{
    ContentModel, DateTimeContent, DescribeModel, DynamicItem, FieldConverter, FieldKind,
    FieldSpec, FieldValue, ModelType,
};
pub use crate::core::raw::{
    ElementValue, ItemResponse, ItemSystem, LinkedItemSource, LinkedItems, ListingResponse,
    RawElement, RawItem,
};
pub use config::Config;
pub use error::{Error, Result};
pub use render::{JsonRenderer, Renderer};
pub use resolver::{
    ContentResolver, DefaultPropertyMapper, InlineItem, InlineItemFormatter, InlineItemProcessor,
    LinkUrlResolver, PatternLinkUrlResolver, PropertyMapper, ResolvingContext, TypeProvider,
    TypeRegistry,
};

use serde::Deserialize;

/// Options for resolving content items.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Prefix replacing scheme and host of asset and inline image URLs.
    pub asset_url_replacement: Option<String>,
    /// Whether links inside rich text are rewritten through the link URL resolver.
    pub resolve_links: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            asset_url_replacement: None,
            resolve_links: true,
        }
    }
}
