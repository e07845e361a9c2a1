//! Resolution of raw content items into model graphs.

mod assets;
mod context;
mod graph;
mod inline;
mod links;
mod registry;
mod rich_text;

use log::{debug, info};

use crate::core::graph::ContentGraph;
use crate::core::model::{DescribeModel, ModelType};
use crate::core::raw::{ItemResponse, LinkedItemSource, ListingResponse, RawItem};
use crate::ResolveOptions;

use self::graph::{GraphResolver, Target};

pub use self::assets::AssetUrlRewriter;
pub use self::context::ResolvingContext;
pub use self::inline::{InlineItem, InlineItemFormatter, InlineItemProcessor};
pub use self::links::{LinkResolver, LinkUrlResolver, PatternLinkUrlResolver};
pub use self::registry::{DefaultPropertyMapper, PropertyMapper, TypeProvider, TypeRegistry};

/// Turns raw items and their linked-item pool into [`ContentGraph`]s.
///
/// Every call starts from an empty context: items are shared within one
/// graph but never between graphs.
pub struct ContentResolver {
    options: ResolveOptions,
    types: Box<dyn TypeProvider>,
    mapper: Box<dyn PropertyMapper>,
    link_urls: Option<Box<dyn LinkUrlResolver>>,
    inline: InlineItemProcessor,
}

impl ContentResolver {
    /// Creates a resolver for the given types and options.
    pub fn new(types: impl TypeProvider + 'static, options: ResolveOptions) -> Self {
        Self {
            options,
            types: Box::new(types),
            mapper: Box::new(DefaultPropertyMapper),
            link_urls: None,
            inline: InlineItemProcessor::default(),
        }
    }

    /// Creates a resolver with default options.
    pub fn with_defaults(types: impl TypeProvider + 'static) -> Self {
        Self::new(types, ResolveOptions::default())
    }

    pub fn with_property_mapper(mut self, mapper: impl PropertyMapper + 'static) -> Self {
        self.mapper = Box::new(mapper);
        self
    }

    pub fn with_link_url_resolver(mut self, urls: impl LinkUrlResolver + 'static) -> Self {
        self.link_urls = Some(Box::new(urls));
        self
    }

    pub fn with_inline_processor(mut self, inline: InlineItemProcessor) -> Self {
        self.inline = inline;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn types(&self) -> &dyn TypeProvider {
        self.types.as_ref()
    }

    pub fn property_mapper(&self) -> &dyn PropertyMapper {
        self.mapper.as_ref()
    }

    pub fn link_url_resolver(&self) -> Option<&dyn LinkUrlResolver> {
        self.link_urls.as_deref()
    }

    pub fn inline_processor(&self) -> &InlineItemProcessor {
        &self.inline
    }

    /// Resolves the item of a single-item response.
    ///
    /// Returns `None` if the item has no system section or no model is
    /// registered for its content type.
    pub fn resolve_response(&self, response: &ItemResponse) -> Option<ContentGraph> {
        self.resolve(&response.item, &response.linked_items)
    }

    /// Resolves `item`, choosing its model by declared content type.
    pub fn resolve(&self, item: &RawItem, pool: &dyn LinkedItemSource) -> Option<ContentGraph> {
        self.run(Target::Lookup, item, pool)
    }

    /// Resolves `item` as a `T`, whatever its declared content type.
    pub fn resolve_as<T: DescribeModel>(
        &self,
        item: &RawItem,
        pool: &dyn LinkedItemSource,
    ) -> Option<ContentGraph> {
        let model_type = ModelType::of::<T>();
        self.run(Target::Concrete(&model_type), item, pool)
    }

    /// Resolves `item` with an explicit model type.
    pub fn resolve_with(
        &self,
        model_type: &ModelType,
        item: &RawItem,
        pool: &dyn LinkedItemSource,
    ) -> Option<ContentGraph> {
        self.run(Target::Concrete(model_type), item, pool)
    }

    /// Resolves every item of a listing against the shared pool.
    ///
    /// Items that cannot be resolved are left out.
    pub fn resolve_listing(&self, response: &ListingResponse) -> Vec<ContentGraph> {
        let graphs: Vec<ContentGraph> = response
            .items
            .iter()
            .filter_map(|item| self.resolve(item, &response.linked_items))
            .collect();

        info!(
            items = response.items.len(),
            resolved = graphs.len();
            "Resolved listing"
        );
        graphs
    }

    fn run(
        &self,
        target: Target<'_>,
        item: &RawItem,
        pool: &dyn LinkedItemSource,
    ) -> Option<ContentGraph> {
        let mut context = ResolvingContext::new(self, pool);
        let root = GraphResolver::resolve(target, item, &mut context)?;
        let graph = context.into_graph(root);

        debug!(
            codename = item.codename().unwrap_or_default(),
            items = graph.len();
            "Resolved item graph"
        );
        Some(graph)
    }
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("options", &self.options)
            .field("link_urls", &self.link_urls.is_some())
            .field("inline", &self.inline)
            .finish_non_exhaustive()
    }
}
