//! Builds model instances from raw items, following references.

use log::{debug, trace};

use super::assets::AssetUrlRewriter;
use super::context::ResolvingContext;
use super::rich_text::RichTextExpander;
use crate::core::graph::ItemHandle;
use crate::core::model::{DateTimeContent, FieldKind, FieldSpec, FieldValue, ModelType};
use crate::core::raw::{ElementValue, RawElement, RawItem};

/// How the model type of an item is chosen.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'t> {
    /// Use this model type regardless of the declared content type.
    Concrete(&'t ModelType),
    /// Look the declared content type up in the type provider.
    Lookup,
}

pub(crate) struct GraphResolver;

impl GraphResolver {
    /// Resolves `item` into the context and returns its handle.
    ///
    /// The instance is registered before any field is visited, so cycles
    /// through linked items or rich text land on the same handle. Rich-text
    /// fields are converted after every other field of the item.
    pub(crate) fn resolve(
        target: Target<'_>,
        item: &RawItem,
        context: &mut ResolvingContext<'_>,
    ) -> Option<ItemHandle> {
        let Some(system) = item.system.as_ref() else {
            debug!("Item has no system section, skipping");
            return None;
        };
        if let Some(handle) = context.processed(&system.codename) {
            return Some(handle);
        }

        let resolver = context.resolver();
        let model_type = match target {
            Target::Concrete(model_type) => model_type,
            Target::Lookup => match resolver.types().model_type(&system.item_type) {
                Some(model_type) => model_type,
                None => {
                    debug!(
                        codename = system.codename.as_str(),
                        item_type = system.item_type.as_str();
                        "No model registered for content type"
                    );
                    return None;
                }
            },
        };

        let codename = system.codename.as_str();
        let handle = context.register(codename, &system.item_type, model_type.instantiate());

        let mut deferred: Vec<(&FieldSpec, &RawElement)> = Vec::new();
        for field in model_type.fields() {
            if field.kind() == FieldKind::System {
                context.assign(handle, field.name(), FieldValue::System(system.clone()));
                continue;
            }

            let Some(element) = item
                .elements
                .values()
                .find(|element| {
                    resolver
                        .property_mapper()
                        .is_match(field, &element.codename, &system.item_type)
                })
            else {
                trace!(codename, field = field.name(); "No element for field");
                continue;
            };

            if matches!(element.value, ElementValue::RichText(_)) {
                deferred.push((field, element));
                continue;
            }
            if let Some(value) = Self::convert(codename, field, element, context) {
                context.assign(handle, field.name(), value);
            }
        }

        for (field, element) in deferred {
            if let Some(value) = Self::convert(codename, field, element, context) {
                context.assign(handle, field.name(), value);
            }
        }

        Some(handle)
    }

    fn convert(
        codename: &str,
        field: &FieldSpec,
        element: &RawElement,
        context: &mut ResolvingContext<'_>,
    ) -> Option<FieldValue> {
        if let Some(converter) = field.custom_converter() {
            return converter.convert(field, element, context);
        }

        if let ElementValue::Malformed { kind, reason } = &element.value {
            debug!(
                codename,
                element = element.codename.as_str(),
                kind = kind.as_str(),
                reason = reason.as_str();
                "Skipping malformed element"
            );
            return None;
        }
        if !field.kind().accepts(&element.value) {
            debug!(
                codename,
                field = field.name(),
                element = element.value.kind();
                "Element does not fit field kind, skipping"
            );
            return None;
        }

        let value = match &element.value {
            ElementValue::Text(text) | ElementValue::UrlSlug(text) => {
                FieldValue::Text(text.clone()?)
            }
            ElementValue::Number(number) => FieldValue::Number((*number)?),
            ElementValue::DateTime {
                value,
                display_timezone,
            } => FieldValue::DateTime(DateTimeContent {
                value: (*value)?,
                display_timezone: display_timezone.clone(),
            }),
            ElementValue::MultipleChoice(options) => FieldValue::Options(options.clone()),
            ElementValue::Taxonomy { terms, .. } => FieldValue::Terms(terms.clone()),
            ElementValue::Asset(assets) => {
                let rewriter =
                    AssetUrlRewriter::new(context.options().asset_url_replacement.as_deref());
                FieldValue::Assets(assets.iter().map(|a| rewriter.rewrite_asset(a)).collect())
            }
            ElementValue::ModularContent(codenames) => FieldValue::Items(
                codenames
                    .iter()
                    .filter_map(|linked| context.linked_item(linked))
                    .collect(),
            ),
            ElementValue::RichText(rich_text) => match field.kind() {
                FieldKind::Text => FieldValue::Text(RichTextExpander::render_html(
                    codename,
                    &element.codename,
                    rich_text,
                    context,
                )),
                _ => FieldValue::RichText(RichTextExpander::expand(
                    codename,
                    &element.codename,
                    rich_text,
                    context,
                )),
            },
            ElementValue::Custom { value, .. } => FieldValue::Custom(value.clone()),
            ElementValue::Malformed { .. } => return None,
        };

        Some(value)
    }
}
