use serde_json::{json, Map, Value};

use crate::core::blocks::{EmbeddedItem, RichTextBlock};
use crate::core::graph::{ContentGraph, ItemHandle};
use crate::core::model::{DynamicItem, FieldValue};
use crate::render::Renderer;
use crate::Result;

/// Renders resolved graphs as JSON.
///
/// Linked items are written as `{"$ref": codename}` so cyclic graphs render
/// finitely. Only [`DynamicItem`] fields are expanded; other models are
/// rendered through their `Debug` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl Renderer for JsonRenderer {
    fn render(&self, graph: &ContentGraph) -> Result<String> {
        self.write(&Self::to_value(graph))
    }
}

impl JsonRenderer {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Renders several graphs, e.g. the items of a listing, as one array.
    pub fn render_all(&self, graphs: &[ContentGraph]) -> Result<String> {
        let values = graphs.iter().map(Self::to_value).collect();
        self.write(&Value::Array(values))
    }

    fn write(&self, value: &Value) -> Result<String> {
        let out = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(out)
    }

    pub fn to_value(graph: &ContentGraph) -> Value {
        let mut items = Map::new();
        for (handle, codename, model) in graph.iter() {
            let item_type = graph.item_type(handle).unwrap_or_default();
            let rendered = match model.as_any().downcast_ref::<DynamicItem>() {
                Some(item) => {
                    let fields = item
                        .values()
                        .map(|(name, value)| (name.to_string(), field_value(graph, value)))
                        .collect::<Map<_, _>>();
                    json!({ "type": item_type, "fields": fields })
                }
                None => json!({ "type": item_type, "model": format!("{model:?}") }),
            };
            items.insert(codename.to_string(), rendered);
        }

        json!({
            "root": graph.codename(graph.root()),
            "items": items,
        })
    }
}

fn reference(graph: &ContentGraph, handle: ItemHandle) -> Value {
    json!({ "$ref": graph.codename(handle) })
}

fn field_value(graph: &ContentGraph, value: &FieldValue) -> Value {
    match value {
        FieldValue::System(system) => serde_json::to_value(system).unwrap_or_default(),
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Number(number) => json!(number),
        FieldValue::DateTime(date) => serde_json::to_value(date).unwrap_or_default(),
        FieldValue::Options(options) => serde_json::to_value(options).unwrap_or_default(),
        FieldValue::Terms(terms) => serde_json::to_value(terms).unwrap_or_default(),
        FieldValue::Assets(assets) => serde_json::to_value(assets).unwrap_or_default(),
        FieldValue::Items(handles) => handles
            .iter()
            .map(|handle| reference(graph, *handle))
            .collect(),
        FieldValue::RichText(blocks) => blocks
            .iter()
            .map(|block| match block {
                RichTextBlock::Html(html) => json!({ "html": html }),
                RichTextBlock::Image(image) => json!({ "image": image }),
                RichTextBlock::Item(EmbeddedItem::Resolved(handle)) => {
                    json!({ "item": reference(graph, *handle) })
                }
                RichTextBlock::Item(EmbeddedItem::Unresolved { codename }) => {
                    json!({ "unresolved": codename })
                }
                RichTextBlock::Item(EmbeddedItem::UnknownType {
                    codename,
                    item_type,
                }) => json!({ "unknown_type": { "codename": codename, "type": item_type } }),
            })
            .collect(),
        FieldValue::Custom(value) => value.clone(),
    }
}
