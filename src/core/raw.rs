//! Raw content items as delivered by the content API.
//!
//! Everything here is parsed leniently from a generic `serde_json::Value`
//! tree. A known element tag whose payload has the wrong shape becomes
//! [`ElementValue::Malformed`] instead of an error, so a single bad element
//! never poisons the rest of the item.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Error, Result};

/// Pool of linked items keyed by codename.
pub type LinkedItems = IndexMap<String, RawItem>;

/// Read access to the pool of linked items.
pub trait LinkedItemSource {
    /// Returns the raw item stored under `codename`.
    fn linked_item(&self, codename: &str) -> Option<&RawItem>;
}

impl LinkedItemSource for LinkedItems {
    fn linked_item(&self, codename: &str) -> Option<&RawItem> {
        self.get(codename)
    }
}

/// Identity section of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSystem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub codename: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Declared content type name.
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workflow_step: Option<String>,
    #[serde(default)]
    pub sitemap_locations: Vec<String>,
}

impl ItemSystem {
    /// Parses an identity section.
    ///
    /// Only `codename` and `type` are required. An optional attribute with an
    /// unusable value is dropped on its own and the rest of the section kept.
    pub fn from_value(value: &Value) -> Option<Self> {
        let codename = value.get("codename").and_then(Value::as_str)?;
        let item_type = value.get("type").and_then(Value::as_str)?;

        let field = |name: &str| value.get(name).unwrap_or(&Value::Null);
        let attribute = |name: &str| match optional_string(field(name)) {
            Ok(attribute) => attribute,
            Err(reason) => {
                debug!(
                    codename,
                    attribute = name,
                    reason = reason.as_str();
                    "Dropping invalid system attribute"
                );
                None
            }
        };

        let last_modified = optional_date(field("last_modified")).unwrap_or_else(|reason| {
            debug!(codename, reason = reason.as_str(); "Dropping invalid last_modified");
            None
        });
        let sitemap_locations = list_of(field("sitemap_locations")).unwrap_or_else(|reason| {
            debug!(codename, reason = reason.as_str(); "Dropping invalid sitemap_locations");
            Vec::new()
        });

        Some(Self {
            id: attribute("id"),
            name: attribute("name"),
            codename: codename.to_string(),
            language: attribute("language"),
            item_type: item_type.to_string(),
            collection: attribute("collection"),
            last_modified,
            workflow_step: attribute("workflow_step"),
            sitemap_locations,
        })
    }
}

/// A raw content item: identity plus elements in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub system: Option<ItemSystem>,
    pub elements: IndexMap<String, RawElement>,
}

impl RawItem {
    /// Parses an item node. Never fails; unusable parts are dropped.
    pub fn from_value(value: &Value) -> Self {
        let system = value.get("system").and_then(ItemSystem::from_value);

        let elements = value
            .get("elements")
            .and_then(Value::as_object)
            .map(|elements| {
                elements
                    .iter()
                    .map(|(codename, element)| {
                        (codename.clone(), RawElement::from_value(codename, element))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { system, elements }
    }

    pub fn codename(&self) -> Option<&str> {
        self.system.as_ref().map(|s| s.codename.as_str())
    }

    pub fn item_type(&self) -> Option<&str> {
        self.system.as_ref().map(|s| s.item_type.as_str())
    }
}

/// One element of a content item.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    /// Element codename (the key in the `elements` map).
    pub codename: String,
    /// Display name of the element, if delivered.
    pub name: Option<String>,
    pub value: ElementValue,
}

/// Element payload, tagged by the wire `type` string.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Text(Option<String>),
    RichText(RichTextElement),
    Asset(Vec<Asset>),
    Number(Option<f64>),
    DateTime {
        value: Option<DateTime<Utc>>,
        display_timezone: Option<String>,
    },
    MultipleChoice(Vec<ChoiceOption>),
    Taxonomy {
        group: Option<String>,
        terms: Vec<TaxonomyTerm>,
    },
    ModularContent(Vec<String>),
    UrlSlug(Option<String>),
    /// Element of a type this crate has no built-in handling for.
    Custom {
        kind: String,
        value: Value,
    },
    /// Known tag with a payload of the wrong shape.
    Malformed {
        kind: String,
        reason: String,
    },
}

impl ElementValue {
    /// Returns the wire tag of this element.
    pub fn kind(&self) -> &str {
        match self {
            ElementValue::Text(_) => "text",
            ElementValue::RichText(_) => "rich_text",
            ElementValue::Asset(_) => "asset",
            ElementValue::Number(_) => "number",
            ElementValue::DateTime { .. } => "date_time",
            ElementValue::MultipleChoice(_) => "multiple_choice",
            ElementValue::Taxonomy { .. } => "taxonomy",
            ElementValue::ModularContent(_) => "modular_content",
            ElementValue::UrlSlug(_) => "url_slug",
            ElementValue::Custom { kind, .. } | ElementValue::Malformed { kind, .. } => {
                kind.as_str()
            }
        }
    }
}

impl RawElement {
    /// Parses an element descriptor. Never fails.
    pub fn from_value(codename: &str, value: &Value) -> Self {
        let name = value.get("name").and_then(Value::as_str).map(str::to_owned);
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let payload = value.get("value").unwrap_or(&Value::Null);

        let parsed = match kind {
            "text" => optional_string(payload).map(ElementValue::Text),
            "url_slug" => optional_string(payload).map(ElementValue::UrlSlug),
            "number" => optional_number(payload).map(ElementValue::Number),
            "date_time" => optional_date(payload).map(|date| ElementValue::DateTime {
                value: date,
                display_timezone: value
                    .get("display_timezone")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            }),
            "asset" => list_of::<Asset>(payload).map(ElementValue::Asset),
            "multiple_choice" => list_of::<ChoiceOption>(payload).map(ElementValue::MultipleChoice),
            "taxonomy" => list_of::<TaxonomyTerm>(payload).map(|terms| ElementValue::Taxonomy {
                group: value
                    .get("taxonomy_group")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                terms,
            }),
            "modular_content" => list_of::<String>(payload).map(ElementValue::ModularContent),
            "rich_text" => RichTextElement::from_value(value).map(ElementValue::RichText),
            "" => Err("element has no type".to_string()),
            other => Ok(ElementValue::Custom {
                kind: other.to_string(),
                value: payload.clone(),
            }),
        };

        let value = parsed.unwrap_or_else(|reason| ElementValue::Malformed {
            kind: kind.to_string(),
            reason,
        });

        Self {
            codename: codename.to_string(),
            name,
            value,
        }
    }
}

fn optional_string(value: &Value) -> std::result::Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(format!("expected string, found {other}")),
    }
}

fn optional_number(value: &Value) -> std::result::Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("number {n} is not representable")),
        other => Err(format!("expected number, found {other}")),
    }
}

fn optional_date(value: &Value) -> std::result::Result<Option<DateTime<Utc>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(|e| format!("invalid date '{s}': {e}")),
        other => Err(format!("expected date string, found {other}")),
    }
}

fn list_of<T: for<'de> Deserialize<'de>>(value: &Value) -> std::result::Result<Vec<T>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Vec::<T>::deserialize(value).map_err(|e| e.to_string()),
        other => Err(format!("expected list, found {other}")),
    }
}

/// Asset attached to an asset element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub renditions: IndexMap<String, Rendition>,
}

/// Image transformation preset attached to an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    #[serde(default)]
    pub rendition_id: Option<String>,
    #[serde(default)]
    pub preset_id: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub name: String,
    pub codename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub name: String,
    pub codename: String,
}

/// Image embedded in rich text, keyed by `image_id` in the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    pub image_id: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Target of a content-item link inside rich text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLink {
    /// Link identifier (`data-item-id`); filled from the map key.
    #[serde(default)]
    pub id: String,
    pub codename: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub url_slug: Option<String>,
}

/// Payload of a `rich_text` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichTextElement {
    pub value: String,
    pub images: IndexMap<String, InlineImage>,
    pub links: IndexMap<String, ContentLink>,
    pub modular_content: Vec<String>,
}

impl RichTextElement {
    fn from_value(element: &Value) -> std::result::Result<Self, String> {
        let value = optional_string(element.get("value").unwrap_or(&Value::Null))?
            .unwrap_or_default();

        let images = match element.get("images") {
            None | Some(Value::Null) => IndexMap::new(),
            Some(images) => {
                IndexMap::<String, InlineImage>::deserialize(images).map_err(|e| e.to_string())?
            }
        };

        let links = match element.get("links") {
            None | Some(Value::Null) => IndexMap::new(),
            Some(links) => {
                let mut links = IndexMap::<String, ContentLink>::deserialize(links)
                    .map_err(|e| e.to_string())?;
                for (id, link) in links.iter_mut() {
                    link.id = id.clone();
                }
                links
            }
        };

        let modular_content =
            list_of::<String>(element.get("modular_content").unwrap_or(&Value::Null))?;

        Ok(Self {
            value,
            images,
            links,
            modular_content,
        })
    }
}

/// Response carrying a single item and its linked items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemResponse {
    pub item: RawItem,
    pub linked_items: LinkedItems,
}

impl ItemResponse {
    /// Parses `{ "item": …, "modular_content": { … } }`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let item = value
            .get("item")
            .filter(|item| item.is_object())
            .ok_or_else(|| Error::InvalidResponse("missing 'item' object".to_string()))?;

        Ok(Self {
            item: RawItem::from_value(item),
            linked_items: parse_linked_items(value),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }
}

/// Paging information of a listing response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Response carrying a list of items sharing one linked-item pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingResponse {
    pub items: Vec<RawItem>,
    pub linked_items: LinkedItems,
    pub pagination: Option<Pagination>,
}

impl ListingResponse {
    /// Parses `{ "items": [ … ], "modular_content": { … }, "pagination": { … } }`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidResponse("missing 'items' array".to_string()))?;

        Ok(Self {
            items: items.iter().map(RawItem::from_value).collect(),
            linked_items: parse_linked_items(value),
            pagination: value
                .get("pagination")
                .and_then(|p| Pagination::deserialize(p).ok()),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }
}

fn parse_linked_items(value: &Value) -> LinkedItems {
    value
        .get("modular_content")
        .and_then(Value::as_object)
        .map(|pool| {
            pool.iter()
                .map(|(codename, item)| (codename.clone(), RawItem::from_value(item)))
                .collect()
        })
        .unwrap_or_default()
}
