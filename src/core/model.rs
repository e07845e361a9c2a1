//! Model descriptions: what a strongly-typed model looks like to the resolver.
//!
//! Models describe their fields once, at registration time, through
//! [`FieldSpec`] lists. The resolver consults these descriptions instead of
//! inspecting types at runtime and hands each converted value back through
//! [`ContentModel::assign`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::blocks::RichTextBlock;
use super::graph::ItemHandle;
use super::raw::{Asset, ChoiceOption, ElementValue, ItemSystem, RawElement, TaxonomyTerm};
use crate::resolver::ResolvingContext;

/// Upcast helper so resolved models can be downcast to their concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A model instance the resolver can populate.
pub trait ContentModel: AsAny + fmt::Debug {
    /// Receives the converted value of one declared field.
    ///
    /// Values whose variant does not fit the field are expected to be ignored.
    fn assign(&mut self, field: &str, value: FieldValue);
}

/// A Rust type bound to one content type.
pub trait DescribeModel: ContentModel + Default + Sized + 'static {
    /// Declared content type name this model is used for.
    const TYPE_NAME: &'static str;

    /// Declared fields, in assignment order.
    fn fields() -> Vec<FieldSpec>;
}

/// Declared kind of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Receives the item's identity section.
    System,
    Text,
    Number,
    DateTime,
    MultipleChoice,
    Taxonomy,
    Assets,
    LinkedItems,
    /// Rich text expanded into blocks.
    RichText,
    /// Raw element value, whatever its tag.
    Custom,
}

impl FieldKind {
    /// Whether built-in dispatch may fill a field of this kind from `element`.
    ///
    /// `System` never matches an element; it is filled from the identity
    /// section. Rich text may feed `Text` fields as processed HTML.
    pub fn accepts(self, element: &ElementValue) -> bool {
        matches!(
            (self, element),
            (FieldKind::Text, ElementValue::Text(_))
                | (FieldKind::Text, ElementValue::UrlSlug(_))
                | (FieldKind::Text, ElementValue::RichText(_))
                | (FieldKind::Number, ElementValue::Number(_))
                | (FieldKind::DateTime, ElementValue::DateTime { .. })
                | (FieldKind::MultipleChoice, ElementValue::MultipleChoice(_))
                | (FieldKind::Taxonomy, ElementValue::Taxonomy { .. })
                | (FieldKind::Assets, ElementValue::Asset(_))
                | (FieldKind::LinkedItems, ElementValue::ModularContent(_))
                | (FieldKind::RichText, ElementValue::RichText(_))
                | (FieldKind::Custom, ElementValue::Custom { .. })
        )
    }
}

/// Converts one element into a field value, overriding built-in dispatch.
pub trait FieldConverter: Send + Sync {
    /// Returns `None` to leave the field at its default value.
    fn convert(
        &self,
        field: &FieldSpec,
        element: &RawElement,
        context: &mut ResolvingContext<'_>,
    ) -> Option<FieldValue>;
}

impl<F> FieldConverter for F
where
    F: Fn(&FieldSpec, &RawElement, &mut ResolvingContext<'_>) -> Option<FieldValue> + Send + Sync,
{
    fn convert(
        &self,
        field: &FieldSpec,
        element: &RawElement,
        context: &mut ResolvingContext<'_>,
    ) -> Option<FieldValue> {
        self(field, element, context)
    }
}

/// Registration-time description of one model field.
#[derive(Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    element: Option<String>,
    converter: Option<Arc<dyn FieldConverter>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            element: None,
            converter: None,
        }
    }

    /// Binds the field to an explicit element codename.
    pub fn element(mut self, codename: impl Into<String>) -> Self {
        self.element = Some(codename.into());
        self
    }

    /// Registers a converter that takes priority over built-in dispatch.
    pub fn converter(mut self, converter: impl FieldConverter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn element_name(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn custom_converter(&self) -> Option<&dyn FieldConverter> {
        self.converter.as_deref()
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("element", &self.element)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// Date element value with its display timezone side channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateTimeContent {
    pub value: DateTime<Utc>,
    pub display_timezone: Option<String>,
}

/// Converted value handed to [`ContentModel::assign`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    System(ItemSystem),
    Text(String),
    Number(f64),
    DateTime(DateTimeContent),
    Options(Vec<ChoiceOption>),
    Terms(Vec<TaxonomyTerm>),
    Assets(Vec<Asset>),
    Items(Vec<ItemHandle>),
    RichText(Vec<RichTextBlock>),
    Custom(Value),
}

type Factory = Arc<dyn Fn() -> Box<dyn ContentModel> + Send + Sync>;

/// A concrete model type: its content type name, fields and constructor.
#[derive(Clone)]
pub struct ModelType {
    type_name: String,
    fields: Vec<FieldSpec>,
    factory: Factory,
}

impl ModelType {
    /// Describes a Rust model type.
    pub fn of<T: DescribeModel>() -> Self {
        Self {
            type_name: T::TYPE_NAME.to_string(),
            fields: T::fields(),
            factory: Arc::new(|| -> Box<dyn ContentModel> { Box::<T>::default() }),
        }
    }

    /// Describes a content type populated into [`DynamicItem`]s.
    pub fn dynamic(type_name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        let type_name = type_name.into();
        let item_type = type_name.clone();
        Self {
            type_name,
            fields,
            factory: Arc::new(move || -> Box<dyn ContentModel> {
                Box::new(DynamicItem::new(item_type.clone()))
            }),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Creates a default-state instance.
    pub fn instantiate(&self) -> Box<dyn ContentModel> {
        (self.factory)()
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Model holding whatever fields its registered description declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicItem {
    item_type: String,
    values: IndexMap<String, FieldValue>,
}

impl DynamicItem {
    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            values: IndexMap::new(),
        }
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Assigned fields in assignment order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl ContentModel for DynamicItem {
    fn assign(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }
}
