//! Type lookup and field-to-element matching.

use std::collections::HashMap;

use crate::core::model::{DescribeModel, FieldSpec, ModelType};

/// Maps declared content type names to model types.
pub trait TypeProvider: Send + Sync {
    fn model_type(&self, item_type: &str) -> Option<&ModelType>;
}

/// Default [`TypeProvider`] backed by explicit registrations.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, ModelType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a Rust model under its `TYPE_NAME`.
    pub fn register<T: DescribeModel>(&mut self) -> &mut Self {
        self.insert(ModelType::of::<T>())
    }

    /// Registers a content type populated into dynamic items.
    pub fn register_dynamic(
        &mut self,
        item_type: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> &mut Self {
        self.insert(ModelType::dynamic(item_type, fields))
    }

    /// Adds a model type, replacing any earlier one for the same content type.
    pub fn insert(&mut self, model_type: ModelType) -> &mut Self {
        self.types
            .insert(model_type.type_name().to_string(), model_type);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeProvider for TypeRegistry {
    fn model_type(&self, item_type: &str) -> Option<&ModelType> {
        self.types.get(item_type)
    }
}

/// Decides which raw element feeds a declared field.
pub trait PropertyMapper: Send + Sync {
    fn is_match(&self, field: &FieldSpec, element_name: &str, item_type: &str) -> bool;
}

/// Matches an explicit element binding first, then the field name with
/// underscores ignored and ASCII case folded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPropertyMapper;

impl PropertyMapper for DefaultPropertyMapper {
    fn is_match(&self, field: &FieldSpec, element_name: &str, _item_type: &str) -> bool {
        if let Some(explicit) = field.element_name() {
            return explicit == element_name;
        }
        if field.name() == element_name {
            return true;
        }

        let field_name = field.name().replace('_', "");
        let element_name = element_name.replace('_', "");
        field_name.eq_ignore_ascii_case(&element_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::FieldKind;

    #[test]
    fn test_default_mapper_matches_snake_and_camel_case() {
        let mapper = DefaultPropertyMapper;
        let field = FieldSpec::new("postDate", FieldKind::DateTime);

        assert!(mapper.is_match(&field, "post_date", "article"));
        assert!(!mapper.is_match(&field, "post_title", "article"));
    }

    #[test]
    fn test_explicit_element_binding_wins() {
        let mapper = DefaultPropertyMapper;
        let field = FieldSpec::new("summary", FieldKind::Text).element("teaser_text");

        assert!(mapper.is_match(&field, "teaser_text", "article"));
        assert!(!mapper.is_match(&field, "summary", "article"));
    }

    #[test]
    fn test_registry_replaces_by_type_name() {
        let mut registry = TypeRegistry::new();
        registry
            .register_dynamic("article", vec![FieldSpec::new("title", FieldKind::Text)])
            .register_dynamic("article", Vec::new());

        assert_eq!(registry.len(), 1);
        let article = registry.model_type("article").expect("registered");
        assert!(article.fields().is_empty());
        assert!(registry.model_type("tweet").is_none());
    }
}
