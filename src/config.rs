//! TOML configuration: content-type schemas, link URL patterns and options.
//!
//! ```toml
//! [options]
//! asset_url_replacement = "https://cdn.example.org"
//!
//! [links]
//! default = "/{type}/{codename}"
//! broken = "/404"
//!
//! [links.patterns]
//! article = "/articles/{url_slug}"
//!
//! [types.article.fields]
//! title = "text"
//! body = { kind = "rich_text", element = "body_copy" }
//! related = { kind = "linked_items", element = "related_articles" }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use crate::core::model::{FieldKind, FieldSpec};
use crate::error::Error;
use crate::resolver::{ContentResolver, PatternLinkUrlResolver, TypeRegistry};
use crate::{ResolveOptions, Result};

/// File looked up in the working directory when no path is given.
pub const LOCAL_CONFIG_FILE: &str = "contentgraph.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: ResolveOptions,
    #[serde(default)]
    pub links: Option<PatternLinkUrlResolver>,
    #[serde(default)]
    pub types: IndexMap<String, TypeConfig>,
}

/// Schema of one content type, resolved into dynamic items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeConfig {
    #[serde(default)]
    pub fields: IndexMap<String, FieldConfig>,
}

/// A field given either as a bare kind or with an explicit element codename.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Kind(FieldKind),
    Detailed {
        kind: FieldKind,
        #[serde(default)]
        element: Option<String>,
    },
}

impl FieldConfig {
    fn to_spec(&self, name: &str) -> FieldSpec {
        match self {
            FieldConfig::Kind(kind) => FieldSpec::new(name, *kind),
            FieldConfig::Detailed { kind, element } => {
                let spec = FieldSpec::new(name, *kind);
                match element {
                    Some(element) => spec.element(element.clone()),
                    None => spec,
                }
            }
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!(
                "missing configuration file: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Type registry with one dynamic model per configured content type.
    pub fn registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for (item_type, schema) in &self.types {
            let fields = schema
                .fields
                .iter()
                .map(|(name, field)| field.to_spec(name))
                .collect();
            registry.register_dynamic(item_type.clone(), fields);
        }
        registry
    }

    /// Builds a resolver from the configured types, options and links.
    pub fn resolver(&self) -> ContentResolver {
        let resolver = ContentResolver::new(self.registry(), self.options.clone());
        match &self.links {
            Some(links) => resolver.with_link_url_resolver(links.clone()),
            None => resolver,
        }
    }
}

/// Loads the configuration from `explicit_path`, else from
/// [`LOCAL_CONFIG_FILE`] in the working directory, else the defaults.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<Config> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return Config::load(path);
    }

    let local_config = Path::new(LOCAL_CONFIG_FILE);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return Config::load(local_config);
    }

    debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::TypeProvider;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[options]
asset_url_replacement = "https://cdn.example.org"

[links]
broken = "/404"

[links.patterns]
article = "/articles/{url_slug}"

[types.article.fields]
title = "text"
body = { kind = "rich_text", element = "body_copy" }
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = Config::from_toml_str(SAMPLE).expect("valid config");

        assert_eq!(
            config.options.asset_url_replacement.as_deref(),
            Some("https://cdn.example.org")
        );
        assert!(config.options.resolve_links);
        assert!(config.links.is_some());

        let fields = &config.types["article"].fields;
        assert_eq!(fields["title"], FieldConfig::Kind(FieldKind::Text));
        assert_eq!(
            fields["body"],
            FieldConfig::Detailed {
                kind: FieldKind::RichText,
                element: Some("body_copy".to_string()),
            }
        );
    }

    #[test]
    fn test_registry_keeps_field_order_and_bindings() {
        let config = Config::from_toml_str(SAMPLE).expect("valid config");
        let registry = config.registry();

        let article = registry.model_type("article").expect("article type");
        let names: Vec<&str> = article.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["title", "body"]);
        assert_eq!(article.fields()[1].element_name(), Some("body_copy"));
    }

    #[test]
    fn test_unknown_field_kind_is_config_error() {
        let err = Config::from_toml_str("[types.article.fields]\ntitle = \"paragraph\"\n")
            .expect_err("unknown kind");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").expect("empty config");
        assert_eq!(config.options, ResolveOptions::default());
        assert!(config.types.is_empty());
        assert!(config.links.is_none());
    }
}
