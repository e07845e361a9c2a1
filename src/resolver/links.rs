//! Content-item link resolution inside rich text.

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::core::raw::ContentLink;
use crate::html::{Token, Tokenizer};
use crate::render::escape_html_attr;

/// Caller-supplied policy turning content links into URLs.
pub trait LinkUrlResolver: Send + Sync {
    /// URL for a link to an existing item, or `None` if it cannot be built.
    fn resolve_link_url(&self, link: &ContentLink) -> Option<String>;

    /// URL used when [`resolve_link_url`](Self::resolve_link_url) yields nothing.
    fn resolve_broken_link_url(&self) -> Option<String> {
        None
    }
}

/// Rewrites `href` of anchors that carry a `data-item-id`.
pub struct LinkResolver<'r> {
    urls: &'r dyn LinkUrlResolver,
}

impl<'r> LinkResolver<'r> {
    pub fn new(urls: &'r dyn LinkUrlResolver) -> Self {
        Self { urls }
    }

    /// Returns `fragment` with every known link pointed at its resolved URL.
    ///
    /// Anchors whose id is not in `links` are left untouched, and so are
    /// known links for which the policy yields neither a URL nor a
    /// broken-link URL.
    pub fn resolve_links(&self, fragment: &str, links: &IndexMap<String, ContentLink>) -> String {
        let mut edits: Vec<(std::ops::Range<usize>, String)> = Vec::new();

        for token in Tokenizer::new(fragment) {
            let Token::StartTag(tag) = token else {
                continue;
            };
            if tag.name != "a" {
                continue;
            }
            let Some(link) = tag.attr("data-item-id").and_then(|id| links.get(id)) else {
                continue;
            };

            let url = self.urls.resolve_link_url(link).or_else(|| {
                debug!(
                    codename = link.codename.as_str();
                    "Link URL unresolved, using broken link URL"
                );
                self.urls.resolve_broken_link_url()
            });
            let Some(url) = url else {
                continue;
            };

            let href = format!("href=\"{}\"", escape_html_attr(&url));
            match tag.attribute("href") {
                Some(existing) => edits.push((existing.span.clone(), href)),
                None => {
                    let at = tag.span.start + 2;
                    edits.push((at..at, format!(" {href}")));
                }
            }
        }

        if edits.is_empty() {
            return fragment.to_string();
        }

        let mut out = String::with_capacity(fragment.len());
        let mut last = 0;
        for (span, replacement) in edits {
            out.push_str(&fragment[last..span.start]);
            out.push_str(&replacement);
            last = span.end;
        }
        out.push_str(&fragment[last..]);
        out
    }
}

/// [`LinkUrlResolver`] building URLs from per-type templates.
///
/// Templates may use `{codename}`, `{url_slug}`, `{type}` and `{id}`. A
/// template referencing `{url_slug}` yields nothing for links without a slug.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternLinkUrlResolver {
    #[serde(default)]
    patterns: IndexMap<String, String>,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    broken: Option<String>,
}

impl PatternLinkUrlResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(
        mut self,
        item_type: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.patterns.insert(item_type.into(), template.into());
        self
    }

    pub fn with_default(mut self, template: impl Into<String>) -> Self {
        self.default = Some(template.into());
        self
    }

    pub fn with_broken_link(mut self, url: impl Into<String>) -> Self {
        self.broken = Some(url.into());
        self
    }
}

impl LinkUrlResolver for PatternLinkUrlResolver {
    fn resolve_link_url(&self, link: &ContentLink) -> Option<String> {
        let template = self
            .patterns
            .get(&link.item_type)
            .or(self.default.as_ref())?;

        let slug = link.url_slug.as_deref().filter(|slug| !slug.is_empty());
        if template.contains("{url_slug}") && slug.is_none() {
            return None;
        }

        Some(
            template
                .replace("{codename}", &link.codename)
                .replace("{url_slug}", slug.unwrap_or_default())
                .replace("{type}", &link.item_type)
                .replace("{id}", &link.id),
        )
    }

    fn resolve_broken_link_url(&self) -> Option<String> {
        self.broken.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn links() -> IndexMap<String, ContentLink> {
        let mut links = IndexMap::new();
        links.insert(
            "d1".to_string(),
            ContentLink {
                id: "d1".to_string(),
                codename: "coffee_processing".to_string(),
                item_type: "article".to_string(),
                url_slug: Some("coffee-processing".to_string()),
            },
        );
        links.insert(
            "d2".to_string(),
            ContentLink {
                id: "d2".to_string(),
                codename: "brewer".to_string(),
                item_type: "product".to_string(),
                url_slug: None,
            },
        );
        links
    }

    #[test]
    fn test_known_links_are_resolved_and_escaped() {
        let urls = PatternLinkUrlResolver::new()
            .with_pattern("article", "/articles/{url_slug}?a=1&b=2");
        let resolver = LinkResolver::new(&urls);

        let html = resolver.resolve_links(
            r#"<p><a data-item-id="d1" href="">Read</a> or <a href="https://example.com">out</a></p>"#,
            &links(),
        );

        assert_eq!(
            html,
            r#"<p><a data-item-id="d1" href="/articles/coffee-processing?a=1&amp;b=2">Read</a> or <a href="https://example.com">out</a></p>"#
        );
    }

    #[test]
    fn test_unresolvable_link_falls_back_to_broken_url() {
        let urls = PatternLinkUrlResolver::new()
            .with_default("/{type}/{url_slug}")
            .with_broken_link("/404");
        let resolver = LinkResolver::new(&urls);

        let html = resolver.resolve_links(r#"<a data-item-id="d2">Brewer</a>"#, &links());

        assert_eq!(html, r#"<a href="/404" data-item-id="d2">Brewer</a>"#);
    }

    #[test]
    fn test_unknown_ids_and_empty_policy_leave_markup_untouched() {
        let urls = PatternLinkUrlResolver::new();
        let resolver = LinkResolver::new(&urls);
        let source = r#"<a data-item-id="d1" href="">x</a><a data-item-id="zz" href="">y</a>"#;

        assert_eq!(resolver.resolve_links(source, &links()), source);
    }
}
