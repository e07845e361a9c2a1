//! Asset URL rewriting.

use crate::core::raw::{Asset, InlineImage};

/// Swaps the scheme and authority of asset URLs for a configured prefix.
///
/// `https://assets.example.com/a/b.png` with replacement
/// `https://cdn.example.org` becomes `https://cdn.example.org/a/b.png`.
/// URLs without a scheme are kept as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetUrlRewriter<'a> {
    replacement: Option<&'a str>,
}

impl<'a> AssetUrlRewriter<'a> {
    pub fn new(replacement: Option<&'a str>) -> Self {
        Self { replacement }
    }

    pub fn rewrite_url(&self, url: &str) -> String {
        let Some(replacement) = self.replacement.filter(|r| !r.is_empty()) else {
            return url.to_string();
        };
        let Some(scheme_end) = url.find("://") else {
            return url.to_string();
        };

        let authority_start = scheme_end + 3;
        let path_start = url[authority_start..]
            .find('/')
            .map(|i| authority_start + i)
            .unwrap_or(url.len());

        let base = replacement.trim_end_matches('/');
        format!("{base}{}", &url[path_start..])
    }

    pub fn rewrite_asset(&self, asset: &Asset) -> Asset {
        Asset {
            url: self.rewrite_url(&asset.url),
            ..asset.clone()
        }
    }

    pub fn rewrite_image(&self, image: &InlineImage) -> InlineImage {
        InlineImage {
            url: self.rewrite_url(&image.url),
            ..image.clone()
        }
    }
}
