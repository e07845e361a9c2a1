mod escape;
mod json;

use crate::core::graph::ContentGraph;
use crate::Result;

pub use escape::{escape_html_attr, unescape_html};
pub use json::JsonRenderer;

pub trait Renderer {
    fn render(&self, graph: &ContentGraph) -> Result<String>;
}
