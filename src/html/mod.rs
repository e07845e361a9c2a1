//! Minimal HTML fragment scanning for rich-text values.
//!
//! Rich text is never re-serialized: everything works on byte spans of the
//! original markup so untouched content comes out byte-identical.

mod fragment;
mod tokenizer;

pub use fragment::{Fragment, Node, NodeKind};
pub use tokenizer::{Attribute, Tag, Token, Tokenizer};
