//! Data model shared by the resolver: raw input, model descriptions and output.

pub mod blocks;
pub mod graph;
pub mod model;
pub mod raw;
