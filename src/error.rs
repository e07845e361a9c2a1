//! Error types for contentgraph.
//!
//! Resolution itself never fails: missing types, missing elements and
//! dangling references are represented as data in the resolved graph. These
//! errors only come from the boundaries (reading responses and configuration).

use thiserror::Error;

/// Result type for contentgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading inputs or configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Input was not valid JSON.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Error occurred during file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response envelope does not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The requested root item could not be specialized to any model type.
    #[error("Unresolvable item: {0}")]
    Unresolvable(String),
}
