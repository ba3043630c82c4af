//! XML export error types

use thiserror::Error;

/// Result type for XML export operations
pub type XmlResult<T> = std::result::Result<T, XmlError>;

/// Errors that can occur during XML export
#[derive(Debug, Error)]
pub enum XmlError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be rendered with its display format
    #[error("Format error: {0}")]
    Format(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheetlens_core::Error),
}
