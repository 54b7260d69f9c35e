//! Error types for Siteview

use thiserror::Error;

/// The main error type for Siteview operations
#[derive(Debug, Error)]
pub enum SiteviewError {
    #[error("Spatial structure unavailable: {0}")]
    ImportUnavailable(String),

    #[error("Property lookup failed for element {element}: {reason}")]
    PropertyLookup { element: u64, reason: String },

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

/// Result type alias for Siteview operations
pub type Result<T> = std::result::Result<T, SiteviewError>;

impl From<serde_json::Error> for SiteviewError {
    fn from(err: serde_json::Error) -> Self {
        SiteviewError::Json(err.to_string())
    }
}
