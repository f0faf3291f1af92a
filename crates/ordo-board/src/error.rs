//! Error types for ordo-board

use thiserror::Error;

/// Result type alias using ordo-board Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the board API or the index
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("board API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Task not found
    #[error("task not found: {0}")]
    NotFound(String),

    /// A board record is missing an expected property
    #[error("missing property in board record: {0}")]
    MissingProperty(&'static str),

    /// A property value did not parse
    #[error("invalid value for {property}: {value}")]
    InvalidProperty { property: &'static str, value: String },
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
