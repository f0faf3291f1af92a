//! Error types for ordo-agent

use thiserror::Error;

/// Result type alias using ordo-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a conversation turn
#[derive(Error, Debug)]
pub enum Error {
    /// The model call failed
    #[error(transparent)]
    Model(#[from] ordo_ai::Error),

    /// An invoked action failed. Graph nodes absorb this variant into an
    /// action-result message so the turn survives; it only escapes if a node
    /// forgets to.
    #[error("action '{action}' failed: {source}")]
    ActionInvocation {
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The model output could not be decoded into a dispatch decision.
    /// Fatal for the turn; propagated to the caller of step/stream.
    #[error("could not parse model output: {0}")]
    Parse(String),

    /// A delegation received an input it rejects by construction.
    /// Fatal for the turn, like `Parse`.
    #[error("invalid delegation input: {0}")]
    Validation(String),
}

impl Error {
    /// Create an action invocation error
    pub fn invocation(
        action: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ActionInvocation {
            action: action.into(),
            source: source.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
