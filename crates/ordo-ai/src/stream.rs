//! Streaming event types

use crate::types::Message;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while a completion streams in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionEvent {
    /// Streaming started
    Start,
    /// Text content delta
    TextDelta { delta: String },
    /// Completion finished; carries the fully assembled message
    Done { message: Message },
    /// Error occurred; the stream ends after this event
    Error { message: String },
}

impl CompletionEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Get the final message if this is a Done event
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Done { message } => Some(message),
            _ => None,
        }
    }
}

/// A stream of completion events
pub type CompletionStream = Pin<Box<dyn Stream<Item = CompletionEvent> + Send>>;
