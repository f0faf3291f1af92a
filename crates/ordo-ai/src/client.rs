//! Model client abstraction
//!
//! The orchestration layer is written against this trait; concrete providers
//! live in `providers` and are constructed explicitly and injected, never
//! reached through a global.

use async_trait::async_trait;

use crate::error::Result;
use crate::stream::CompletionStream;
use crate::types::{ChatRequest, Message};

/// A model capability: given ordered messages and a set of callable actions,
/// produce either plain text or a structured action call.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Single-shot completion
    async fn complete(&self, request: &ChatRequest) -> Result<Message>;

    /// Incremental completion, yielding text fragments and a final message
    async fn stream(&self, request: &ChatRequest) -> Result<CompletionStream>;
}
