//! ordo-ai: Model boundary for the ordo assistant
//!
//! This crate provides the chat message types, the `ModelClient` trait that
//! the orchestration layer is written against, and an OpenAI-compatible
//! provider implementation.

pub mod client;
pub mod error;
pub mod providers;
pub mod stream;
pub mod types;

pub use client::ModelClient;
pub use error::{Error, Result};
pub use providers::OpenAiChatClient;
pub use stream::{CompletionEvent, CompletionStream};
pub use types::*;
