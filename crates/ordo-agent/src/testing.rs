//! Shared test support: scripted model and collecting sink

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use ordo_ai::{
    ActionCall, ChatRequest, CompletionEvent, CompletionStream, Message, ModelClient,
};
use parking_lot::Mutex;

use crate::session::ResponseSink;

/// A model client that replays a fixed script of completions and counts how
/// many calls it served. Once the script is exhausted it keeps returning the
/// fallback text "done".
pub struct ScriptedModel {
    completions: Mutex<Vec<Message>>,
    calls: AtomicU32,
    /// Width of streamed text deltas
    chunk_size: usize,
}

impl ScriptedModel {
    pub fn new(completions: Vec<Message>) -> Self {
        Self {
            completions: Mutex::new(completions),
            calls: AtomicU32::new(0),
            chunk_size: 4,
        }
    }

    /// Number of completions served so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    fn next_completion(&self) -> Message {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut script = self.completions.lock();
        if script.is_empty() {
            Message::assistant("done")
        } else {
            script.remove(0)
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, _request: &ChatRequest) -> ordo_ai::Result<Message> {
        Ok(self.next_completion())
    }

    async fn stream(&self, _request: &ChatRequest) -> ordo_ai::Result<CompletionStream> {
        let message = self.next_completion();

        let mut events = vec![CompletionEvent::Start];
        if message.action_call().is_none() {
            let text = message.text().to_string();
            let mut rest = text.as_str();
            while !rest.is_empty() {
                let mut cut = self.chunk_size.min(rest.len());
                while !rest.is_char_boundary(cut) {
                    cut += 1;
                }
                let (chunk, tail) = rest.split_at(cut);
                events.push(CompletionEvent::TextDelta { delta: chunk.to_string() });
                rest = tail;
            }
        }
        events.push(CompletionEvent::Done { message });

        Ok(Box::pin(futures::stream::iter(events)))
    }
}

/// A sink that records every token and done notification
#[derive(Default)]
pub struct CollectingSink {
    text: Mutex<String>,
    tokens: AtomicU32,
    done: AtomicU32,
}

impl CollectingSink {
    /// Concatenated token text
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Number of `on_token` calls
    pub fn tokens(&self) -> u32 {
        self.tokens.load(Ordering::Relaxed)
    }

    /// Number of `on_done` calls
    pub fn done_count(&self) -> u32 {
        self.done.load(Ordering::Relaxed)
    }
}

impl ResponseSink for CollectingSink {
    fn on_token(&self, token: &str) {
        self.tokens.fetch_add(1, Ordering::Relaxed);
        self.text.lock().push_str(token);
    }

    fn on_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }
}

/// Build a top-level delegate completion for the given target and input
pub fn delegate_completion(tool: &str, input: &str) -> Message {
    let arguments = serde_json::json!({ "tool": tool, "tool_input": input }).to_string();
    Message::assistant_call(ActionCall::new("delegate", arguments))
}

/// Build a task-ops completion invoking the named action
pub fn invoke_completion(action: &str, arguments: serde_json::Value) -> Message {
    Message::assistant_call(ActionCall::new(action, arguments.to_string()))
}

/// Convenience wrapper producing an `Arc` scripted model
pub fn scripted(completions: Vec<Message>) -> Arc<ScriptedModel> {
    Arc::new(ScriptedModel::new(completions))
}
