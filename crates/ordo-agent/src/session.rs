//! Conversation session: per-session history and the turn-taking protocol

use std::sync::Arc;

use ordo_ai::Message;
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationGraph, TurnOutcome};
use crate::error::Result;
use crate::prompts::{DEFAULT_FINAL_MESSAGE, INTRODUCTION_INSTRUCTION, MAX_TURNS_MESSAGE};

/// Receives the incremental output of a streaming turn.
///
/// The session pushes to the sink synchronously while it walks the graph;
/// the caller's event loop provides the suspension points.
pub trait ResponseSink: Send + Sync {
    /// A text fragment of the final respond step became available
    fn on_token(&self, token: &str);

    /// The stream is finished; fired exactly once per streaming turn
    fn on_done(&self);
}

/// One user-visible assistant response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub content: String,
    pub is_final: bool,
}

impl AssistantResponse {
    /// A non-final response
    pub fn partial(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: false,
        }
    }

    /// A final response; empty content falls back to the default final
    /// message so it is never blank
    pub fn final_response(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            content: if content.is_empty() {
                DEFAULT_FINAL_MESSAGE.to_string()
            } else {
                content
            },
            is_final: true,
        }
    }
}

/// What happens to the owned history when new external input arrives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Keep the transcript across turns (recommended; retains context)
    #[default]
    Persist,
    /// Clear the transcript on each external input (legacy behavior)
    ResetOnInput,
}

/// Session-level configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum assistant turns per external input
    pub max_turns: usize,
    /// History lifecycle strategy
    pub history: HistoryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            history: HistoryPolicy::Persist,
        }
    }
}

/// Owns one conversation's history and drives one graph pass per turn.
///
/// Turns on a single session are strictly sequential; the session store
/// wraps each session in an async mutex to enforce that. A fatal turn error
/// leaves the history appended so far intact, so the caller may retry the
/// same input.
pub struct ConversationSession {
    graph: Arc<ConversationGraph>,
    config: SessionConfig,
    history: Vec<Message>,
    finished: bool,
}

impl ConversationSession {
    /// Create a session over a shared graph
    pub fn new(graph: Arc<ConversationGraph>, config: SessionConfig) -> Self {
        Self {
            graph,
            config,
            history: Vec::new(),
            finished: false,
        }
    }

    /// The transcript so far, oldest first
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Whether this conversation already produced a final response
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append a human message without stepping the graph. Under
    /// `ResetOnInput` this starts a fresh transcript first.
    pub fn add_human_input(&mut self, text: impl Into<String>) {
        if self.config.history == HistoryPolicy::ResetOnInput {
            self.history.clear();
        }
        self.history.push(Message::user(text));
    }

    /// Produce the assistant's opening message. A fresh session has no
    /// messages yet, and the graph needs at least one to run cleanly, so an
    /// introduction instruction is seeded first.
    pub async fn init(&mut self) -> Result<AssistantResponse> {
        if self.finished {
            return Ok(AssistantResponse::final_response(""));
        }
        if self.history.is_empty() {
            self.history.push(Message::system(INTRODUCTION_INSTRUCTION));
        }
        self.drive(None).await
    }

    /// One synchronous turn: append the input, run the graph to a terminal
    /// outcome, return the user-visible response. A finished conversation
    /// accepts no further routing and answers with the final message again.
    pub async fn step(&mut self, input: &str) -> Result<AssistantResponse> {
        if self.finished {
            return Ok(AssistantResponse::final_response(""));
        }
        self.add_human_input(input);
        self.drive(None).await
    }

    /// One streaming turn: as `step`, but fragments of the final respond
    /// step flow to the sink, and `on_done` fires before this returns.
    pub async fn stream(
        &mut self,
        input: &str,
        sink: &dyn ResponseSink,
    ) -> Result<AssistantResponse> {
        if self.finished {
            sink.on_done();
            return Ok(AssistantResponse::final_response(""));
        }
        self.add_human_input(input);
        let response = self.drive(Some(sink)).await?;
        sink.on_done();
        Ok(response)
    }

    async fn drive(&mut self, sink: Option<&dyn ResponseSink>) -> Result<AssistantResponse> {
        let graph = Arc::clone(&self.graph);
        let max_turns = self.config.max_turns;
        let outcome = match sink {
            Some(sink) => {
                graph
                    .run_streaming(&mut self.history, max_turns, sink)
                    .await?
            }
            None => graph.run(&mut self.history, max_turns).await?,
        };

        Ok(match outcome {
            TurnOutcome::Responded(text) => AssistantResponse::partial(text),
            TurnOutcome::Finished(text) => {
                self.finished = true;
                AssistantResponse::final_response(text)
            }
            TurnOutcome::TurnLimit => AssistantResponse::partial(MAX_TURNS_MESSAGE),
        })
    }
}
