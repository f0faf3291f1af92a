//! Core types for model interactions

use serde::{Deserialize, Serialize};

/// A structured action call carried by an assistant message.
///
/// `arguments` is the raw JSON payload string exactly as the model produced
/// it; decoding it is the dispatch layer's job, so that a malformed payload
/// surfaces there rather than being silently coerced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCall {
    /// Name of the requested action
    pub name: String,
    /// Raw JSON argument payload
    pub arguments: String,
}

impl ActionCall {
    /// Create a new action call
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One conversational turn. Transcript order is most-recent-last and must
/// never be reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System instruction
    System {
        text: String,
        #[serde(default)]
        timestamp: i64,
    },
    /// Human input
    User {
        text: String,
        #[serde(default)]
        timestamp: i64,
    },
    /// Model output: free text, optionally with a structured action call
    Assistant {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        action_call: Option<ActionCall>,
        #[serde(default)]
        timestamp: i64,
    },
    /// Textual result of an invoked action
    ActionResult {
        action: String,
        text: String,
        #[serde(default)]
        timestamp: i64,
    },
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            text: text.into(),
            timestamp: now_millis(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            text: text.into(),
            timestamp: now_millis(),
        }
    }

    /// Create an assistant message with plain text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            text: text.into(),
            action_call: None,
            timestamp: now_millis(),
        }
    }

    /// Create an assistant message carrying an action call
    pub fn assistant_call(call: ActionCall) -> Self {
        Self::Assistant {
            text: String::new(),
            action_call: Some(call),
            timestamp: now_millis(),
        }
    }

    /// Create an action result message
    pub fn action_result(action: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ActionResult {
            action: action.into(),
            text: text.into(),
            timestamp: now_millis(),
        }
    }

    /// Get the role as a string
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::ActionResult { .. } => "action_result",
        }
    }

    /// Get the text content
    pub fn text(&self) -> &str {
        match self {
            Self::System { text, .. }
            | Self::User { text, .. }
            | Self::Assistant { text, .. }
            | Self::ActionResult { text, .. } => text,
        }
    }

    /// Get the action call if this is an assistant message carrying one
    pub fn action_call(&self) -> Option<&ActionCall> {
        match self {
            Self::Assistant { action_call, .. } => action_call.as_ref(),
            _ => None,
        }
    }
}

/// Definition of an action advertised to the model for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDef {
    /// Action name (unique within an agent's action set)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for the argument payload
    pub parameters: serde_json::Value,
}

impl ActionDef {
    /// Create a new action definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A single model request: system prompt, ordered messages, and the static
/// set of actions the model may call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// System prompt
    pub system_prompt: Option<String>,
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,
    /// Actions available for this request
    pub actions: Vec<ActionDef>,
}

impl ChatRequest {
    /// Create a request with a system prompt
    pub fn with_system(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(system_prompt.into()),
            messages: vec![],
            actions: vec![],
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Advertise an action
    pub fn add_action(&mut self, action: ActionDef) {
        self.actions.push(action);
    }
}
