//! OpenAI-compatible Chat Completions provider

use async_stream::stream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use crate::client::ModelClient;
use crate::error::{Error, Result};
use crate::stream::{CompletionEvent, CompletionStream};
use crate::types::{ActionCall, ChatRequest, Message};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat Completions client for OpenAI-compatible endpoints
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiChatClient {
    /// Create a new client with an API key and model id
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Create from the OPENAI_API_KEY environment variable
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key, model))
    }

    /// Override the base URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The model id this client sends requests for
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> WireRequest {
        let mut messages = Vec::new();

        if let Some(ref system_prompt) = request.system_prompt {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: Some(system_prompt.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        for msg in &request.messages {
            messages.push(convert_message(msg));
        }

        let tools = if request.actions.is_empty() {
            None
        } else {
            Some(
                request
                    .actions
                    .iter()
                    .map(|a| WireTool {
                        tool_type: "function".to_string(),
                        function: WireFunction {
                            name: a.name.clone(),
                            description: Some(a.description.clone()),
                            parameters: Some(a.parameters.clone()),
                        },
                    })
                    .collect(),
            )
        };

        let has_tools = tools.is_some();
        WireRequest {
            model: self.model.clone(),
            messages,
            stream,
            tools,
            tool_choice: has_tools.then(|| serde_json::json!("auto")),
        }
    }

    fn request_builder(&self, body: &WireRequest) -> reqwest::RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);
        self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
    }
}

#[async_trait::async_trait]
impl ModelClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<Message> {
        let body = self.build_request(request, false);
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            actions = request.actions.len(),
            "requesting completion"
        );
        let response = self.request_builder(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), text));
        }

        let completion: WireCompletion = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("completion had no choices".into()))?;

        Ok(message_from_wire(choice.message))
    }

    async fn stream(&self, request: &ChatRequest) -> Result<CompletionStream> {
        let body = self.build_request(request, true);
        let builder = self.request_builder(&body);

        let event_source = EventSource::new(builder)
            .map_err(|e| Error::Sse(format!("failed to open event source: {e}")))?;

        Ok(Box::pin(create_stream(event_source)))
    }
}

fn convert_message(msg: &Message) -> WireMessage {
    match msg {
        Message::System { text, .. } => WireMessage {
            role: "system".to_string(),
            content: Some(text.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::User { text, .. } => WireMessage {
            role: "user".to_string(),
            content: Some(text.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant { text, action_call, .. } => WireMessage {
            role: "assistant".to_string(),
            content: (!text.is_empty()).then(|| text.clone()),
            tool_calls: action_call.as_ref().map(|call| {
                vec![WireToolCall {
                    id: format!("call_{}", call.name),
                    call_type: "function".to_string(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                }]
            }),
            tool_call_id: None,
        },
        // Action results travel back as tool messages keyed by the action name
        Message::ActionResult { action, text, .. } => WireMessage {
            role: "tool".to_string(),
            content: Some(text.clone()),
            tool_calls: None,
            tool_call_id: Some(format!("call_{action}")),
        },
    }
}

fn message_from_wire(wire: WireResponseMessage) -> Message {
    let call = wire
        .tool_calls
        .and_then(|calls| calls.into_iter().next())
        .map(|tc| ActionCall::new(tc.function.name, tc.function.arguments));

    match call {
        Some(call) => Message::Assistant {
            text: wire.content.unwrap_or_default(),
            action_call: Some(call),
            timestamp: chrono::Utc::now().timestamp_millis(),
        },
        None => Message::assistant(wire.content.unwrap_or_default()),
    }
}

fn create_stream(mut event_source: EventSource) -> impl futures::Stream<Item = CompletionEvent> {
    stream! {
        let mut text = String::new();
        // (name, accumulated arguments) of the first streamed tool call
        let mut call: Option<(String, String)> = None;

        yield CompletionEvent::Start;

        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    if msg.data == "[DONE]" {
                        break;
                    }

                    let chunk: std::result::Result<StreamChunk, _> =
                        serde_json::from_str(&msg.data);
                    match chunk {
                        Ok(chunk) => {
                            for choice in &chunk.choices {
                                if let Some(ref content) = choice.delta.content {
                                    text.push_str(content);
                                    yield CompletionEvent::TextDelta {
                                        delta: content.clone(),
                                    };
                                }

                                if let Some(ref tool_calls) = choice.delta.tool_calls {
                                    for tc in tool_calls {
                                        let entry = call.get_or_insert_with(|| {
                                            (String::new(), String::new())
                                        });
                                        if let Some(ref function) = tc.function {
                                            if let Some(ref name) = function.name {
                                                entry.0 = name.clone();
                                            }
                                            if let Some(ref args) = function.arguments {
                                                entry.1.push_str(args);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            yield CompletionEvent::Error {
                                message: format!("failed to parse chunk: {e}"),
                            };
                            return;
                        }
                    }
                }
                Err(e) => {
                    yield CompletionEvent::Error {
                        message: format!("SSE error: {e}"),
                    };
                    return;
                }
            }
        }

        let message = match call {
            Some((name, arguments)) if !name.is_empty() => Message::Assistant {
                text,
                action_call: Some(ActionCall::new(name, arguments)),
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
            _ => Message::assistant(text),
        };

        yield CompletionEvent::Done { message };
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireCompletion {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    #[allow(dead_code)]
    index: Option<i32>,
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionDef;

    #[test]
    fn test_convert_action_result_to_tool_role() {
        let wire = convert_message(&Message::action_result("add_task", "Added"));
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.content.as_deref(), Some("Added"));
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_add_task"));
    }

    #[test]
    fn test_convert_assistant_with_call() {
        let msg = Message::assistant_call(ActionCall::new("delegate", r#"{"tool":"x"}"#));
        let wire = convert_message(&msg);
        assert_eq!(wire.role, "assistant");
        assert!(wire.content.is_none());
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "delegate");
        assert_eq!(calls[0].function.arguments, r#"{"tool":"x"}"#);
    }

    #[test]
    fn test_message_from_wire_prefers_call() {
        let wire = WireResponseMessage {
            content: None,
            tool_calls: Some(vec![WireToolCall {
                id: "call_1".into(),
                call_type: "function".into(),
                function: WireFunctionCall {
                    name: "get_task_uuid".into(),
                    arguments: r#"{"task_name":"Ship"}"#.into(),
                },
            }]),
        };
        let msg = message_from_wire(wire);
        assert_eq!(msg.action_call().unwrap().name, "get_task_uuid");
    }

    #[test]
    fn test_message_from_wire_plain_text() {
        let wire = WireResponseMessage {
            content: Some("Hello there".into()),
            tool_calls: None,
        };
        let msg = message_from_wire(wire);
        assert!(msg.action_call().is_none());
        assert_eq!(msg.text(), "Hello there");
    }

    #[test]
    fn test_build_request_advertises_actions() {
        let client = OpenAiChatClient::new("key", "gpt-4o-mini");
        let mut request = ChatRequest::with_system("sys");
        request.push(Message::user("hi"));
        request.add_action(ActionDef::new("add_task", "Add a task", serde_json::json!({
            "type": "object",
            "properties": { "task_name": { "type": "string" } },
            "required": ["task_name"]
        })));

        let wire = client.build_request(&request, false);
        assert_eq!(wire.model, "gpt-4o-mini");
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, "system");
        let tools = wire.tools.as_ref().unwrap();
        assert_eq!(tools[0].function.name, "add_task");
        assert_eq!(wire.tool_choice, Some(serde_json::json!("auto")));
    }

    #[test]
    fn test_build_request_without_actions_omits_tools() {
        let client = OpenAiChatClient::new("key", "gpt-4o-mini");
        let mut request = ChatRequest::default();
        request.push(Message::user("hi"));
        let wire = client.build_request(&request, true);
        assert!(wire.tools.is_none());
        assert!(wire.tool_choice.is_none());
        assert!(wire.stream);
    }
}
