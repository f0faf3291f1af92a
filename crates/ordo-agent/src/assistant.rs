//! Top-level assistant agent
//!
//! Given the full conversation history, asks the model to respond directly,
//! delegate to the task-ops graph or the retrieval action, or end the
//! conversation with the stop marker. The model is bound to a single
//! `delegate` function over the fixed target set; everything else it says is
//! a direct response.

use std::sync::Arc;

use futures::StreamExt;
use ordo_ai::{ActionDef, ChatRequest, CompletionEvent, Message, ModelClient};
use serde_json::{Map, Value, json};

use crate::dispatch::{DispatchDecision, MarkerFilter, parse_completion};
use crate::error::{Error, Result};
use crate::prompts;
use crate::session::ResponseSink;

/// Name of the task-ops delegation target
pub const TASK_OPS_ACTION: &str = "todo_api_call";
/// Name of the retrieval delegation target
pub const RETRIEVAL_ACTION: &str = "todo_query";

const DELEGATE_FUNCTION: &str = "delegate";

/// Where a delegation hands control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationTarget {
    TaskOps,
    Retrieval,
}

impl DelegationTarget {
    /// The action name advertised to the model
    pub fn name(&self) -> &'static str {
        match self {
            DelegationTarget::TaskOps => TASK_OPS_ACTION,
            DelegationTarget::Retrieval => RETRIEVAL_ACTION,
        }
    }

    /// Resolve an advertised action name
    pub fn from_name(name: &str) -> Option<DelegationTarget> {
        match name {
            TASK_OPS_ACTION => Some(DelegationTarget::TaskOps),
            RETRIEVAL_ACTION => Some(DelegationTarget::Retrieval),
            _ => None,
        }
    }
}

/// The assistant agent's routing decision for one turn
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantDecision {
    /// Answer the user directly
    Respond(String),
    /// Hand the input to a delegation target
    Delegate {
        target: DelegationTarget,
        input: String,
    },
    /// End the conversation; carries the final text, never empty
    Finish(String),
}

/// Top-level dispatcher agent
pub struct AssistantAgent {
    model: Arc<dyn ModelClient>,
    system_prompt: String,
}

impl AssistantAgent {
    /// Create an agent with the default system prompt
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            system_prompt: prompts::assistant_system_prompt(),
        }
    }

    /// Override the system prompt (the contract in `prompts` still applies)
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn request(&self, messages: &[Message]) -> ChatRequest {
        ChatRequest {
            system_prompt: Some(self.system_prompt.clone()),
            messages: messages.to_vec(),
            actions: vec![delegate_def()],
        }
    }

    /// One non-streaming decision over the current history
    pub async fn decide(&self, messages: &[Message]) -> Result<AssistantDecision> {
        let completion = self.model.complete(&self.request(messages)).await?;
        map_decision(parse_completion(&completion)?)
    }

    /// One streaming decision: text fragments flow to the sink with the stop
    /// marker suppressed, and the assembled completion yields the same
    /// decision `decide` would have produced.
    pub async fn decide_streaming(
        &self,
        messages: &[Message],
        sink: &dyn ResponseSink,
    ) -> Result<AssistantDecision> {
        let mut stream = self.model.stream(&self.request(messages)).await?;
        let mut filter = MarkerFilter::new();
        let mut completion = None;

        while let Some(event) = stream.next().await {
            match event {
                CompletionEvent::Start => {}
                CompletionEvent::TextDelta { delta } => {
                    let safe = filter.feed(&delta);
                    if !safe.is_empty() {
                        sink.on_token(&safe);
                    }
                }
                CompletionEvent::Done { message } => {
                    completion = Some(message);
                }
                CompletionEvent::Error { message } => {
                    return Err(Error::Model(ordo_ai::Error::Sse(message)));
                }
            }
        }

        let rest = filter.finish();
        if !rest.is_empty() {
            sink.on_token(&rest);
        }

        let completion = completion.ok_or_else(|| {
            Error::Model(ordo_ai::Error::UnexpectedResponse(
                "stream ended without a final message".into(),
            ))
        })?;
        map_decision(parse_completion(&completion)?)
    }
}

fn delegate_def() -> ActionDef {
    ActionDef::new(
        DELEGATE_FUNCTION,
        "Select a tool to hand the request to",
        json!({
            "type": "object",
            "properties": {
                "tool": {
                    "type": "string",
                    "enum": [TASK_OPS_ACTION, RETRIEVAL_ACTION],
                    "description": "The tool to delegate to"
                },
                "tool_input": {
                    "type": "string",
                    "description": "Maximum one sentence, what the tool should do"
                }
            },
            "required": ["tool", "tool_input"]
        }),
    )
}

fn map_decision(decision: DispatchDecision) -> Result<AssistantDecision> {
    match decision {
        DispatchDecision::Respond(text) => Ok(AssistantDecision::Respond(text)),
        DispatchDecision::Finish(text) => Ok(AssistantDecision::Finish(text)),
        DispatchDecision::Invoke { action, arguments } => {
            if action != DELEGATE_FUNCTION {
                return Err(Error::parse(format!(
                    "assistant requested unknown function '{action}'"
                )));
            }
            let target = field(&arguments, "tool")?;
            let target = DelegationTarget::from_name(target).ok_or_else(|| {
                Error::parse(format!("assistant requested unknown tool '{target}'"))
            })?;
            let input = field(&arguments, "tool_input")?.to_string();
            Ok(AssistantDecision::Delegate { target, input })
        }
    }
}

fn field<'a>(arguments: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::parse(format!("delegate call is missing '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::STOP_MARKER;
    use crate::testing::{CollectingSink, ScriptedModel, delegate_completion};
    use ordo_ai::ActionCall;

    #[tokio::test]
    async fn test_decide_respond() {
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant("Hi there")]));
        let agent = AssistantAgent::new(model.clone());
        let decision = agent.decide(&[Message::user("hello")]).await.unwrap();
        assert_eq!(decision, AssistantDecision::Respond("Hi there".into()));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_decide_delegate() {
        let model = Arc::new(ScriptedModel::new(vec![delegate_completion(
            TASK_OPS_ACTION,
            "add a task named Ship",
        )]));
        let agent = AssistantAgent::new(model);
        let decision = agent.decide(&[Message::user("add Ship")]).await.unwrap();
        assert_eq!(
            decision,
            AssistantDecision::Delegate {
                target: DelegationTarget::TaskOps,
                input: "add a task named Ship".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_decide_finish() {
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant(format!(
            "{STOP_MARKER}Bye"
        ))]));
        let agent = AssistantAgent::new(model);
        let decision = agent.decide(&[Message::user("goodbye")]).await.unwrap();
        assert_eq!(decision, AssistantDecision::Finish("Bye".into()));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_parse_error() {
        let model = Arc::new(ScriptedModel::new(vec![delegate_completion(
            "web_search",
            "anything",
        )]));
        let agent = AssistantAgent::new(model);
        let err = agent.decide(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_tool_input_is_parse_error() {
        let call = ActionCall::new(DELEGATE_FUNCTION, r#"{"tool": "todo_query"}"#);
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant_call(call)]));
        let agent = AssistantAgent::new(model);
        let err = agent.decide(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_streaming_filters_marker_and_decides() {
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant(format!(
            "{STOP_MARKER}See you soon"
        ))]));
        let agent = AssistantAgent::new(model);
        let sink = CollectingSink::default();

        let decision = agent
            .decide_streaming(&[Message::user("bye")], &sink)
            .await
            .unwrap();

        assert_eq!(decision, AssistantDecision::Finish("See you soon".into()));
        assert_eq!(sink.text(), "See you soon");
        assert!(!sink.text().contains(STOP_MARKER));
    }

    #[tokio::test]
    async fn test_streaming_plain_response_reaches_sink() {
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant(
            "All three tasks are done",
        )]));
        let agent = AssistantAgent::new(model);
        let sink = CollectingSink::default();

        let decision = agent
            .decide_streaming(&[Message::user("status?")], &sink)
            .await
            .unwrap();

        assert_eq!(
            decision,
            AssistantDecision::Respond("All three tasks are done".into())
        );
        assert_eq!(sink.text(), "All three tasks are done");
        assert!(sink.tokens() > 1, "expected incremental deltas");
    }
}
