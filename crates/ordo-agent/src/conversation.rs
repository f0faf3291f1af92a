//! Top-level conversation graph
//!
//! Binds the assistant agent to the task-ops graph and the retrieval action.
//! Every delegation loops back into another assistant turn until the agent
//! responds, finishes, or the turn budget runs out. Delegations leave a
//! synthetic call record plus the textual result in the transcript, so the
//! assistant sees what its tools did.

use ordo_ai::{ActionCall, Message};
use serde_json::json;

use crate::action::BoxedAction;
use crate::assistant::{AssistantAgent, AssistantDecision, DelegationTarget};
use crate::error::{Error, Result};
use crate::session::ResponseSink;
use crate::task_ops::TaskOpsGraph;

/// Terminal outcome of one pass through the graph
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The assistant answered the user
    Responded(String),
    /// The assistant ended the conversation (stop marker seen and stripped)
    Finished(String),
    /// The turn budget ran out before a terminal decision
    TurnLimit,
}

/// The fixed, small topology: assistant turn, two delegation targets.
///
/// The turn budget is not part of the graph; the owning session imposes it
/// on every run.
pub struct ConversationGraph {
    assistant: AssistantAgent,
    task_ops: TaskOpsGraph,
    retrieval: BoxedAction,
}

impl ConversationGraph {
    /// Create a graph over the assistant, the task-ops sub-graph, and the
    /// retrieval action
    pub fn new(assistant: AssistantAgent, task_ops: TaskOpsGraph, retrieval: BoxedAction) -> Self {
        Self {
            assistant,
            task_ops,
            retrieval,
        }
    }

    /// Drive the graph to a terminal outcome with at most `max_turns`
    /// assistant turns, appending to `history` as it goes. Messages appended
    /// before a fatal error stay appended; the caller decides whether to
    /// retry the turn.
    pub async fn run(&self, history: &mut Vec<Message>, max_turns: usize) -> Result<TurnOutcome> {
        self.run_inner(history, max_turns, None).await
    }

    /// As `run`, but text fragments of respond/finish completions flow to
    /// the sink. Delegation reasoning is non-streaming and never reaches it.
    pub async fn run_streaming(
        &self,
        history: &mut Vec<Message>,
        max_turns: usize,
        sink: &dyn ResponseSink,
    ) -> Result<TurnOutcome> {
        self.run_inner(history, max_turns, Some(sink)).await
    }

    async fn run_inner(
        &self,
        history: &mut Vec<Message>,
        max_turns: usize,
        sink: Option<&dyn ResponseSink>,
    ) -> Result<TurnOutcome> {
        for turn in 0..max_turns {
            let decision = match sink {
                Some(sink) => self.assistant.decide_streaming(history, sink).await?,
                None => self.assistant.decide(history).await?,
            };

            match decision {
                AssistantDecision::Respond(text) => {
                    history.push(Message::assistant(text.clone()));
                    return Ok(TurnOutcome::Responded(text));
                }
                AssistantDecision::Finish(text) => {
                    history.push(Message::assistant(text.clone()));
                    return Ok(TurnOutcome::Finished(text));
                }
                AssistantDecision::Delegate { target, input } => {
                    tracing::debug!(turn, target = target.name(), "delegating");
                    let result = self.delegate(target, &input).await?;
                    history.push(Message::assistant_call(ActionCall::new(
                        target.name(),
                        json!({ "tool_input": input }).to_string(),
                    )));
                    history.push(Message::action_result(target.name(), result));
                }
            }
        }

        tracing::warn!(max_turns, "turn budget exhausted");
        Ok(TurnOutcome::TurnLimit)
    }

    async fn delegate(&self, target: DelegationTarget, input: &str) -> Result<String> {
        match target {
            DelegationTarget::TaskOps => self.task_ops.run(input).await,
            DelegationTarget::Retrieval => {
                // An empty retrieval query is invalid by construction.
                if input.trim().is_empty() {
                    return Err(Error::Validation(
                        "cannot run retrieval with an empty query".into(),
                    ));
                }
                let arguments = json!({ "input": input });
                match self.retrieval.invoke(arguments).await {
                    Ok(text) => Ok(text),
                    Err(Error::ActionInvocation { action, source }) => {
                        tracing::warn!("action '{action}' failed: {source}");
                        Ok(format!("Action '{action}' failed: {source}"))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionSet};
    use crate::assistant::{RETRIEVAL_ACTION, TASK_OPS_ACTION};
    use crate::prompts::STOP_MARKER;
    use crate::task_ops::TaskOpsAgent;
    use crate::testing::{ScriptedModel, delegate_completion, invoke_completion, scripted};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RecordingRetrieval {
        count: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Action for RecordingRetrieval {
        fn name(&self) -> &str {
            RETRIEVAL_ACTION
        }
        fn description(&self) -> &str {
            "Answer questions about a task"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": { "input": { "type": "string" } },
                "required": ["input"]
            })
        }
        async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
            self.count.fetch_add(1, Ordering::Relaxed);
            let query = arguments.get("input").and_then(|v| v.as_str()).unwrap_or("");
            Ok(format!("retrieved: {query}"))
        }
    }

    struct EchoOp;

    #[async_trait]
    impl Action for EchoOp {
        fn name(&self) -> &str {
            "add_task"
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({ "type": "object" })
        }
        async fn invoke(&self, _arguments: serde_json::Value) -> Result<String> {
            Ok("Added \"Ship\" task to board with id=\"7\"".to_string())
        }
    }

    fn build(
        assistant_model: Arc<ScriptedModel>,
        ops_model: Arc<ScriptedModel>,
    ) -> (ConversationGraph, Arc<AtomicU32>) {
        let retrieval_count = Arc::new(AtomicU32::new(0));
        let graph = ConversationGraph::new(
            AssistantAgent::new(assistant_model),
            TaskOpsGraph::new(
                TaskOpsAgent::new(ops_model),
                ActionSet::new(vec![Arc::new(EchoOp)]),
            ),
            Arc::new(RecordingRetrieval {
                count: retrieval_count.clone(),
            }),
        );
        (graph, retrieval_count)
    }

    #[tokio::test]
    async fn test_respond_is_terminal_and_appended() {
        let assistant = scripted(vec![Message::assistant("Hello!")]);
        let ops = scripted(vec![]);
        let (graph, _) = build(assistant.clone(), ops);

        let mut history = vec![Message::user("hi")];
        let outcome = graph.run(&mut history, 10).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Responded("Hello!".into()));
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text(), "Hello!");
        assert_eq!(assistant.calls(), 1);
    }

    #[tokio::test]
    async fn test_finish_without_delegation() {
        let assistant = scripted(vec![Message::assistant(format!("{STOP_MARKER}Bye"))]);
        let ops = scripted(vec![]);
        let (graph, retrievals) = build(assistant, ops);

        let mut history = vec![Message::user("goodbye")];
        let outcome = graph.run(&mut history, 10).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Finished("Bye".into()));
        assert_eq!(retrievals.load(Ordering::Relaxed), 0, "no delegation");
        assert_eq!(history[1].text(), "Bye", "marker stripped in transcript");
    }

    #[tokio::test]
    async fn test_task_ops_delegation_loops_back() {
        let assistant = scripted(vec![
            delegate_completion(TASK_OPS_ACTION, "add a task named Ship"),
            Message::assistant("Added the Ship task for you."),
        ]);
        let ops = scripted(vec![invoke_completion("add_task", json!({}))]);
        let (graph, _) = build(assistant.clone(), ops.clone());

        let mut history = vec![Message::user("add Ship")];
        let outcome = graph.run(&mut history, 10).await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Responded("Added the Ship task for you.".into())
        );
        assert_eq!(assistant.calls(), 2, "delegation loops back to assistant");
        assert_eq!(ops.calls(), 1);

        // user, delegation record, action result, final response
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].action_call().unwrap().name, TASK_OPS_ACTION);
        assert_eq!(history[2].role(), "action_result");
        assert!(history[2].text().contains("Added \"Ship\""));
    }

    #[tokio::test]
    async fn test_retrieval_delegation() {
        let assistant = scripted(vec![
            delegate_completion(RETRIEVAL_ACTION, "status of Ship"),
            Message::assistant("Ship is in progress."),
        ]);
        let ops = scripted(vec![]);
        let (graph, retrievals) = build(assistant, ops);

        let mut history = vec![Message::user("how is Ship doing?")];
        let outcome = graph.run(&mut history, 10).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Responded("Ship is in progress.".into()));
        assert_eq!(retrievals.load(Ordering::Relaxed), 1);
        assert!(history[2].text().contains("retrieved: status of Ship"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_query_is_validation_error() {
        let assistant = scripted(vec![delegate_completion(RETRIEVAL_ACTION, "   ")]);
        let ops = scripted(vec![]);
        let (graph, retrievals) = build(assistant, ops);

        let mut history = vec![Message::user("?")];
        let err = graph.run(&mut history, 10).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(retrievals.load(Ordering::Relaxed), 0);
        // History before the failure is intact.
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_turn_limit_is_graceful() {
        let completions = (0..20)
            .map(|i| delegate_completion(RETRIEVAL_ACTION, &format!("query {i}")))
            .collect();
        let assistant = scripted(completions);
        let ops = scripted(vec![]);
        let (graph, retrievals) = build(assistant.clone(), ops);

        let mut history = vec![Message::user("loop")];
        let outcome = graph.run(&mut history, 4).await.unwrap();

        assert_eq!(outcome, TurnOutcome::TurnLimit);
        assert_eq!(assistant.calls(), 4);
        assert_eq!(retrievals.load(Ordering::Relaxed), 4);
    }
}
