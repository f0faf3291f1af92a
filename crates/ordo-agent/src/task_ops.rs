//! Task-ops sub-agent and graph
//!
//! The sub-agent picks one CRUD action or the name→id lookup per turn; the
//! graph binds it to the action set. CRUD actions are leaves: their result is
//! the graph's output. The lookup action routes: a not-found result ends the
//! graph with the sentinel surfaced verbatim, a found id re-enters the agent
//! turn so the real CRUD call can be issued with the resolved id.

use std::sync::Arc;

use ordo_ai::{ActionCall, ActionDef, ChatRequest, Message, ModelClient};
use serde_json::{Map, Value};

use crate::action::ActionSet;
use crate::dispatch::{DispatchDecision, parse_completion};
use crate::error::{Error, Result};
use crate::prompts::{self, TASK_OPS_STEP_LIMIT_MESSAGE};

/// Name of the name→id lookup action
pub const LOOKUP_ACTION: &str = "get_task_uuid";

/// Sentinel the lookup action returns when no task matches. The graph treats
/// it as a terminal condition distinct from a successful lookup.
pub const NO_TASK_FOUND: &str = "<NO TASK FOUND>";

const DEFAULT_MAX_STEPS: usize = 10;

/// The sub-agent's decision for one graph step
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOpsDecision {
    /// Invoke one of the advertised actions
    Invoke {
        action: String,
        arguments: Map<String, Value>,
    },
    /// Plain text fallback; not expected in normal flow but handled
    Respond(String),
}

/// Task-API sub-agent
pub struct TaskOpsAgent {
    model: Arc<dyn ModelClient>,
    system_prompt: String,
}

impl TaskOpsAgent {
    /// Create an agent with the default system prompt
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            system_prompt: prompts::task_ops_system_prompt(),
        }
    }

    /// Override the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Pick one action (or fall back to text) given the sub-conversation
    pub async fn decide(
        &self,
        messages: &[Message],
        actions: &[ActionDef],
    ) -> Result<TaskOpsDecision> {
        let request = ChatRequest {
            system_prompt: Some(self.system_prompt.clone()),
            messages: messages.to_vec(),
            actions: actions.to_vec(),
        };
        let completion = self.model.complete(&request).await?;

        Ok(match parse_completion(&completion)? {
            DispatchDecision::Invoke { action, arguments } => {
                TaskOpsDecision::Invoke { action, arguments }
            }
            DispatchDecision::Respond(text) => TaskOpsDecision::Respond(text),
            // A stray stop marker in a sub-agent completion has no routing
            // meaning here; surface the remaining text.
            DispatchDecision::Finish(text) => TaskOpsDecision::Respond(text),
        })
    }
}

/// State machine binding the sub-agent to the CRUD actions and the lookup
pub struct TaskOpsGraph {
    agent: TaskOpsAgent,
    actions: ActionSet,
    max_steps: usize,
}

impl TaskOpsGraph {
    /// Create a graph over the given action set
    pub fn new(agent: TaskOpsAgent, actions: ActionSet) -> Self {
        Self {
            agent,
            actions,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Bound the lookup→agent cycle (defaults to 10)
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Run one task operation to completion, returning its textual result
    pub async fn run(&self, input: &str) -> Result<String> {
        let defs = self.actions.defs();
        let mut messages = vec![Message::user(input)];

        for step in 0..self.max_steps {
            let decision = self.agent.decide(&messages, &defs).await?;

            let (action, arguments) = match decision {
                TaskOpsDecision::Respond(text) => return Ok(text),
                TaskOpsDecision::Invoke { action, arguments } => (action, arguments),
            };

            let payload = Value::Object(arguments);
            let result = match self.actions.invoke(&action, payload.clone()).await {
                Ok(text) => text,
                Err(Error::ActionInvocation { action, source }) => {
                    tracing::warn!("action '{action}' failed: {source}");
                    format!("Action '{action}' failed: {source}")
                }
                Err(e) => return Err(e),
            };

            if action == LOOKUP_ACTION && result != NO_TASK_FOUND {
                tracing::debug!(step, "lookup resolved, re-entering agent turn");
                messages.push(Message::assistant_call(ActionCall::new(
                    &action,
                    payload.to_string(),
                )));
                messages.push(Message::action_result(&action, &result));
                continue;
            }

            // CRUD actions and failed lookups are terminal.
            return Ok(result);
        }

        tracing::warn!(max_steps = self.max_steps, "task-ops step budget exhausted");
        Ok(TASK_OPS_STEP_LIMIT_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, BoxedAction};
    use crate::testing::{ScriptedModel, invoke_completion, scripted};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Returns a fixed reply (or a fixed failure) and counts invocations.
    struct StubAction {
        action_name: String,
        reply: String,
        fail: bool,
        count: Arc<AtomicU32>,
    }

    impl StubAction {
        fn new(name: &str, reply: &str) -> (BoxedAction, Arc<AtomicU32>) {
            let count = Arc::new(AtomicU32::new(0));
            let action = Arc::new(Self {
                action_name: name.into(),
                reply: reply.into(),
                fail: false,
                count: count.clone(),
            });
            (action, count)
        }

        fn failing(name: &str, message: &str) -> (BoxedAction, Arc<AtomicU32>) {
            let count = Arc::new(AtomicU32::new(0));
            let action = Arc::new(Self {
                action_name: name.into(),
                reply: message.into(),
                fail: true,
                count: count.clone(),
            });
            (action, count)
        }
    }

    #[async_trait]
    impl Action for StubAction {
        fn name(&self) -> &str {
            &self.action_name
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({ "type": "object" })
        }
        async fn invoke(&self, _arguments: serde_json::Value) -> Result<String> {
            self.count.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                Err(Error::invocation(self.name(), self.reply.clone()))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    fn graph(model: Arc<ScriptedModel>, actions: Vec<BoxedAction>) -> TaskOpsGraph {
        TaskOpsGraph::new(TaskOpsAgent::new(model), ActionSet::new(actions))
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_terminal() {
        let model = scripted(vec![invoke_completion(
            LOOKUP_ACTION,
            json!({ "task_name": "Ghost" }),
        )]);
        let (lookup, lookups) = StubAction::new(LOOKUP_ACTION, NO_TASK_FOUND);

        let result = graph(model.clone(), vec![lookup])
            .run("delete the Ghost task")
            .await
            .unwrap();

        assert_eq!(result, NO_TASK_FOUND, "sentinel must surface verbatim");
        assert_eq!(model.calls(), 1, "exactly one model call");
        assert_eq!(lookups.load(Ordering::Relaxed), 1, "exactly one lookup");
    }

    #[tokio::test]
    async fn test_lookup_then_crud() {
        let model = scripted(vec![
            invoke_completion(LOOKUP_ACTION, json!({ "task_name": "Ship" })),
            invoke_completion(
                "update_task",
                json!({ "task_id": "42", "task_params": "{\"status\": \"Done\"}" }),
            ),
        ]);
        let (lookup, lookups) = StubAction::new(LOOKUP_ACTION, "Task id: \"42\"");
        let (update, updates) = StubAction::new("update_task", "Updated task with id=\"42\"");

        let result = graph(model.clone(), vec![lookup, update])
            .run("mark Ship as done")
            .await
            .unwrap();

        assert_eq!(result, "Updated task with id=\"42\"");
        assert_eq!(model.calls(), 2, "exactly two model calls");
        assert_eq!(lookups.load(Ordering::Relaxed), 1);
        assert_eq!(updates.load(Ordering::Relaxed), 1, "exactly one CRUD call");
    }

    #[tokio::test]
    async fn test_crud_is_terminal_without_lookup() {
        let model = scripted(vec![invoke_completion(
            "add_task",
            json!({ "task_name": "Ship", "task_params": "{}" }),
        )]);
        let (add, adds) = StubAction::new("add_task", "Added \"Ship\" task to board with id=\"7\"");

        let result = graph(model.clone(), vec![add]).run("add Ship").await.unwrap();

        assert_eq!(result, "Added \"Ship\" task to board with id=\"7\"");
        assert_eq!(model.calls(), 1);
        assert_eq!(adds.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_plain_text_fallback() {
        let model = scripted(vec![Message::assistant("I cannot do that")]);
        let (add, _) = StubAction::new("add_task", "unused");

        let result = graph(model, vec![add]).run("do something odd").await.unwrap();
        assert_eq!(result, "I cannot do that");
    }

    #[tokio::test]
    async fn test_action_failure_is_narrated() {
        let model = scripted(vec![invoke_completion(
            "delete_task",
            json!({ "task_id": "7" }),
        )]);
        let (delete, _) = StubAction::failing("delete_task", "board unreachable");

        let result = graph(model, vec![delete]).run("delete task 7").await.unwrap();
        assert!(result.contains("'delete_task' failed"), "got: {result}");
        assert!(result.contains("board unreachable"));
    }

    #[tokio::test]
    async fn test_repeated_lookup_hits_step_cap() {
        // The model keeps asking for the same lookup and the lookup keeps
        // succeeding, so only the step cap ends the graph.
        let completions = (0..20)
            .map(|_| invoke_completion(LOOKUP_ACTION, json!({ "task_name": "Ship" })))
            .collect();
        let model = scripted(completions);
        let (lookup, lookups) = StubAction::new(LOOKUP_ACTION, "Task id: \"42\"");

        let result = graph(model.clone(), vec![lookup])
            .with_max_steps(3)
            .run("loop forever")
            .await
            .unwrap();

        assert_eq!(result, TASK_OPS_STEP_LIMIT_MESSAGE);
        assert_eq!(model.calls(), 3);
        assert_eq!(lookups.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_malformed_arguments_propagate() {
        let model = scripted(vec![Message::assistant_call(ordo_ai::ActionCall::new(
            "add_task",
            "{broken",
        ))]);
        let (add, _) = StubAction::new("add_task", "unused");

        let err = graph(model, vec![add]).run("add").await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
