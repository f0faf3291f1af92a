//! Retrieval-augmented query action

use std::sync::Arc;

use async_trait::async_trait;
use ordo_agent::assistant::RETRIEVAL_ACTION;
use ordo_agent::{Action, Error, Result};
use ordo_ai::{ChatRequest, Message, ModelClient};
use ordo_board::TaskIndex;
use serde_json::json;

const CONTEXT_LIMIT: usize = 4;

const RETRIEVAL_PROMPT: &str = "Answer the question using only the task \
records below. If the records do not contain the answer, say you don't \
know. Keep the answer to at most three sentences.";

/// Answers a question about tasks by searching the index and asking the
/// model over the retrieved records.
pub struct RetrievalAction {
    index: Arc<dyn TaskIndex>,
    model: Arc<dyn ModelClient>,
}

impl RetrievalAction {
    pub fn new(index: Arc<dyn TaskIndex>, model: Arc<dyn ModelClient>) -> Self {
        Self { index, model }
    }
}

#[async_trait]
impl Action for RetrievalAction {
    fn name(&self) -> &str {
        RETRIEVAL_ACTION
    }

    fn description(&self) -> &str {
        "Useful when you need to answer a question or get information related to a single task by its name"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "Maximum one sentence, the query to run with the task name"
                }
            },
            "required": ["input"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
        let query = arguments
            .get("input")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let hits = self.index.search(query, CONTEXT_LIMIT).await;
        if hits.is_empty() {
            return Ok("No task records match that query.".to_string());
        }

        let records = hits
            .iter()
            .map(|t| format!("- {}", t.as_text()))
            .collect::<Vec<_>>()
            .join("\n");

        let mut request = ChatRequest::with_system(RETRIEVAL_PROMPT);
        request.push(Message::user(format!(
            "Task records:\n{records}\n\nQuestion: {query}"
        )));

        let completion = self
            .model
            .complete(&request)
            .await
            .map_err(|e| Error::invocation(self.name(), e))?;

        Ok(completion.text().to_string())
    }
}
