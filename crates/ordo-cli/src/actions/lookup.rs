//! Name→id lookup action

use std::sync::Arc;

use async_trait::async_trait;
use ordo_agent::task_ops::{LOOKUP_ACTION, NO_TASK_FOUND};
use ordo_agent::{Action, Result};
use ordo_board::TaskIndex;
use serde_json::json;

/// Resolves a task name to its board id via the index. Returns the
/// `<NO TASK FOUND>` sentinel the task-ops graph routes on.
pub struct LookupTaskAction {
    index: Arc<dyn TaskIndex>,
}

impl LookupTaskAction {
    pub fn new(index: Arc<dyn TaskIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Action for LookupTaskAction {
    fn name(&self) -> &str {
        LOOKUP_ACTION
    }

    fn description(&self) -> &str {
        "Useful when you want to find the uuid of a specific task"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task_name": {
                    "type": "string",
                    "description": "The name of the task"
                }
            },
            "required": ["task_name"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
        let task_name = arguments
            .get("task_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        Ok(match self.index.find_id_by_title(task_name).await {
            Some(id) => format!("Task id: \"{id}\""),
            None => NO_TASK_FOUND.to_string(),
        })
    }
}
