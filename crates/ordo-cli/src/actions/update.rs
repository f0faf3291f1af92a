//! Update-task action

use std::sync::Arc;

use async_trait::async_trait;
use ordo_agent::{Action, Error, Result};
use ordo_board::{BoardClient, TaskIndex};
use serde_json::json;

/// Updates properties of an existing task
pub struct UpdateTaskAction {
    board: Arc<dyn BoardClient>,
    index: Arc<dyn TaskIndex>,
}

impl UpdateTaskAction {
    pub fn new(board: Arc<dyn BoardClient>, index: Arc<dyn TaskIndex>) -> Self {
        Self { board, index }
    }
}

#[async_trait]
impl Action for UpdateTaskAction {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Useful when you want to update some properties of a task on the tasks board"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "Uuid of the task"
                },
                "task_params": {
                    "type": "string",
                    "description": "JSON object with the properties to update"
                }
            },
            "required": ["task_id", "task_params"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
        let task_id = arguments
            .get("task_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let task_params = arguments
            .get("task_params")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let params: serde_json::Value = serde_json::from_str(task_params)
            .map_err(|e| Error::invocation(self.name(), format!("task_params is not valid JSON: {e}")))?;
        let object = params
            .as_object()
            .ok_or_else(|| Error::invocation(self.name(), "task_params must be a JSON object"))?;

        let mut task = self
            .board
            .get(task_id)
            .await
            .map_err(|e| Error::invocation(self.name(), e))?;

        for (name, value) in object {
            task.apply_param(name, value)
                .map_err(|e| Error::invocation(self.name(), e))?;
        }

        let task = self
            .board
            .update(&task)
            .await
            .map_err(|e| Error::invocation(self.name(), e))?;
        self.index.upsert(&task).await;

        Ok(format!("Updated task with id=\"{}\"", task.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::MemoryBoard;
    use ordo_board::{CreateTaskRequest, InMemoryTaskIndex, TaskPriority, TaskStatus};

    async fn seeded() -> (UpdateTaskAction, Arc<MemoryBoard>) {
        let board = MemoryBoard::new();
        board
            .create(&CreateTaskRequest {
                title: "Ship".into(),
                priority: TaskPriority::High,
                status: TaskStatus::InProgress,
                work_estimate: 2,
            })
            .await
            .unwrap();
        let index = Arc::new(InMemoryTaskIndex::new());
        (UpdateTaskAction::new(board.clone(), index), board)
    }

    #[tokio::test]
    async fn test_update_status() {
        let (action, board) = seeded().await;

        let reply = action
            .invoke(json!({ "task_id": "task-0", "task_params": "{\"status\": \"Done\"}" }))
            .await
            .unwrap();

        assert_eq!(reply, "Updated task with id=\"task-0\"");
        assert_eq!(board.tasks()[0].status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn test_update_unknown_task_fails() {
        let (action, _) = seeded().await;

        let err = action
            .invoke(json!({ "task_id": "task-9", "task_params": "{\"status\": \"Done\"}" }))
            .await
            .unwrap_err();

        match err {
            Error::ActionInvocation { action, source } => {
                assert_eq!(action, "update_task");
                assert!(source.to_string().contains("task-9"));
            }
            other => panic!("expected ActionInvocation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_malformed_params_fails() {
        let (action, board) = seeded().await;

        let err = action
            .invoke(json!({ "task_id": "task-0", "task_params": "{oops" }))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ActionInvocation { .. }));
        assert_eq!(board.tasks()[0].status, TaskStatus::InProgress, "unchanged");
    }
}
