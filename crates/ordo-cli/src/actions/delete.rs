//! Delete-task action

use std::sync::Arc;

use async_trait::async_trait;
use ordo_agent::{Action, Error, Result};
use ordo_board::{BoardClient, TaskIndex};
use serde_json::json;

/// Removes a task from the board (archives it) and drops it from the index
pub struct DeleteTaskAction {
    board: Arc<dyn BoardClient>,
    index: Arc<dyn TaskIndex>,
}

impl DeleteTaskAction {
    pub fn new(board: Arc<dyn BoardClient>, index: Arc<dyn TaskIndex>) -> Self {
        Self { board, index }
    }
}

#[async_trait]
impl Action for DeleteTaskAction {
    fn name(&self) -> &str {
        "delete_task"
    }

    fn description(&self) -> &str {
        "Useful when you want to delete a task from the tasks board"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "Uuid of the task"
                }
            },
            "required": ["task_id"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
        let task_id = arguments
            .get("task_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        self.board
            .archive(task_id)
            .await
            .map_err(|e| Error::invocation(self.name(), e))?;
        self.index.remove(task_id).await;

        Ok(format!("Removed task with id=\"{task_id}\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::MemoryBoard;
    use ordo_board::{CreateTaskRequest, InMemoryTaskIndex, TaskPriority, TaskStatus};

    #[tokio::test]
    async fn test_delete_removes_from_board_and_index() {
        let board = MemoryBoard::new();
        let task = board
            .create(&CreateTaskRequest {
                title: "Ship".into(),
                priority: TaskPriority::High,
                status: TaskStatus::InProgress,
                work_estimate: 2,
            })
            .await
            .unwrap();
        let index = Arc::new(InMemoryTaskIndex::new());
        index.upsert(&task).await;

        let action = DeleteTaskAction::new(board.clone(), index.clone());
        let reply = action.invoke(json!({ "task_id": "task-0" })).await.unwrap();

        assert_eq!(reply, "Removed task with id=\"task-0\"");
        assert!(board.tasks().is_empty());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_task_fails() {
        let board = MemoryBoard::new();
        let index = Arc::new(InMemoryTaskIndex::new());
        let action = DeleteTaskAction::new(board, index);

        let err = action.invoke(json!({ "task_id": "nope" })).await.unwrap_err();
        assert!(matches!(err, Error::ActionInvocation { .. }));
    }
}
