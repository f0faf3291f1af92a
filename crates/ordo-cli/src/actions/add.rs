//! Add-task action

use std::sync::Arc;

use async_trait::async_trait;
use ordo_agent::{Action, Error, Result};
use ordo_board::{BoardClient, CreateTaskRequest, TaskIndex, TaskPriority, TaskStatus};
use serde_json::json;

/// Creates a task on the board and indexes it for retrieval
pub struct AddTaskAction {
    board: Arc<dyn BoardClient>,
    index: Arc<dyn TaskIndex>,
}

impl AddTaskAction {
    pub fn new(board: Arc<dyn BoardClient>, index: Arc<dyn TaskIndex>) -> Self {
        Self { board, index }
    }
}

#[async_trait]
impl Action for AddTaskAction {
    fn name(&self) -> &str {
        "add_task"
    }

    fn description(&self) -> &str {
        "Useful when you want to add a new task to the tasks board"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task_name": {
                    "type": "string",
                    "description": "The name of the task"
                },
                "task_params": {
                    "type": "string",
                    "description": "JSON object with additional properties for the task; pass an empty object if there are none"
                }
            },
            "required": ["task_name", "task_params"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
        let task_name = arguments
            .get("task_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let task_params = arguments
            .get("task_params")
            .and_then(|v| v.as_str())
            .unwrap_or("{}");

        let mut request = CreateTaskRequest {
            title: task_name.to_string(),
            priority: TaskPriority::High,
            status: TaskStatus::InProgress,
            work_estimate: 2,
        };
        apply_params(&mut request, task_params)
            .map_err(|e| Error::invocation(self.name(), e))?;

        let task = self
            .board
            .create(&request)
            .await
            .map_err(|e| Error::invocation(self.name(), e))?;
        self.index.upsert(&task).await;

        Ok(format!(
            "Added \"{}\" task to board with id=\"{}\"",
            task_name, task.id
        ))
    }
}

fn apply_params(request: &mut CreateTaskRequest, raw: &str) -> std::result::Result<(), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    let params: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("task_params is not valid JSON: {e}"))?;
    let Some(object) = params.as_object() else {
        return Err("task_params must be a JSON object".to_string());
    };

    for (name, value) in object {
        match name.as_str() {
            "priority" => {
                let raw = value.as_str().unwrap_or_default();
                request.priority = TaskPriority::parse(raw)
                    .ok_or_else(|| format!("unknown priority '{raw}'"))?;
            }
            "status" => {
                let raw = value.as_str().unwrap_or_default();
                request.status =
                    TaskStatus::parse(raw).ok_or_else(|| format!("unknown status '{raw}'"))?;
            }
            "work_estimate" | "work estimation" => {
                request.work_estimate = value
                    .as_u64()
                    .ok_or_else(|| format!("work estimate must be a number, got {value}"))?
                    as u32;
            }
            other => return Err(format!("unknown task parameter '{other}'")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::MemoryBoard;
    use ordo_board::InMemoryTaskIndex;

    fn action() -> (AddTaskAction, Arc<MemoryBoard>, Arc<InMemoryTaskIndex>) {
        let board = MemoryBoard::new();
        let index = Arc::new(InMemoryTaskIndex::new());
        (
            AddTaskAction::new(board.clone(), index.clone()),
            board,
            index,
        )
    }

    #[tokio::test]
    async fn test_add_with_defaults() {
        let (action, board, index) = action();

        let reply = action
            .invoke(json!({ "task_name": "Ship release", "task_params": "{}" }))
            .await
            .unwrap();

        assert_eq!(reply, "Added \"Ship release\" task to board with id=\"task-0\"");
        let tasks = board.tasks();
        assert_eq!(tasks[0].priority, TaskPriority::High);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert_eq!(tasks[0].work_estimate, 2);
        assert_eq!(
            index.find_id_by_title("Ship release").await.as_deref(),
            Some("task-0")
        );
    }

    #[tokio::test]
    async fn test_add_with_overrides() {
        let (action, board, _) = action();

        action
            .invoke(json!({
                "task_name": "Water plants",
                "task_params": "{\"priority\": \"Low\", \"status\": \"Not started\", \"work_estimate\": 1}"
            }))
            .await
            .unwrap();

        let tasks = board.tasks();
        assert_eq!(tasks[0].priority, TaskPriority::Low);
        assert_eq!(tasks[0].status, TaskStatus::NotStarted);
        assert_eq!(tasks[0].work_estimate, 1);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_params() {
        let (action, board, _) = action();

        let err = action
            .invoke(json!({ "task_name": "X", "task_params": "{\"due\": \"friday\"}" }))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ActionInvocation { .. }));
        assert!(board.tasks().is_empty(), "nothing was created");
    }
}
