//! The task entity as the board exposes it

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Task status, using the board's display names on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Not started")]
    NotStarted,
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// The board-facing display name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Parse a board-facing name, case-insensitively
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s.to_lowercase().as_str() {
            "not started" => Some(TaskStatus::NotStarted),
            "in progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
}

impl TaskPriority {
    /// The board-facing display name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    /// Parse a board-facing name, case-insensitively
    pub fn parse(s: &str) -> Option<TaskPriority> {
        match s.to_lowercase().as_str() {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task record on the board. The orchestration core never mutates fields
/// directly; it only shapes requests against `BoardClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub work_estimate: u32,
}

impl Task {
    /// Render the document form indexed for retrieval
    pub fn as_text(&self) -> String {
        format!(
            "title=\"{}\" priority=\"{}\" status=\"{}\" work_estimate=\"{}\"",
            self.title, self.priority, self.status, self.work_estimate
        )
    }

    /// Apply a named parameter update, as produced by the update action
    pub fn apply_param(&mut self, name: &str, value: &serde_json::Value) -> crate::Result<()> {
        match name {
            "status" => {
                let raw = value.as_str().unwrap_or_default();
                self.status = TaskStatus::parse(raw).ok_or(Error::InvalidProperty {
                    property: "status",
                    value: raw.to_string(),
                })?;
            }
            "priority" => {
                let raw = value.as_str().unwrap_or_default();
                self.priority = TaskPriority::parse(raw).ok_or(Error::InvalidProperty {
                    property: "priority",
                    value: raw.to_string(),
                })?;
            }
            "title" | "name" => {
                let raw = value.as_str().unwrap_or_default();
                if raw.is_empty() {
                    return Err(Error::InvalidProperty {
                        property: "title",
                        value: value.to_string(),
                    });
                }
                self.title = raw.to_string();
            }
            "work_estimate" | "work estimation" => {
                self.work_estimate = value.as_u64().ok_or(Error::InvalidProperty {
                    property: "work_estimate",
                    value: value.to_string(),
                })? as u32;
            }
            other => {
                return Err(Error::InvalidProperty {
                    property: "parameter",
                    value: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Request payload for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub work_estimate: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: "abc-123".into(),
            title: "Write report".into(),
            priority: TaskPriority::High,
            status: TaskStatus::InProgress,
            work_estimate: 2,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("IN PROGRESS"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("unknown"), None);
    }

    #[test]
    fn test_priority_round_trip() {
        for priority in [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High] {
            assert_eq!(TaskPriority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(TaskPriority::parse("medium"), Some(TaskPriority::Medium));
    }

    #[test]
    fn test_as_text_skips_id() {
        let text = sample().as_text();
        assert!(text.contains("title=\"Write report\""));
        assert!(text.contains("status=\"In progress\""));
        assert!(!text.contains("abc-123"));
    }

    #[test]
    fn test_apply_param_status_and_priority() {
        let mut task = sample();
        task.apply_param("status", &serde_json::json!("done")).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        task.apply_param("priority", &serde_json::json!("Low")).unwrap();
        assert_eq!(task.priority, TaskPriority::Low);
    }

    #[test]
    fn test_apply_param_rejects_unknown() {
        let mut task = sample();
        let err = task.apply_param("due_date", &serde_json::json!("tomorrow"));
        assert!(err.is_err());
    }

    #[test]
    fn test_apply_param_rejects_bad_status() {
        let mut task = sample();
        assert!(task.apply_param("status", &serde_json::json!("paused")).is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"In progress\""));
        assert!(json.contains("\"High\""));
    }
}
