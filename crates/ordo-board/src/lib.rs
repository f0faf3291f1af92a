//! ordo-board: External collaborators of the ordo assistant
//!
//! The task entity, a Notion-style board API client, and a retrieval index
//! over task text. The orchestration core only sees the `BoardClient` and
//! `TaskIndex` traits.

pub mod client;
pub mod error;
pub mod retrieval;
pub mod task;

pub use client::{BoardClient, NotionBoardClient};
pub use error::{Error, Result};
pub use retrieval::{InMemoryTaskIndex, TaskIndex};
pub use task::{CreateTaskRequest, Task, TaskPriority, TaskStatus};
