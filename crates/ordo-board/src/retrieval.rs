//! Retrieval index over task text
//!
//! `TaskIndex` is the thin search contract the retrieval and lookup actions
//! use. `InMemoryTaskIndex` keeps the whole board in process memory and
//! scores documents by token overlap; a vector store can replace it behind
//! the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::task::Task;

/// Search access to indexed tasks
#[async_trait]
pub trait TaskIndex: Send + Sync {
    /// Insert or replace a task document
    async fn upsert(&self, task: &Task);

    /// Drop a task document
    async fn remove(&self, id: &str);

    /// Exact-title lookup, returning the task id
    async fn find_id_by_title(&self, title: &str) -> Option<String>;

    /// Rank tasks against a free-text query, best first
    async fn search(&self, query: &str, limit: usize) -> Vec<Task>;
}

/// In-process task index
#[derive(Default)]
pub struct InMemoryTaskIndex {
    tasks: RwLock<HashMap<String, Task>>,
}

impl InMemoryTaskIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index seeded with the given tasks
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let map = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            tasks: RwLock::new(map),
        }
    }

    /// Number of indexed tasks
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn overlap_score(query_tokens: &[String], document: &str) -> usize {
    let doc_tokens = tokenize(document);
    query_tokens
        .iter()
        .filter(|t| doc_tokens.contains(t))
        .count()
}

#[async_trait]
impl TaskIndex for InMemoryTaskIndex {
    async fn upsert(&self, task: &Task) {
        self.tasks.write().insert(task.id.clone(), task.clone());
    }

    async fn remove(&self, id: &str) {
        self.tasks.write().remove(id);
    }

    async fn find_id_by_title(&self, title: &str) -> Option<String> {
        let needle = title.trim().to_lowercase();
        self.tasks
            .read()
            .values()
            .find(|t| t.title.to_lowercase() == needle)
            .map(|t| t.id.clone())
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<Task> {
        let query_tokens = tokenize(query);
        let tasks = self.tasks.read();

        let mut scored: Vec<(usize, &Task)> = tasks
            .values()
            .map(|t| (overlap_score(&query_tokens, &t.as_text()), t))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.title.cmp(&b.1.title)));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, t)| t.clone())
            .collect()
    }
}
