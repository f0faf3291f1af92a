//! Board API client
//!
//! `BoardClient` is the contract the orchestration layer shapes CRUD requests
//! against; `NotionBoardClient` implements it over the Notion REST API, where
//! a task is a page in a database and deletion is archival.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::task::{CreateTaskRequest, Task, TaskPriority, TaskStatus};

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// CRUD access to the task board
#[async_trait]
pub trait BoardClient: Send + Sync {
    /// Fetch a task by id
    async fn get(&self, id: &str) -> Result<Task>;

    /// Create a task
    async fn create(&self, request: &CreateTaskRequest) -> Result<Task>;

    /// Update a task in place; the full record is written back
    async fn update(&self, task: &Task) -> Result<Task>;

    /// Remove a task from the board
    async fn archive(&self, id: &str) -> Result<Task>;

    /// List every task currently on the board
    async fn list(&self) -> Result<Vec<Task>>;
}

/// Notion-backed board client
pub struct NotionBoardClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    database_id: String,
}

impl NotionBoardClient {
    /// Create a new client for a database
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            database_id: database_id.into(),
        }
    }

    /// Create from the NOTION_API_KEY environment variable
    pub fn from_env(database_id: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("NOTION_API_KEY")
            .map_err(|_| Error::api(401, "NOTION_API_KEY is not set"))?;
        Ok(Self::new(api_key, database_id))
    }

    /// Override the base URL (for tests or proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Notion-Version", NOTION_VERSION)
            .header("content-type", "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(Error::NotFound(text));
            }
            return Err(Error::api(status.as_u16(), text));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BoardClient for NotionBoardClient {
    async fn get(&self, id: &str) -> Result<Task> {
        let page = self
            .send(self.request(reqwest::Method::GET, &format!("/pages/{id}")))
            .await?;
        task_from_page(&page)
    }

    async fn create(&self, request: &CreateTaskRequest) -> Result<Task> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": properties_json(
                &request.title,
                request.priority,
                request.status,
                request.work_estimate,
            ),
        });
        let page = self
            .send(self.request(reqwest::Method::POST, "/pages").json(&body))
            .await?;
        task_from_page(&page)
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        let body = json!({
            "properties": properties_json(
                &task.title,
                task.priority,
                task.status,
                task.work_estimate,
            ),
        });
        let page = self
            .send(
                self.request(reqwest::Method::PATCH, &format!("/pages/{}", task.id))
                    .json(&body),
            )
            .await?;
        task_from_page(&page)
    }

    async fn archive(&self, id: &str) -> Result<Task> {
        let body = json!({ "archived": true });
        let page = self
            .send(
                self.request(reqwest::Method::PATCH, &format!("/pages/{id}"))
                    .json(&body),
            )
            .await?;
        task_from_page(&page)
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({});
            if let Some(ref c) = cursor {
                body["start_cursor"] = json!(c);
            }
            let page = self
                .send(
                    self.request(
                        reqwest::Method::POST,
                        &format!("/databases/{}/query", self.database_id),
                    )
                    .json(&body),
                )
                .await?;

            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or(Error::MissingProperty("results"))?;
            for result in results {
                match task_from_page(result) {
                    Ok(task) => tasks.push(task),
                    // Pages that don't carry the task properties are skipped,
                    // the board may hold unrelated records.
                    Err(e) => tracing::debug!("skipping non-task page: {e}"),
                }
            }

            cursor = page
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false)
                .then(|| {
                    page.get("next_cursor")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .flatten();
            if cursor.is_none() {
                break;
            }
        }

        Ok(tasks)
    }
}

/// Build the Notion property payload for a task record
fn properties_json(
    title: &str,
    priority: TaskPriority,
    status: TaskStatus,
    work_estimate: u32,
) -> Value {
    json!({
        "Name": { "title": [{ "text": { "content": title } }] },
        "Work estimation": { "number": work_estimate },
        "Priority": { "select": { "name": priority.as_str() } },
        "Status": { "status": { "name": status.as_str() } },
    })
}

/// Extract a task from a Notion page object
fn task_from_page(page: &Value) -> Result<Task> {
    let id = page
        .get("id")
        .and_then(Value::as_str)
        .ok_or(Error::MissingProperty("id"))?;
    let properties = page
        .get("properties")
        .ok_or(Error::MissingProperty("properties"))?;

    let title = properties
        .pointer("/Name/title/0/plain_text")
        .or_else(|| properties.pointer("/Name/title/0/text/content"))
        .and_then(Value::as_str)
        .ok_or(Error::MissingProperty("Name"))?;

    let priority_name = properties
        .pointer("/Priority/select/name")
        .and_then(Value::as_str)
        .ok_or(Error::MissingProperty("Priority"))?;
    let priority = TaskPriority::parse(priority_name).ok_or(Error::InvalidProperty {
        property: "Priority",
        value: priority_name.to_string(),
    })?;

    let status_name = properties
        .pointer("/Status/status/name")
        .and_then(Value::as_str)
        .ok_or(Error::MissingProperty("Status"))?;
    let status = TaskStatus::parse(status_name).ok_or(Error::InvalidProperty {
        property: "Status",
        value: status_name.to_string(),
    })?;

    let work_estimate = properties
        .pointer("/Work estimation/number")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    Ok(Task {
        id: id.to_string(),
        title: title.to_string(),
        priority,
        status,
        work_estimate,
    })
}
