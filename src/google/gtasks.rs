//! Google Tasks v1 adapter.
use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::send;
use crate::assistant::models::{TaskDraft, TaskItem, TaskList};
use crate::assistant::provider::{
    ProviderError, TaskFilter, TasksProvider, TokenSource, filter_by_due,
};
use crate::assistant::time::{anchor_due_date, read_due_date};

const LIST_MAX_RESULTS: u32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GoogleTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TaskPage {
    #[serde(default)]
    items: Vec<GoogleTask>,
}

#[derive(Debug, Deserialize)]
struct TaskListPage {
    #[serde(default)]
    items: Vec<TaskList>,
}

fn into_task_item(task: GoogleTask, list_id: &str) -> Result<TaskItem, ProviderError> {
    let id = task
        .id
        .ok_or_else(|| ProviderError::Malformed("task without id".to_string()))?;
    Ok(TaskItem {
        id,
        title: task.title.unwrap_or_default(),
        description: task.notes,
        due_date: task.due.as_deref().and_then(read_due_date),
        status: task.status,
        completed: task.completed,
        parent: task.parent,
        task_list_id: list_id.to_string(),
        extra: task.extra,
    })
}

pub struct GoogleTasks {
    client: Client,
    api_hostname: String,
    tokens: Arc<dyn TokenSource>,
    timezone: Tz,
}

impl GoogleTasks {
    pub fn new(api_hostname: &str, tokens: Arc<dyn TokenSource>, timezone: Tz) -> Self {
        Self {
            client: Client::new(),
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            tokens,
            timezone,
        }
    }

    fn tasks_url(&self, list_id: &str) -> String {
        format!(
            "{}/tasks/v1/lists/{}/tasks",
            self.api_hostname,
            urlencoding::encode(list_id)
        )
    }

    fn task_url(&self, id: &str, list_id: &str) -> String {
        format!("{}/{}", self.tasks_url(list_id), urlencoding::encode(id))
    }
}

#[async_trait]
impl TasksProvider for GoogleTasks {
    async fn create(
        &self,
        draft: &TaskDraft,
        list_id: &str,
        parent: Option<&str>,
    ) -> Result<TaskItem, ProviderError> {
        let token = self.tokens.access_token().await?;
        let body = GoogleTask {
            title: Some(draft.title.clone()),
            notes: draft.description.clone(),
            due: draft.due_date.map(|d| anchor_due_date(d, self.timezone)),
            ..Default::default()
        };
        let mut req = self.client.post(self.tasks_url(list_id)).bearer_auth(token);
        if let Some(parent) = parent {
            req = req.query(&[("parent", parent)]);
        }
        let text = send(req.json(&body)).await?;
        let task = into_task_item(serde_json::from_str(&text)?, list_id)?;
        tracing::info!("Created task {} in list {}", task.id, list_id);
        Ok(task)
    }

    async fn get(&self, id: &str, list_id: &str) -> Result<TaskItem, ProviderError> {
        let token = self.tokens.access_token().await?;
        let req = self.client.get(self.task_url(id, list_id)).bearer_auth(token);
        let text = send(req).await?;
        into_task_item(serde_json::from_str(&text)?, list_id)
    }

    async fn update(&self, task: &TaskItem) -> Result<TaskItem, ProviderError> {
        let token = self.tokens.access_token().await?;
        let body = GoogleTask {
            id: Some(task.id.clone()),
            title: Some(task.title.clone()),
            notes: task.description.clone(),
            due: task.due_date.map(|d| anchor_due_date(d, self.timezone)),
            status: task.status.clone(),
            completed: task.completed.clone(),
            parent: task.parent.clone(),
            extra: task.extra.clone(),
        };
        let req = self
            .client
            .put(self.task_url(&task.id, &task.task_list_id))
            .bearer_auth(token)
            .json(&body);
        let text = send(req).await?;
        into_task_item(serde_json::from_str(&text)?, &task.task_list_id)
    }

    async fn delete(&self, id: &str, list_id: &str) -> Result<(), ProviderError> {
        let token = self.tokens.access_token().await?;
        let req = self
            .client
            .delete(self.task_url(id, list_id))
            .bearer_auth(token);
        send(req).await?;
        Ok(())
    }

    async fn list(
        &self,
        list_id: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskItem>, ProviderError> {
        let token = self.tokens.access_token().await?;
        let max_results = filter.max_results.unwrap_or(LIST_MAX_RESULTS);
        let req = self
            .client
            .get(self.tasks_url(list_id))
            .bearer_auth(token)
            .query(&[
                ("maxResults", max_results.to_string()),
                ("showCompleted", filter.show_completed.to_string()),
                ("showHidden", "false".to_string()),
            ]);
        let text = send(req).await?;
        let page: TaskPage = serde_json::from_str(&text)?;
        let tasks = page
            .items
            .into_iter()
            .filter_map(|t| {
                into_task_item(t, list_id)
                    .inspect_err(|e| tracing::warn!("Skipping task: {}", e))
                    .ok()
            })
            .collect();
        Ok(filter_by_due(tasks, filter))
    }

    async fn list_lists(&self) -> Result<Vec<TaskList>, ProviderError> {
        let token = self.tokens.access_token().await?;
        let req = self
            .client
            .get(format!("{}/tasks/v1/users/@me/lists", self.api_hostname))
            .bearer_auth(token);
        let text = send(req).await?;
        let page: TaskListPage = serde_json::from_str(&text)?;
        Ok(page.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::models::SearchCriteria;
    use crate::assistant::provider::StaticToken;
    use crate::core::config::DEFAULT_TIMEZONE;
    use chrono::NaiveDate;
    use mockito::Matcher;
    use serde_json::json;

    fn tasks(url: &str) -> GoogleTasks {
        GoogleTasks::new(url, Arc::new(StaticToken::new("test_token")), DEFAULT_TIMEZONE)
    }

    #[tokio::test]
    async fn test_create_task_anchors_due_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks/v1/lists/%40default/tasks")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::Json(json!({
                "title": "Pagar expensas",
                "due": "2025-11-25T00:00:00-03:00"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "task_1", "title": "Pagar expensas", "due": "2025-11-25T00:00:00.000Z", "status": "needsAction"}"#,
            )
            .create_async()
            .await;

        let draft: TaskDraft = serde_json::from_value(json!({
            "title": "Pagar expensas",
            "due_date": "2025-11-25"
        }))
        .unwrap();
        let task = tasks(&server.url())
            .create(&draft, "@default", None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(task.id, "task_1");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 11, 25));
        assert_eq!(task.task_list_id, "@default");
    }

    #[tokio::test]
    async fn test_update_task_puts_full_resource() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/tasks/v1/lists/list_1/tasks/task_1")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::PartialJson(json!({
                "id": "task_1",
                "title": "Pagar expensas",
                "notes": "Transferencia",
                "due": "2025-11-26T00:00:00-03:00",
                "status": "needsAction",
                "etag": "\"LTEx\"",
                "links": [{"type": "email", "link": "https://mail.google.com/x"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "task_1", "title": "Pagar expensas", "due": "2025-11-26T00:00:00.000Z", "status": "needsAction"}"#,
            )
            .create_async()
            .await;

        let mut extra = Map::new();
        extra.insert("etag".to_string(), json!("\"LTEx\""));
        extra.insert(
            "links".to_string(),
            json!([{"type": "email", "link": "https://mail.google.com/x"}]),
        );
        let task = TaskItem {
            id: "task_1".to_string(),
            title: "Pagar expensas".to_string(),
            description: Some("Transferencia".to_string()),
            due_date: NaiveDate::from_ymd_opt(2025, 11, 26),
            status: Some("needsAction".to_string()),
            task_list_id: "list_1".to_string(),
            extra,
            ..Default::default()
        };
        let updated = tasks(&server.url()).update(&task).await.unwrap();

        mock.assert_async().await;
        assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2025, 11, 26));
        assert_eq!(updated.task_list_id, "list_1");
    }

    #[tokio::test]
    async fn test_create_subtask_sets_parent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks/v1/lists/list_1/tasks")
            .match_query(Matcher::UrlEncoded("parent".into(), "task_1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "task_2", "title": "Lechuga", "parent": "task_1"}"#)
            .create_async()
            .await;

        let draft: TaskDraft = serde_json::from_value(json!({"title": "Lechuga"})).unwrap();
        let task = tasks(&server.url())
            .create(&draft, "list_1", Some("task_1"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(task.parent.as_deref(), Some("task_1"));
    }

    #[tokio::test]
    async fn test_list_filters_by_due_date() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/v1/lists/%40default/tasks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("maxResults".into(), "100".into()),
                Matcher::UrlEncoded("showCompleted".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [
                    {"id": "a", "title": "A", "due": "2025-11-24T00:00:00.000Z"},
                    {"id": "b", "title": "B", "due": "2025-11-25T00:00:00.000Z"},
                    {"id": "c", "title": "C"}
                ]}"#,
            )
            .create_async()
            .await;

        let filter = TaskFilter {
            due_min: NaiveDate::from_ymd_opt(2025, 11, 25),
            due_max: NaiveDate::from_ymd_opt(2025, 11, 25),
            show_completed: true,
            max_results: None,
        };
        let found = tasks(&server.url()).list("@default", &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");
    }

    #[tokio::test]
    async fn test_resolve_list_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/v1/users/@me/lists")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": [{"id": "list_compras", "title": "Compras"}]}"#)
            .create_async()
            .await;

        let provider = tasks(&server.url());
        assert_eq!(provider.resolve_list_id(Some("compras")).await, "list_compras");
        assert_eq!(provider.resolve_list_id(Some("Trabajo")).await, "@default");
        assert_eq!(provider.resolve_list_id(None).await, "@default");
        assert_eq!(provider.resolve_list_id(Some("@default")).await, "@default");
    }

    #[tokio::test]
    async fn test_resolve_list_id_falls_back_on_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/v1/users/@me/lists")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        assert_eq!(
            tasks(&server.url()).resolve_list_id(Some("Compras")).await,
            "@default"
        );
    }

    #[tokio::test]
    async fn test_search_open_tasks() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/v1/lists/%40default/tasks")
            .match_query(Matcher::UrlEncoded("showCompleted".into(), "false".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [
                    {"id": "a", "title": "Comprar pan", "due": "2025-11-25T00:00:00.000Z"},
                    {"id": "b", "title": "Comprar leche", "due": "2025-11-26T00:00:00.000Z"},
                    {"id": "c", "title": "Llamar a mamá"}
                ]}"#,
            )
            .create_async()
            .await;

        let criteria = SearchCriteria {
            title: Some("comprar".to_string()),
            due_date: NaiveDate::from_ymd_opt(2025, 11, 26),
            ..Default::default()
        };
        let found = tasks(&server.url())
            .search(&criteria, "@default")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");
    }
}
