//! Provider neutral contracts for calendar and task backends.
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use thiserror::Error;

use super::models::{
    DEFAULT_TASK_LIST, EventDraft, EventResource, SearchCriteria, TaskDraft, TaskItem, TaskList,
};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No access token available")]
    NoToken,

    #[error("Token expired or revoked: {0}")]
    Unauthorized(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Malformed resource: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ProviderError::NoToken | ProviderError::Unauthorized(_) | ProviderError::Refresh(_)
        )
    }

    /// Text suitable for showing to the end user.
    pub fn reason(&self) -> String {
        match self {
            ProviderError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Supplies a bearer token for each provider call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, ProviderError>;
}

/// An access token handed over by the caller as is.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, ProviderError> {
        if self.0.is_empty() {
            return Err(ProviderError::NoToken);
        }
        Ok(self.0.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub meet_link: Option<String>,
}

#[async_trait]
pub trait EventsProvider: Send + Sync {
    async fn create(&self, draft: &EventDraft) -> Result<CreatedEvent, ProviderError>;

    async fn get(&self, id: &str) -> Result<EventResource, ProviderError>;

    /// Full replace of the event with `event`.
    async fn update(&self, event: &EventResource) -> Result<EventResource, ProviderError>;

    async fn delete(&self, id: &str) -> Result<(), ProviderError>;

    /// Events starting within `window`, recurring events expanded and
    /// ordered by start time.
    async fn list(
        &self,
        window: &TimeWindow,
        max_results: u32,
    ) -> Result<Vec<EventResource>, ProviderError>;

    /// Free text search within `window`.
    async fn search(
        &self,
        query: Option<&str>,
        window: &TimeWindow,
    ) -> Result<Vec<EventResource>, ProviderError>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilter {
    pub due_min: Option<NaiveDate>,
    pub due_max: Option<NaiveDate>,
    pub show_completed: bool,
    pub max_results: Option<u32>,
}

#[async_trait]
pub trait TasksProvider: Send + Sync {
    async fn create(
        &self,
        draft: &TaskDraft,
        list_id: &str,
        parent: Option<&str>,
    ) -> Result<TaskItem, ProviderError>;

    async fn get(&self, id: &str, list_id: &str) -> Result<TaskItem, ProviderError>;

    /// Full replace of the task with `task`.
    async fn update(&self, task: &TaskItem) -> Result<TaskItem, ProviderError>;

    async fn delete(&self, id: &str, list_id: &str) -> Result<(), ProviderError>;

    async fn list(
        &self,
        list_id: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskItem>, ProviderError>;

    async fn list_lists(&self) -> Result<Vec<TaskList>, ProviderError>;

    /// Map a list name or id to a list id. Unknown names and lookup
    /// failures fall back to the default list.
    async fn resolve_list_id(&self, name_or_id: Option<&str>) -> String {
        let name = match name_or_id.map(str::trim) {
            None | Some("") => return DEFAULT_TASK_LIST.to_string(),
            Some(name) => name,
        };
        if looks_like_list_id(name) {
            return name.to_string();
        }
        match self.list_lists().await {
            Ok(lists) => lists
                .into_iter()
                .find(|l| l.title.to_lowercase() == name.to_lowercase())
                .map(|l| l.id)
                .unwrap_or_else(|| {
                    tracing::warn!("Task list '{}' not found, using default list", name);
                    DEFAULT_TASK_LIST.to_string()
                }),
            Err(e) => {
                tracing::warn!("Failed to fetch task lists, using default list: {}", e);
                DEFAULT_TASK_LIST.to_string()
            }
        }
    }

    /// Open tasks in `list_id` whose title contains the criteria title
    /// and whose due date matches exactly when one is given.
    async fn search(
        &self,
        criteria: &SearchCriteria,
        list_id: &str,
    ) -> Result<Vec<TaskItem>, ProviderError> {
        let tasks = self.list(list_id, &TaskFilter::default()).await?;
        let needle = criteria.title.as_deref().map(|t| t.trim().to_lowercase());
        Ok(tasks
            .into_iter()
            .filter(|t| {
                needle
                    .as_deref()
                    .is_none_or(|n| t.title.to_lowercase().contains(n))
            })
            .filter(|t| criteria.due_date.is_none_or(|d| t.due_date == Some(d)))
            .collect())
    }
}

/// Provider list ids are either `@default` style aliases or long opaque
/// base64 strings.
fn looks_like_list_id(s: &str) -> bool {
    s.starts_with('@') || s.starts_with("MTk")
}

/// Due date filtering done client side since the provider ignores it on
/// tasks without a time.
pub fn filter_by_due(tasks: Vec<TaskItem>, filter: &TaskFilter) -> Vec<TaskItem> {
    if filter.due_min.is_none() && filter.due_max.is_none() {
        return tasks;
    }
    tasks
        .into_iter()
        .filter(|t| match t.due_date {
            Some(due) => {
                filter.due_min.is_none_or(|min| due >= min)
                    && filter.due_max.is_none_or(|max| due <= max)
            }
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, due: Option<NaiveDate>) -> TaskItem {
        TaskItem {
            id: id.to_string(),
            title: id.to_string(),
            due_date: due,
            task_list_id: DEFAULT_TASK_LIST.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_by_due() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 11, day);
        let tasks = vec![task("a", d(24)), task("b", d(25)), task("c", None), task("d", d(27))];
        let filter = TaskFilter {
            due_min: d(25),
            due_max: d(26),
            ..Default::default()
        };
        let ids: Vec<String> = filter_by_due(tasks.clone(), &filter)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(filter_by_due(tasks, &TaskFilter::default()).len(), 4);
    }

    #[test]
    fn test_looks_like_list_id() {
        assert!(looks_like_list_id("@default"));
        assert!(looks_like_list_id("MTkxNzQ2ODQ0NjE2"));
        assert!(!looks_like_list_id("Compras"));
    }

    #[tokio::test]
    async fn test_static_token() {
        assert_eq!(StaticToken::new("abc").access_token().await.unwrap(), "abc");
        assert!(matches!(
            StaticToken::new("").access_token().await,
            Err(ProviderError::NoToken)
        ));
    }
}
