//! In-memory providers for exercising the broker and executor.
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Map;

use super::models::{
    DEFAULT_TASK_LIST, EventDraft, EventResource, EventTime, TaskDraft, TaskItem, TaskList,
};
use super::provider::{
    CreatedEvent, EventsProvider, ProviderError, TaskFilter, TasksProvider, TimeWindow,
    filter_by_due,
};
use super::time::localize;
use crate::core::config::DEFAULT_TIMEZONE;

pub fn event(id: &str, title: &str, start: &str, end: &str) -> EventResource {
    EventResource {
        id: id.to_string(),
        title: Some(title.to_string()),
        description: None,
        location: None,
        start: EventTime::At(DateTime::parse_from_rfc3339(start).unwrap()),
        end: EventTime::At(DateTime::parse_from_rfc3339(end).unwrap()),
        time_zone: Some(DEFAULT_TIMEZONE.name().to_string()),
        color_id: None,
        reminders: None,
        recurrence: vec![],
        attendees: vec![],
        html_link: None,
        meet_link: None,
        request_meet_link: false,
        extra: Map::new(),
    }
}

pub fn task(id: &str, title: &str, list_id: &str) -> TaskItem {
    TaskItem {
        id: id.to_string(),
        title: title.to_string(),
        status: Some("needsAction".to_string()),
        task_list_id: list_id.to_string(),
        ..Default::default()
    }
}

fn not_found(id: &str) -> ProviderError {
    ProviderError::Api {
        status: 404,
        message: format!("{} not found", id),
    }
}

fn server_error() -> ProviderError {
    ProviderError::Api {
        status: 500,
        message: "Backend Error".to_string(),
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub events: Mutex<Vec<EventResource>>,
    pub calls: Mutex<Vec<String>>,
    /// Deletes and updates of these ids fail
    pub failing_ids: HashSet<String>,
    /// Searches for these queries fail
    pub failing_queries: HashSet<String>,
    pub unauthorized: bool,
    pub next_id: AtomicUsize,
}

impl FakeCalendar {
    pub fn with_events(events: Vec<EventResource>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(call);
        if self.unauthorized {
            return Err(ProviderError::Unauthorized("Invalid Credentials".to_string()));
        }
        Ok(())
    }

    fn in_window(&self, window: &TimeWindow) -> Vec<EventResource> {
        let mut found: Vec<EventResource> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| match &e.start {
                EventTime::At(start) => *start >= window.start && *start <= window.end,
                EventTime::AllDay(_) => false,
            })
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start.to_wire_string());
        found
    }
}

#[async_trait]
impl EventsProvider for FakeCalendar {
    async fn create(&self, draft: &EventDraft) -> Result<CreatedEvent, ProviderError> {
        self.record(format!("create:{}", draft.title))?;
        let id = format!("evt_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut created = event(&id, &draft.title, "2000-01-01T00:00:00Z", "2000-01-01T01:00:00Z");
        created.start = EventTime::At(localize(draft.start, DEFAULT_TIMEZONE));
        created.end = EventTime::At(localize(draft.resolved_end(), DEFAULT_TIMEZONE));
        self.events.lock().unwrap().push(created);
        Ok(CreatedEvent {
            html_link: Some(format!("https://calendar.example.com/{}", id)),
            meet_link: draft
                .wants_meet_link()
                .then(|| "https://meet.example.com/abc".to_string()),
            id,
        })
    }

    async fn get(&self, id: &str) -> Result<EventResource, ProviderError> {
        self.record(format!("get:{}", id))?;
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn update(&self, event: &EventResource) -> Result<EventResource, ProviderError> {
        self.record(format!("update:{}", event.id))?;
        if self.failing_ids.contains(&event.id) {
            return Err(server_error());
        }
        let mut events = self.events.lock().unwrap();
        let slot = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| not_found(&event.id))?;
        *slot = event.clone();
        Ok(event.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.record(format!("delete:{}", id))?;
        if self.failing_ids.contains(id) {
            return Err(server_error());
        }
        self.events.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    async fn list(
        &self,
        window: &TimeWindow,
        max_results: u32,
    ) -> Result<Vec<EventResource>, ProviderError> {
        self.record("list".to_string())?;
        Ok(self
            .in_window(window)
            .into_iter()
            .take(max_results as usize)
            .collect())
    }

    async fn search(
        &self,
        query: Option<&str>,
        window: &TimeWindow,
    ) -> Result<Vec<EventResource>, ProviderError> {
        self.record(format!("search:{}", query.unwrap_or_default()))?;
        if let Some(q) = query
            && self.failing_queries.contains(q)
        {
            return Err(server_error());
        }
        let needle = query.map(str::to_lowercase);
        Ok(self
            .in_window(window)
            .into_iter()
            .filter(|e| {
                needle.as_deref().is_none_or(|n| {
                    e.title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(n))
                })
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeTasks {
    pub tasks: Mutex<Vec<TaskItem>>,
    pub lists: Vec<TaskList>,
    pub calls: Mutex<Vec<String>>,
    /// Creating a task with one of these titles fails
    pub failing_titles: HashSet<String>,
    /// Deletes and updates of these ids fail
    pub failing_ids: HashSet<String>,
    pub next_id: AtomicUsize,
}

impl FakeTasks {
    pub fn with_tasks(tasks: Vec<TaskItem>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TasksProvider for FakeTasks {
    async fn create(
        &self,
        draft: &TaskDraft,
        list_id: &str,
        parent: Option<&str>,
    ) -> Result<TaskItem, ProviderError> {
        self.record(format!("create:{}:{}", list_id, draft.title));
        if self.failing_titles.contains(&draft.title) {
            return Err(server_error());
        }
        let id = format!("task_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut created = task(&id, &draft.title, list_id);
        created.description = draft.description.clone();
        created.due_date = draft.due_date;
        created.parent = parent.map(String::from);
        self.tasks.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: &str, list_id: &str) -> Result<TaskItem, ProviderError> {
        self.record(format!("get:{}", id));
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.task_list_id == list_id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn update(&self, task: &TaskItem) -> Result<TaskItem, ProviderError> {
        self.record(format!("update:{}", task.id));
        if self.failing_ids.contains(&task.id) {
            return Err(server_error());
        }
        let mut tasks = self.tasks.lock().unwrap();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| not_found(&task.id))?;
        *slot = task.clone();
        Ok(task.clone())
    }

    async fn delete(&self, id: &str, _list_id: &str) -> Result<(), ProviderError> {
        self.record(format!("delete:{}", id));
        if self.failing_ids.contains(id) {
            return Err(server_error());
        }
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn list(
        &self,
        list_id: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskItem>, ProviderError> {
        self.record(format!("list:{}", list_id));
        let tasks: Vec<TaskItem> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.task_list_id == list_id)
            .filter(|t| filter.show_completed || t.status.as_deref() != Some("completed"))
            .cloned()
            .collect();
        Ok(filter_by_due(tasks, filter))
    }

    async fn list_lists(&self) -> Result<Vec<TaskList>, ProviderError> {
        let mut lists = vec![TaskList {
            id: DEFAULT_TASK_LIST.to_string(),
            title: "My Tasks".to_string(),
        }];
        lists.extend(self.lists.iter().cloned());
        Ok(lists)
    }
}
