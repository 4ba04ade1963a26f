//! Applies confirmed actions against the providers.
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;
use futures::future::join_all;

use super::error::AssistantError;
use super::messages::{self, Noun};
use super::models::{
    BatchOperation, CalendarEvent, ConverseResponse, EventDraft, EventRef, EventResource,
    EventTime, EventUpdates, IntentKind, ListQuery, Outcome, PendingAction, TaskDraft, TaskItem,
    TaskRef, TaskUpdates,
};
use super::provider::{EventsProvider, ProviderError, TaskFilter, TasksProvider};
use super::time::{day_window, localize};
use crate::core::Language;
use crate::google::colors::color_id;

const DEFAULT_LIST_MAX_RESULTS: u32 = 50;
const LIST_MAX_RESULTS_CAP: u32 = 250;

/// Apply `updates` on top of `current`. Every field missing from
/// `updates` keeps its current value. Unknown color names keep the
/// current color.
pub fn merge_event(current: &EventResource, updates: &EventUpdates, tz: Tz) -> EventResource {
    let mut merged = current.clone();
    if let Some(title) = &updates.title {
        merged.title = Some(title.clone());
    }
    if let Some(description) = &updates.description {
        merged.description = Some(description.clone());
    }
    if let Some(location) = &updates.location {
        merged.location = Some(location.clone());
    }
    if let Some(start) = updates.start {
        merged.start = EventTime::At(localize(start, tz));
    }
    if let Some(end) = updates.end {
        merged.end = EventTime::At(localize(end, tz));
    }
    if updates.start.is_some() || updates.end.is_some() {
        merged.time_zone = Some(tz.name().to_string());
    }
    // A timed value on one side turns an all-day event into a timed one
    match (&merged.start, &merged.end) {
        (EventTime::At(start), EventTime::AllDay(_)) => {
            merged.end = EventTime::At(*start + Duration::hours(1));
        }
        (EventTime::AllDay(day), EventTime::At(_)) => {
            merged.start = EventTime::At(localize(day.and_time(NaiveTime::MIN), tz));
        }
        _ => {}
    }
    if let Some(color) = &updates.color {
        match color_id(color) {
            Some(id) => merged.color_id = Some(id.to_string()),
            None => tracing::warn!("Unknown color '{}', keeping the current one", color),
        }
    }
    if let Some(reminders) = &updates.reminders {
        merged.reminders = Some(reminders.clone());
    }
    if let Some(recurrence) = &updates.recurrence {
        merged.recurrence = recurrence.clone();
    }
    merged.request_meet_link = updates.conference.is_some_and(|c| c.create_meet_link)
        && current.meet_link.is_none();
    merged
}

pub fn merge_task(current: &TaskItem, updates: &TaskUpdates) -> TaskItem {
    let mut merged = current.clone();
    if let Some(title) = &updates.title {
        merged.title = title.clone();
    }
    if let Some(description) = &updates.description {
        merged.description = Some(description.clone());
    }
    if let Some(due_date) = updates.due_date {
        merged.due_date = Some(due_date);
    }
    merged
}

/// False when an event would end at or before its start. Google's
/// all-day end date is exclusive.
fn has_valid_times(event: &EventResource) -> bool {
    match (&event.start, &event.end) {
        (EventTime::At(start), EventTime::At(end)) => start < end,
        (EventTime::AllDay(start), EventTime::AllDay(end)) => start < end,
        _ => false,
    }
}

enum ItemError {
    Provider(ProviderError),
    InvalidTimes,
}

impl From<ProviderError> for ItemError {
    fn from(e: ProviderError) -> Self {
        ItemError::Provider(e)
    }
}

/// Per item results of a batch. Failures never stop the other items.
struct BatchReport {
    success_count: usize,
    failures: Vec<ItemError>,
}

impl BatchReport {
    fn collect<I: std::fmt::Display>(ids: &[I], results: Vec<Result<(), ItemError>>) -> Self {
        let mut success_count = 0;
        let mut failures = vec![];
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(()) => success_count += 1,
                Err(ItemError::Provider(e)) => {
                    tracing::warn!("Batch item {} failed: {}", id, e);
                    failures.push(ItemError::Provider(e));
                }
                Err(ItemError::InvalidTimes) => {
                    tracing::warn!("Batch item {} rejected: end is not after start", id);
                    failures.push(ItemError::InvalidTimes);
                }
            }
        }
        Self {
            success_count,
            failures,
        }
    }
}

pub struct ActionExecutor {
    events: Arc<dyn EventsProvider>,
    tasks: Arc<dyn TasksProvider>,
    timezone: Tz,
    language: Language,
}

impl ActionExecutor {
    pub fn new(
        events: Arc<dyn EventsProvider>,
        tasks: Arc<dyn TasksProvider>,
        timezone: Tz,
        language: Language,
    ) -> Self {
        Self {
            events,
            tasks,
            timezone,
            language,
        }
    }

    pub async fn execute(&self, action: PendingAction) -> Result<ConverseResponse, AssistantError> {
        tracing::info!("Executing confirmed {:?}", action.intent_kind());
        match action {
            PendingAction::CreateEvent(draft) => self.create_event(&draft).await,
            PendingAction::DeleteEvent(refs) => self.delete_events(&refs).await,
            PendingAction::UpdateEvent { refs, updates } => {
                self.update_events(&refs, &updates).await
            }
            PendingAction::CreateTask(draft) => self.create_task(&draft).await,
            PendingAction::DeleteTask(refs) => self.delete_tasks(&refs).await,
            PendingAction::UpdateTask { refs, updates } => self.update_tasks(&refs, &updates).await,
        }
    }

    fn provider_error(&self, intent: IntentKind, err: ProviderError) -> AssistantError {
        tracing::error!("Provider call failed: {}", err);
        AssistantError::from_provider(messages::activity(self.language, intent), err)
    }

    fn rejected(&self, intent: IntentKind, reason: &str) -> ConverseResponse {
        ConverseResponse {
            outcome: Some(Outcome::Rejected {
                reason: reason.to_string(),
            }),
            ..ConverseResponse::reply(intent, reason)
        }
    }

    pub async fn create_event(
        &self,
        draft: &EventDraft,
    ) -> Result<ConverseResponse, AssistantError> {
        let intent = IntentKind::CreateEvent;
        if draft.title.trim().is_empty() {
            let reason = messages::missing_information(self.language, &["title".to_string()]);
            return Ok(self.rejected(intent, &reason));
        }
        if draft.resolved_end() <= draft.start {
            return Ok(self.rejected(intent, messages::invalid_time_range(self.language)));
        }

        let created = self
            .events
            .create(draft)
            .await
            .map_err(|e| self.provider_error(intent, e))?;

        Ok(ConverseResponse {
            event: Some(draft.clone()),
            outcome: Some(Outcome::EventCreated {
                event_id: created.id,
                view_link: created.html_link,
                meet_link: created.meet_link,
            }),
            ..ConverseResponse::reply(intent, &messages::event_created(self.language, &draft.title))
        })
    }

    /// Create the task, then its subtasks one at a time under it. A
    /// failed subtask is counted and the rest are still attempted.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<ConverseResponse, AssistantError> {
        let intent = IntentKind::CreateTask;
        if draft.title.trim().is_empty() {
            let reason = messages::missing_information(self.language, &["title".to_string()]);
            return Ok(self.rejected(intent, &reason));
        }

        let list_id = self.tasks.resolve_list_id(draft.task_list.as_deref()).await;
        let parent = self
            .tasks
            .create(draft, &list_id, None)
            .await
            .map_err(|e| self.provider_error(intent, e))?;

        let mut subtasks_created = 0;
        let mut subtasks_failed = 0;
        for subtask in &draft.subtasks {
            if subtask.title.trim().is_empty() {
                tracing::warn!("Skipping subtask without a title");
                subtasks_failed += 1;
                continue;
            }
            match self.tasks.create(subtask, &list_id, Some(&parent.id)).await {
                Ok(_) => subtasks_created += 1,
                Err(e) => {
                    tracing::warn!("Failed to create subtask '{}': {}", subtask.title, e);
                    subtasks_failed += 1;
                }
            }
        }

        Ok(ConverseResponse {
            task: Some(draft.clone()),
            outcome: Some(Outcome::TaskCreated {
                task_id: parent.id,
                subtasks_created,
                subtasks_failed,
            }),
            ..ConverseResponse::reply(
                intent,
                &messages::task_created(
                    self.language,
                    &draft.title,
                    subtasks_created,
                    subtasks_failed,
                ),
            )
        })
    }

    pub async fn delete_events(
        &self,
        refs: &[EventRef],
    ) -> Result<ConverseResponse, AssistantError> {
        let results = join_all(refs.iter().map(|r| async move {
            self.events.delete(&r.id).await.map_err(ItemError::from)
        }))
        .await;
        let ids: Vec<&str> = refs.iter().map(|r| r.id.as_str()).collect();
        self.batch_response(
            IntentKind::DeleteEvent,
            BatchOperation::Delete,
            Noun::Event,
            BatchReport::collect(&ids, results),
        )
    }

    pub async fn delete_tasks(&self, refs: &[TaskRef]) -> Result<ConverseResponse, AssistantError> {
        let results = join_all(refs.iter().map(|r| async move {
            self.tasks
                .delete(&r.id, &r.task_list_id)
                .await
                .map_err(ItemError::from)
        }))
        .await;
        let ids: Vec<&str> = refs.iter().map(|r| r.id.as_str()).collect();
        self.batch_response(
            IntentKind::DeleteTask,
            BatchOperation::Delete,
            Noun::Task,
            BatchReport::collect(&ids, results),
        )
    }

    async fn update_event(&self, id: &str, updates: &EventUpdates) -> Result<(), ItemError> {
        let current = self.events.get(id).await?;
        let merged = merge_event(&current, updates, self.timezone);
        if !has_valid_times(&merged) {
            return Err(ItemError::InvalidTimes);
        }
        self.events.update(&merged).await?;
        Ok(())
    }

    pub async fn update_events(
        &self,
        refs: &[EventRef],
        updates: &EventUpdates,
    ) -> Result<ConverseResponse, AssistantError> {
        let results = join_all(refs.iter().map(|r| self.update_event(&r.id, updates))).await;
        let ids: Vec<&str> = refs.iter().map(|r| r.id.as_str()).collect();
        self.batch_response(
            IntentKind::UpdateEvent,
            BatchOperation::Update,
            Noun::Event,
            BatchReport::collect(&ids, results),
        )
    }

    async fn update_task(
        &self,
        task_ref: &TaskRef,
        updates: &TaskUpdates,
    ) -> Result<(), ItemError> {
        let current = self.tasks.get(&task_ref.id, &task_ref.task_list_id).await?;
        self.tasks.update(&merge_task(&current, updates)).await?;
        Ok(())
    }

    pub async fn update_tasks(
        &self,
        refs: &[TaskRef],
        updates: &TaskUpdates,
    ) -> Result<ConverseResponse, AssistantError> {
        let results = join_all(refs.iter().map(|r| self.update_task(r, updates))).await;
        let ids: Vec<&str> = refs.iter().map(|r| r.id.as_str()).collect();
        self.batch_response(
            IntentKind::UpdateTask,
            BatchOperation::Update,
            Noun::Task,
            BatchReport::collect(&ids, results),
        )
    }

    fn batch_response(
        &self,
        intent: IntentKind,
        operation: BatchOperation,
        noun: Noun,
        report: BatchReport,
    ) -> Result<ConverseResponse, AssistantError> {
        let failed_count = report.failures.len();
        let mut failures = report.failures;

        if report.success_count == 0 && failed_count > 0 {
            // Nothing went through: surface an expired session or an
            // invalid time range instead of a bare count
            if let Some(pos) = failures
                .iter()
                .position(|f| matches!(f, ItemError::Provider(e) if e.is_auth()))
                && let ItemError::Provider(e) = failures.swap_remove(pos)
            {
                return Err(self.provider_error(intent, e));
            }
            if failures.iter().all(|f| matches!(f, ItemError::InvalidTimes)) {
                return Ok(self.rejected(intent, messages::invalid_time_range(self.language)));
            }
        }

        let text = match operation {
            BatchOperation::Delete => {
                messages::batch_deleted(self.language, report.success_count, failed_count, noun)
            }
            BatchOperation::Update => {
                messages::batch_updated(self.language, report.success_count, failed_count, noun)
            }
        };
        tracing::info!(
            "{:?} finished: {} succeeded, {} failed",
            intent,
            report.success_count,
            failed_count
        );
        Ok(ConverseResponse {
            outcome: Some(Outcome::Batch {
                operation,
                success_count: report.success_count,
                failed_count,
            }),
            ..ConverseResponse::reply(intent, &text)
        })
    }

    /// Events between the query's dates, today when none are given.
    pub async fn list_events(
        &self,
        query: &ListQuery,
        now: DateTime<Tz>,
    ) -> Result<Vec<CalendarEvent>, AssistantError> {
        let start = query.start_date.unwrap_or_else(|| now.date_naive());
        let end = query.end_date.filter(|end| *end >= start).unwrap_or(start);
        let max_results = query
            .max_results
            .unwrap_or(DEFAULT_LIST_MAX_RESULTS)
            .clamp(1, LIST_MAX_RESULTS_CAP);
        let window = day_window(start, end, self.timezone);
        let events = self
            .events
            .list(&window, max_results)
            .await
            .map_err(|e| self.provider_error(IntentKind::ListEvents, e))?;
        Ok(events.iter().map(CalendarEvent::from).collect())
    }

    /// Tasks in the query's list, completed ones included, optionally
    /// limited to a due date range.
    pub async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<TaskItem>, AssistantError> {
        let list_id = self.tasks.resolve_list_id(query.task_list.as_deref()).await;
        let filter = TaskFilter {
            due_min: query.start_date,
            due_max: query.end_date,
            show_completed: true,
            max_results: query.max_results,
        };
        self.tasks
            .list(&list_id, &filter)
            .await
            .map_err(|e| self.provider_error(IntentKind::ListTasks, e))
    }
}
