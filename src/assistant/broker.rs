//! Gate between interpretation and execution. Anything that creates,
//! changes or removes data is proposed first and only executed when the
//! caller echoes the pending action back with a confirmation.
use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use futures::future::join_all;
use itertools::Itertools;

use super::error::AssistantError;
use super::executor::ActionExecutor;
use super::messages::{self, Noun};
use super::models::{
    CalendarEvent, ConverseResponse, EventRef, IntentKind, Outcome, PendingAction, SearchCriteria,
    TaskItem, TaskRef,
};
use super::provider::{EventsProvider, ProviderError, TasksProvider, TimeWindow};
use super::time::{day_window, localize, upcoming_window};
use crate::ai::{Intent, Interpretation};
use crate::core::Language;

/// Merge the results of concurrent searches. Failed searches are
/// skipped unless they all failed or the credentials were rejected.
fn merge_search_results<T>(
    results: Vec<Result<Vec<T>, ProviderError>>,
    action: &str,
) -> Result<Vec<T>, AssistantError> {
    let total = results.len();
    let mut matches = vec![];
    let mut failures = vec![];
    for result in results {
        match result {
            Ok(items) => matches.extend(items),
            Err(e) => failures.push(e),
        }
    }
    if let Some(pos) = failures.iter().position(ProviderError::is_auth) {
        return Err(AssistantError::from_provider(action, failures.swap_remove(pos)));
    }
    if total > 0 && failures.len() == total {
        return Err(AssistantError::from_provider(action, failures.remove(0)));
    }
    for e in &failures {
        tracing::warn!("Search failed, continuing with the other results: {}", e);
    }
    Ok(matches)
}

fn criteria_window(criteria: &SearchCriteria, now: DateTime<Tz>) -> TimeWindow {
    let tz = now.timezone();
    if let Some(date) = criteria.date {
        day_window(date, date, tz)
    } else if let Some(range) = &criteria.time_range {
        TimeWindow {
            start: localize(range.start, tz),
            end: localize(range.end, tz),
        }
    } else {
        upcoming_window(now)
    }
}

pub struct ConfirmationBroker {
    events: Arc<dyn EventsProvider>,
    tasks: Arc<dyn TasksProvider>,
    executor: ActionExecutor,
    language: Language,
}

impl ConfirmationBroker {
    pub fn new(
        events: Arc<dyn EventsProvider>,
        tasks: Arc<dyn TasksProvider>,
        timezone: Tz,
        language: Language,
    ) -> Self {
        let executor = ActionExecutor::new(events.clone(), tasks.clone(), timezone, language);
        Self {
            events,
            tasks,
            executor,
            language,
        }
    }

    /// Route an interpretation. Mutations come back with
    /// `needs_confirmation` set and a pending action, reads run now.
    pub async fn propose(
        &self,
        interpretation: Interpretation,
        now: DateTime<Tz>,
    ) -> Result<ConverseResponse, AssistantError> {
        let lang = self.language;
        let Interpretation {
            intent,
            response,
            missing_fields,
        } = interpretation;
        let kind = intent.kind();

        match intent {
            Intent::CreateEvent(draft) => {
                if draft.title.trim().is_empty() {
                    return Ok(self.clarify(vec!["title".to_string()]));
                }
                if draft.resolved_end() <= draft.start {
                    return Ok(ConverseResponse::reply(kind, messages::invalid_time_range(lang)));
                }
                let text =
                    non_empty_or(response, || messages::confirm_create_event(lang, &draft.title));
                Ok(ConverseResponse {
                    needs_confirmation: true,
                    event: Some(draft.clone()),
                    pending_action: Some(PendingAction::CreateEvent(draft)),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::CreateTask(draft) => {
                if draft.title.trim().is_empty() {
                    return Ok(self.clarify(vec!["title".to_string()]));
                }
                let text =
                    non_empty_or(response, || messages::confirm_create_task(lang, &draft.title));
                Ok(ConverseResponse {
                    needs_confirmation: true,
                    task: Some(draft.clone()),
                    pending_action: Some(PendingAction::CreateTask(draft)),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::DeleteEvent(criteria) => {
                let matches = self.resolve_events(&criteria, now).await?;
                if matches.is_empty() {
                    return Ok(ConverseResponse::reply(kind, messages::no_matching_events(lang)));
                }
                let refs = matches.iter().map(EventRef::from).collect();
                let text = messages::confirm_delete(lang, matches.len(), Noun::Event);
                Ok(ConverseResponse {
                    needs_confirmation: true,
                    pending_action: Some(PendingAction::DeleteEvent(refs)),
                    matching_events: Some(matches.clone()),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::UpdateEvent { criteria, updates } => {
                if updates.is_empty() {
                    return Ok(ConverseResponse::reply(
                        IntentKind::Clarify,
                        messages::nothing_to_update(lang),
                    ));
                }
                let matches = self.resolve_events(&[criteria], now).await?;
                if matches.is_empty() {
                    return Ok(ConverseResponse::reply(kind, messages::no_matching_events(lang)));
                }
                let refs = matches.iter().map(EventRef::from).collect();
                let text = messages::confirm_update(lang, matches.len(), Noun::Event);
                Ok(ConverseResponse {
                    needs_confirmation: true,
                    pending_action: Some(PendingAction::UpdateEvent { refs, updates }),
                    matching_events: Some(matches.clone()),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::DeleteTask(criteria) => {
                let matches = self.resolve_tasks(&criteria).await?;
                if matches.is_empty() {
                    return Ok(ConverseResponse::reply(kind, messages::no_matching_tasks(lang)));
                }
                let refs = matches.iter().map(TaskRef::from).collect();
                let text = messages::confirm_delete(lang, matches.len(), Noun::Task);
                Ok(ConverseResponse {
                    needs_confirmation: true,
                    pending_action: Some(PendingAction::DeleteTask(refs)),
                    matching_tasks: Some(matches.clone()),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::UpdateTask { criteria, updates } => {
                if updates.is_empty() {
                    return Ok(ConverseResponse::reply(
                        IntentKind::Clarify,
                        messages::nothing_to_update(lang),
                    ));
                }
                let matches = self.resolve_tasks(&[criteria]).await?;
                if matches.is_empty() {
                    return Ok(ConverseResponse::reply(kind, messages::no_matching_tasks(lang)));
                }
                let refs = matches.iter().map(TaskRef::from).collect();
                let text = messages::confirm_update(lang, matches.len(), Noun::Task);
                Ok(ConverseResponse {
                    needs_confirmation: true,
                    pending_action: Some(PendingAction::UpdateTask { refs, updates }),
                    matching_tasks: Some(matches.clone()),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::ListEvents(query) => {
                let events = self.executor.list_events(&query, now).await?;
                let text = if events.is_empty() {
                    messages::no_events_listed(lang).to_string()
                } else {
                    non_empty_or(response, || messages::listed(lang, events.len(), Noun::Event))
                };
                Ok(ConverseResponse {
                    events: Some(events),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::ListTasks(query) => {
                let tasks = self.executor.list_tasks(&query).await?;
                let text = if tasks.is_empty() {
                    messages::no_tasks_listed(lang).to_string()
                } else {
                    non_empty_or(response, || messages::listed(lang, tasks.len(), Noun::Task))
                };
                Ok(ConverseResponse {
                    tasks: Some(tasks),
                    ..ConverseResponse::reply(kind, &text)
                })
            }
            Intent::Clarify => Ok(ConverseResponse {
                missing_fields,
                ..ConverseResponse::reply(kind, &response)
            }),
            Intent::General => Ok(ConverseResponse::reply(kind, &response)),
        }
    }

    /// Execute a pending action the caller confirmed.
    pub async fn confirm(&self, action: PendingAction) -> Result<ConverseResponse, AssistantError> {
        self.executor.execute(action).await
    }

    pub fn cancel(&self, action: &PendingAction) -> ConverseResponse {
        tracing::info!("Cancelled pending {:?}", action.intent_kind());
        ConverseResponse {
            outcome: Some(Outcome::Cancelled),
            ..ConverseResponse::reply(action.intent_kind(), messages::cancelled(self.language))
        }
    }

    fn clarify(&self, missing_fields: Vec<String>) -> ConverseResponse {
        ConverseResponse {
            response: messages::missing_information(self.language, &missing_fields),
            missing_fields,
            ..ConverseResponse::reply(IntentKind::Clarify, "")
        }
    }

    /// Search for every criteria at once. Matches are concatenated in
    /// criteria order and deduplicated by id, first occurrence wins.
    pub async fn resolve_events(
        &self,
        criteria: &[SearchCriteria],
        now: DateTime<Tz>,
    ) -> Result<Vec<CalendarEvent>, AssistantError> {
        let searches = criteria.iter().map(|c| async move {
            let window = criteria_window(c, now);
            self.events.search(c.title.as_deref(), &window).await
        });
        let results = join_all(searches).await;
        let action = messages::activity(self.language, IntentKind::ListEvents);
        let matches = merge_search_results(results, action)?;
        Ok(matches
            .iter()
            .map(CalendarEvent::from)
            .unique_by(|e| e.id.clone())
            .collect())
    }

    /// Open tasks matching any of the criteria, in criteria order and
    /// without duplicates.
    pub async fn resolve_tasks(
        &self,
        criteria: &[SearchCriteria],
    ) -> Result<Vec<TaskItem>, AssistantError> {
        let searches = criteria.iter().map(|c| async move {
            let list_id = self.tasks.resolve_list_id(c.task_list.as_deref()).await;
            self.tasks.search(c, &list_id).await
        });
        let results = join_all(searches).await;
        let action = messages::activity(self.language, IntentKind::ListTasks);
        let matches = merge_search_results(results, action)?;
        Ok(matches
            .into_iter()
            .unique_by(|t| (t.task_list_id.clone(), t.id.clone()))
            .collect())
    }
}

fn non_empty_or(text: String, fallback: impl FnOnce() -> String) -> String {
    if text.trim().is_empty() { fallback() } else { text }
}
