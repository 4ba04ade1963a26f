//! Request scoped entities exchanged between the caller, the model and
//! the providers. Field names follow the JSON the model is asked to
//! produce so the same types parse model output and caller echoes.
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ConversationRole,
    #[serde(alias = "content")]
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: &str) -> Self {
        Self {
            role: ConversationRole::User,
            text: text.to_string(),
        }
    }

    pub fn assistant(text: &str) -> Self {
        Self {
            role: ConversationRole::Assistant,
            text: text.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    Popup,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: ReminderMethod,
    pub minutes: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminders {
    #[serde(rename = "useDefault", default)]
    pub use_default: bool,
    #[serde(
        default,
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceRequest {
    #[serde(rename = "createMeetLink", default)]
    pub create_meet_link: bool,
}

/// An event pending creation. `end` may be left out, in which case the
/// event lasts one hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(alias = "summary")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(alias = "start_time", with = "wire::local_datetime")]
    pub start: NaiveDateTime,
    #[serde(
        default,
        alias = "end_time",
        with = "wire::opt_local_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,
    #[serde(
        default,
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attendees: Vec<String>,
    #[serde(
        default,
        deserialize_with = "wire::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(
        default,
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub recurrence: Vec<String>,
    #[serde(
        default,
        rename = "conferenceData",
        skip_serializing_if = "Option::is_none"
    )]
    pub conference: Option<ConferenceRequest>,
}

impl EventDraft {
    pub fn wants_meet_link(&self) -> bool {
        self.conference.is_some_and(|c| c.create_meet_link)
    }

    pub fn resolved_end(&self) -> NaiveDateTime {
        self.end
            .unwrap_or_else(|| self.start + chrono::Duration::hours(1))
    }
}

/// A task pending creation. Only the top level draft's `subtasks` are
/// processed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        alias = "dueDate",
        with = "wire::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    /// Human list name or provider list id
    #[serde(
        default,
        rename = "tasklist_id",
        alias = "taskList",
        alias = "tasklist",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_list: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subtasks: Vec<TaskDraft>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "wire::local_datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "wire::local_datetime")]
    pub end: NaiveDateTime,
}

/// A fuzzy reference to one or more existing resources. `date` wins over
/// `time_range` when both are given.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, with = "wire::opt_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, rename = "timeRange", skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(
        default,
        rename = "taskListId",
        alias = "tasklistId",
        alias = "tasklist_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_list: Option<String>,
    #[serde(
        default,
        rename = "dueDate",
        alias = "due_date",
        with = "wire::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl SearchCriteria {
    pub fn is_empty(&self) -> bool {
        self.title.as_deref().is_none_or(|t| t.trim().is_empty())
            && self.date.is_none()
            && self.time_range.is_none()
            && self.due_date.is_none()
    }
}

/// Partial update of an event. A `None` field keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdates {
    #[serde(default, alias = "summary", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        rename = "start_time",
        alias = "start",
        with = "wire::opt_local_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<NaiveDateTime>,
    #[serde(
        default,
        rename = "end_time",
        alias = "end",
        with = "wire::opt_local_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,
    #[serde(
        default,
        deserialize_with = "wire::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(
        default,
        rename = "conferenceData",
        skip_serializing_if = "Option::is_none"
    )]
    pub conference: Option<ConferenceRequest>,
}

impl EventUpdates {
    pub fn is_empty(&self) -> bool {
        *self == EventUpdates::default()
    }
}

/// Partial update of a task. A `None` field keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        alias = "dueDate",
        with = "wire::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl TaskUpdates {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdates::default()
    }
}

/// Bounds for list operations. For tasks the dates filter by due date.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(
        default,
        rename = "startDate",
        alias = "dueMin",
        with = "wire::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        rename = "endDate",
        alias = "dueMax",
        with = "wire::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(default, rename = "maxResults", skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(
        default,
        rename = "taskList",
        alias = "tasklist",
        alias = "tasklistName",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_list: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventTime {
    At(DateTime<FixedOffset>),
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn to_wire_string(&self) -> String {
        match self {
            EventTime::At(dt) => dt.to_rfc3339(),
            EventTime::AllDay(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// The full current state of an event, as read before an update.
#[derive(Clone, Debug, PartialEq)]
pub struct EventResource {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub time_zone: Option<String>,
    pub color_id: Option<String>,
    pub reminders: Option<Reminders>,
    pub recurrence: Vec<String>,
    pub attendees: Vec<String>,
    pub html_link: Option<String>,
    pub meet_link: Option<String>,
    /// Ask the provider for a new video call link on write
    pub request_meet_link: bool,
    /// Provider fields the core doesn't model, written back untouched
    pub extra: Map<String, Value>,
}

/// Normalized event returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
}

impl From<&EventResource> for CalendarEvent {
    fn from(event: &EventResource) -> Self {
        Self {
            id: event.id.clone(),
            title: event
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "(No title)".to_string()),
            description: event.description.clone(),
            location: event.location.clone(),
            start: event.start.to_wire_string(),
            end: event.end.to_wire_string(),
            color_id: event.color_id.clone(),
            html_link: event.html_link.clone(),
            meet_link: event.meet_link.clone(),
            attendees: event.attendees.clone(),
            recurrence: event.recurrence.clone(),
        }
    }
}

/// A task as stored by the provider, also the normalized form returned
/// to the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "wire::opt_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub task_list_id: String,
    /// Provider fields the core doesn't model, written back untouched
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<&CalendarEvent> for EventRef {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id.clone(),
            title: Some(event.title.clone()),
        }
    }
}

pub const DEFAULT_TASK_LIST: &str = "@default";

fn default_task_list() -> String {
    DEFAULT_TASK_LIST.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    #[serde(default = "default_task_list", alias = "tasklistId")]
    pub task_list_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<&TaskItem> for TaskRef {
    fn from(task: &TaskItem) -> Self {
        Self {
            id: task.id.clone(),
            task_list_id: task.task_list_id.clone(),
            title: Some(task.title.clone()),
        }
    }
}

/// The confirmation envelope. The caller keeps it between the proposal
/// and the confirmation and echoes it back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PendingAction {
    CreateEvent(EventDraft),
    DeleteEvent(Vec<EventRef>),
    UpdateEvent {
        #[serde(rename = "resourceRefs")]
        refs: Vec<EventRef>,
        updates: EventUpdates,
    },
    CreateTask(TaskDraft),
    DeleteTask(Vec<TaskRef>),
    UpdateTask {
        #[serde(rename = "resourceRefs")]
        refs: Vec<TaskRef>,
        updates: TaskUpdates,
    },
}

impl PendingAction {
    pub fn intent_kind(&self) -> IntentKind {
        match self {
            PendingAction::CreateEvent(_) => IntentKind::CreateEvent,
            PendingAction::DeleteEvent(_) => IntentKind::DeleteEvent,
            PendingAction::UpdateEvent { .. } => IntentKind::UpdateEvent,
            PendingAction::CreateTask(_) => IntentKind::CreateTask,
            PendingAction::DeleteTask(_) => IntentKind::DeleteTask,
            PendingAction::UpdateTask { .. } => IntentKind::UpdateTask,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    ListEvents,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListTasks,
    Clarify,
    #[default]
    General,
}

impl IntentKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        serde_json::from_value(Value::String(tag.trim().to_lowercase())).ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Confirm,
    Cancel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingActionReply {
    pub decision: Decision,
    pub action: PendingAction,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "wire::null_as_default")]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub pending_action: Option<PendingActionReply>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    Delete,
    Update,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Outcome {
    EventCreated {
        event_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_link: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meet_link: Option<String>,
    },
    TaskCreated {
        task_id: String,
        subtasks_created: usize,
        subtasks_failed: usize,
    },
    Batch {
        operation: BatchOperation,
        success_count: usize,
        failed_count: usize,
    },
    Rejected {
        reason: String,
    },
    Cancelled,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub response: String,
    pub intent: IntentKind,
    pub needs_confirmation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_events: Option<Vec<CalendarEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_tasks: Option<Vec<TaskItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<CalendarEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl ConverseResponse {
    pub fn reply(intent: IntentKind, response: &str) -> Self {
        Self {
            response: response.to_string(),
            intent,
            ..Default::default()
        }
    }
}

/// Lenient (de)serializers for the loosely formatted values a language
/// model produces.
pub(crate) mod wire {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn parse_local_datetime(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
            .ok()
            // Keep the wall clock time when the model adds an offset
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
    }

    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        let day = s.split(['T', ' ']).next().unwrap_or(s);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub mod local_datetime {
        use super::*;

        pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&dt.format(DATETIME_FORMAT).to_string())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
            let raw = String::deserialize(d)?;
            parse_local_datetime(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {}", raw)))
        }
    }

    pub mod opt_local_datetime {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_str(&dt.format(DATETIME_FORMAT).to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse_local_datetime(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {}", raw))),
                None => Ok(None),
            }
        }
    }

    pub mod opt_date {
        use super::*;

        pub fn serialize<S: Serializer>(d: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse_date(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
                None => Ok(None),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Str(String),
        Num(i64),
    }

    pub fn opt_string_or_number<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Option::<StringOrNumber>::deserialize(d)? {
            Some(StringOrNumber::Str(s)) if s.trim().is_empty() => None,
            Some(StringOrNumber::Str(s)) => Some(s),
            Some(StringOrNumber::Num(n)) => Some(n.to_string()),
            None => None,
        })
    }
}
