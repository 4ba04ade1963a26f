//! Typed reading of the model's JSON reply. Anything malformed turns
//! into a conversational reply rather than an error.
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::assistant::messages;
use crate::assistant::models::{
    EventDraft, EventUpdates, IntentKind, ListQuery, SearchCriteria, TaskDraft, TaskUpdates,
};
use crate::core::Language;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json|JSON)?\s*").expect("Invalid regex"));

#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    CreateEvent(EventDraft),
    UpdateEvent {
        criteria: SearchCriteria,
        updates: EventUpdates,
    },
    DeleteEvent(Vec<SearchCriteria>),
    ListEvents(ListQuery),
    CreateTask(TaskDraft),
    UpdateTask {
        criteria: SearchCriteria,
        updates: TaskUpdates,
    },
    DeleteTask(Vec<SearchCriteria>),
    ListTasks(ListQuery),
    Clarify,
    General,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::CreateEvent(_) => IntentKind::CreateEvent,
            Intent::UpdateEvent { .. } => IntentKind::UpdateEvent,
            Intent::DeleteEvent(_) => IntentKind::DeleteEvent,
            Intent::ListEvents(_) => IntentKind::ListEvents,
            Intent::CreateTask(_) => IntentKind::CreateTask,
            Intent::UpdateTask { .. } => IntentKind::UpdateTask,
            Intent::DeleteTask(_) => IntentKind::DeleteTask,
            Intent::ListTasks(_) => IntentKind::ListTasks,
            Intent::Clarify => IntentKind::Clarify,
            Intent::General => IntentKind::General,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interpretation {
    pub intent: Intent,
    pub response: String,
    pub missing_fields: Vec<String>,
}

impl Interpretation {
    fn general(response: &str) -> Self {
        Self {
            intent: Intent::General,
            response: response.to_string(),
            missing_fields: vec![],
        }
    }
}

pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

fn payload<T: DeserializeOwned>(reply: &Value, key: &str) -> Option<T> {
    let value = reply.get(key).filter(|v| !v.is_null())?;
    serde_json::from_value(value.clone())
        .inspect_err(|e| tracing::warn!("Invalid '{}' in model reply: {}", key, e))
        .ok()
}

/// A list of criteria given either as `{"queries": [...]}` or as a
/// single criteria object. Criteria that match nothing in particular
/// are dropped.
fn criteria_list(reply: &Value, key: &str) -> Vec<SearchCriteria> {
    let Some(value) = reply.get(key).filter(|v| !v.is_null()) else {
        return vec![];
    };
    let items: Vec<Value> = match value.get("queries").and_then(Value::as_array) {
        Some(queries) => queries.clone(),
        None => vec![value.clone()],
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SearchCriteria>(item).ok())
        .filter(|c| !c.is_empty())
        .collect()
}

fn edit_query<U: DeserializeOwned>(reply: &Value, key: &str) -> Option<(SearchCriteria, U)> {
    let value = reply.get(key).filter(|v| !v.is_null())?;
    let criteria: SearchCriteria = serde_json::from_value(value.get("searchCriteria")?.clone())
        .inspect_err(|e| tracing::warn!("Invalid '{}.searchCriteria': {}", key, e))
        .ok()?;
    if criteria.is_empty() {
        return None;
    }
    let updates: U = serde_json::from_value(value.get("updates")?.clone())
        .inspect_err(|e| tracing::warn!("Invalid '{}.updates': {}", key, e))
        .ok()?;
    Some((criteria, updates))
}

/// Parse the raw model output into an `Interpretation`.
pub fn parse_reply(raw: &str, lang: Language) -> Interpretation {
    let cleaned = strip_code_fences(raw);
    let reply: Value = match serde_json::from_str(&cleaned) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            tracing::warn!("Model reply is not a JSON object: {}", raw);
            return Interpretation::general(messages::unparseable_reply(lang));
        }
    };

    let response = reply["response"].as_str().unwrap_or_default().to_string();
    let mut missing_fields: Vec<String> = reply["missing_fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    let kind = reply["intent"]
        .as_str()
        .and_then(IntentKind::from_tag)
        .unwrap_or_else(|| {
            tracing::warn!("Unknown intent in model reply: {}", reply["intent"]);
            IntentKind::General
        });

    let (intent, missing) = match kind {
        IntentKind::CreateEvent => match payload::<EventDraft>(&reply, "event") {
            Some(draft) => (Intent::CreateEvent(draft), None),
            None => (Intent::Clarify, Some("event")),
        },
        IntentKind::UpdateEvent => match edit_query(&reply, "editQuery") {
            Some((criteria, updates)) => (Intent::UpdateEvent { criteria, updates }, None),
            None => (Intent::Clarify, Some("editQuery")),
        },
        IntentKind::DeleteEvent => match criteria_list(&reply, "deleteQuery") {
            criteria if criteria.is_empty() => (Intent::Clarify, Some("deleteQuery")),
            criteria => (Intent::DeleteEvent(criteria), None),
        },
        IntentKind::ListEvents => (
            Intent::ListEvents(payload(&reply, "query").unwrap_or_default()),
            None,
        ),
        IntentKind::CreateTask => match payload::<TaskDraft>(&reply, "task") {
            Some(draft) => (Intent::CreateTask(draft), None),
            None => (Intent::Clarify, Some("task")),
        },
        IntentKind::UpdateTask => match edit_query(&reply, "taskEditQuery") {
            Some((criteria, updates)) => (Intent::UpdateTask { criteria, updates }, None),
            None => (Intent::Clarify, Some("taskEditQuery")),
        },
        IntentKind::DeleteTask => match criteria_list(&reply, "taskQuery") {
            criteria if criteria.is_empty() => (Intent::Clarify, Some("taskQuery")),
            criteria => (Intent::DeleteTask(criteria), None),
        },
        IntentKind::ListTasks => (
            Intent::ListTasks(payload(&reply, "query").unwrap_or_default()),
            None,
        ),
        IntentKind::Clarify => (Intent::Clarify, None),
        IntentKind::General => (Intent::General, None),
    };

    if let Some(field) = missing
        && !missing_fields.iter().any(|f| f == field)
    {
        missing_fields.push(field.to_string());
    }

    let response = if response.trim().is_empty() && intent == Intent::Clarify {
        messages::missing_information(lang, &missing_fields)
    } else {
        response
    };

    Interpretation {
        intent,
        response,
        missing_fields,
    }
}
