//! Reusable prompts using Handlebars for templating. User and model
//! text is only ever passed in as data, never parsed as a template, and
//! HTML escaping is turned off since the output goes to a model.

use std::fmt;

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use handlebars::{Handlebars, RenderError};
use serde_json::json;

use crate::assistant::models::{ConversationRole, ConversationTurn};

/// Number of previous turns included in the prompt.
pub const HISTORY_WINDOW: usize = 5;

#[derive(Debug)]
pub enum Prompt {
    Interpret,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub const SYSTEM_INSTRUCTIONS: &str = r#"You are a personal assistant that manages the user's Google Calendar events and Google Tasks. You understand requests written in natural language, in Spanish or English, and answer in the same language the user writes in.

Classify every message into exactly one intent:
- create_event: schedule a new event
- update_event: change an existing event (time, title, color, reminders...)
- delete_event: remove one or more existing events
- list_events: show events in a period
- create_task: add a task, optionally with subtasks
- update_task: change an existing task
- delete_task: remove one or more existing tasks
- list_tasks: show tasks
- clarify: required information is missing, ask for it
- general: anything else (greetings, questions about what you can do)

Always answer with a single JSON object with this shape:
{
  "intent": "<one of the intents above>",
  "needs_confirmation": true or false,
  "missing_fields": ["names of required fields you could not infer"],
  "event": {
    "title": "Event title",
    "description": "optional description or null",
    "location": "optional location or null",
    "start": "YYYY-MM-DDTHH:mm:ss",
    "end": "YYYY-MM-DDTHH:mm:ss",
    "attendees": ["email@example.com"],
    "color": "color name or null",
    "reminders": {"useDefault": false, "overrides": [{"method": "popup", "minutes": 30}]},
    "recurrence": ["RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR"],
    "conferenceData": {"createMeetLink": true}
  },
  "task": {
    "title": "Task title",
    "description": "optional notes or null",
    "due_date": "YYYY-MM-DD or null",
    "tasklist_id": "list name or null",
    "subtasks": [{"title": "Subtask", "description": null, "due_date": null}]
  },
  "query": {"startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD", "taskList": "list name or null"},
  "deleteQuery": {"queries": [{"title": "words from the title", "date": "YYYY-MM-DD", "timeRange": {"start": "YYYY-MM-DDTHH:mm:ss", "end": "YYYY-MM-DDTHH:mm:ss"}}]},
  "taskQuery": {"queries": [{"title": "words from the title", "taskListId": "list name or null", "dueDate": "YYYY-MM-DD or null"}]},
  "editQuery": {
    "searchCriteria": {"title": "words from the title", "date": "YYYY-MM-DD"},
    "updates": {"summary": "new title", "start_time": "YYYY-MM-DDTHH:mm:ss", "end_time": "YYYY-MM-DDTHH:mm:ss", "color": "color name", "description": "new description", "location": "new location", "reminders": {"useDefault": false, "overrides": [{"method": "email", "minutes": 60}]}, "recurrence": ["RRULE:..."], "conferenceData": {"createMeetLink": true}}
  },
  "taskEditQuery": {
    "searchCriteria": {"title": "words from the title", "taskListId": "list name or null", "dueDate": "YYYY-MM-DD or null"},
    "updates": {"title": "new title", "description": "new notes", "due_date": "YYYY-MM-DD"}
  },
  "response": "Short, friendly reply for the user"
}

Only include the keys relevant to the intent. In updates include only the fields the user wants to change.

Rules:
- Resolve relative dates ("today", "tomorrow", "next Monday", "mañana", "el viernes") using the current date given below. Times are local to the user's timezone, never add a UTC offset.
- If the end of an event isn't mentioned, leave "end" out and the event will last one hour.
- If the user wants to delete several things at once ("delete the gym and the dentist"), add one entry per thing to "deleteQuery.queries", in the order they were mentioned.
- Never invent an email address. Attendees must be email addresses the user gave you.
- Recurring events use RFC 5545 rules, for example "RRULE:FREQ=DAILY;COUNT=5", "RRULE:FREQ=WEEKLY;BYDAY=TU,TH" or "RRULE:FREQ=MONTHLY;BYMONTHDAY=1".
- Add "conferenceData": {"createMeetLink": true} only when the user asks for a video call, Meet link or virtual meeting.
- Reminder methods are "email" or "popup", minutes before the start.
- Event colors, Spanish or English: lavanda/lavender, verde/sage, violeta/grape, rosa/flamingo, amarillo/banana, naranja/tangerine, azul/peacock, gris/graphite, azul oscuro/blueberry, verde oscuro/basil, rojo/tomato.
- Task lists are referred to by name; leave "tasklist_id" null to use the default list.
- Creating, updating or deleting always needs confirmation: set "needs_confirmation" to true. Listing doesn't.
- If a required field is missing (an event without a start time, a task without a title), use intent "clarify", list the field in "missing_fields" and ask for it in "response"."#;

const INTERPRET_PROMPT: &str = r#"{{system}}

Current date and time: {{now}} ({{weekday}}), timezone {{timezone}}.
Today is {{today}}. Tomorrow is {{tomorrow}}. The day after tomorrow is {{day_after}}.
{{#if history}}

Conversation so far:
{{#each history}}
{{speaker}}: {{text}}
{{/each}}
{{/if}}

User: {{message}}

Reply ONLY with valid JSON, with no text before or after it."#;

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(&Prompt::Interpret.to_string(), INTERPRET_PROMPT)
        .expect("Failed to register template");
    registry
}

/// Render the full interpretation prompt. Only the last
/// `HISTORY_WINDOW` turns of `history` are included.
pub fn build_prompt(
    system: &str,
    history: &[ConversationTurn],
    now: DateTime<Tz>,
    message: &str,
) -> Result<String, RenderError> {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let turns: Vec<_> = recent
        .iter()
        .map(|turn| {
            json!({
                "speaker": match turn.role {
                    ConversationRole::User => "User",
                    ConversationRole::Assistant => "Assistant",
                },
                "text": turn.text,
            })
        })
        .collect();
    let today = now.date_naive();
    let data = json!({
        "system": system,
        "now": now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "weekday": now.format("%A").to_string(),
        "timezone": now.timezone().name(),
        "today": today.format("%Y-%m-%d").to_string(),
        "tomorrow": (today + Duration::days(1)).format("%Y-%m-%d").to_string(),
        "day_after": (today + Duration::days(2)).format("%Y-%m-%d").to_string(),
        "history": turns,
        "message": message,
    });
    templates().render(&Prompt::Interpret.to_string(), &data)
}
