//! Google Calendar v3 events adapter.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::colors::color_id;
use super::send;
use crate::assistant::models::{EventDraft, EventResource, EventTime, Reminders};
use crate::assistant::provider::{
    CreatedEvent, EventsProvider, ProviderError, TimeWindow, TokenSource,
};
use crate::assistant::time::localize;

const PRIMARY_CALENDAR: &str = "primary";
const SEARCH_MAX_RESULTS: u32 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminders: Option<Reminders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hangout_link: Option<String>,
    // Attendees, conference data and everything else we pass through
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

fn meet_request() -> Value {
    json!({
        "createRequest": {
            "requestId": uuid::Uuid::new_v4().to_string(),
            "conferenceSolutionKey": {"type": "hangoutsMeet"}
        }
    })
}

fn parse_event_time(time: Option<&EventDateTime>) -> Option<EventTime> {
    let time = time?;
    if let Some(dt) = time.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(dt).ok().map(EventTime::At);
    }
    time.date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(EventTime::AllDay)
}

fn to_event_date_time(time: &EventTime, time_zone: Option<&str>) -> EventDateTime {
    match time {
        EventTime::At(dt) => EventDateTime {
            date_time: Some(dt.to_rfc3339()),
            date: None,
            time_zone: time_zone.map(String::from),
        },
        EventTime::AllDay(d) => EventDateTime {
            date_time: None,
            date: Some(d.format("%Y-%m-%d").to_string()),
            time_zone: None,
        },
    }
}

impl TryFrom<GoogleEvent> for EventResource {
    type Error = ProviderError;

    fn try_from(event: GoogleEvent) -> Result<Self, Self::Error> {
        let id = event
            .id
            .clone()
            .ok_or_else(|| ProviderError::Malformed("event without id".to_string()))?;
        let start = parse_event_time(event.start.as_ref())
            .ok_or_else(|| ProviderError::Malformed(format!("event {} has no start", id)))?;
        let end = parse_event_time(event.end.as_ref()).unwrap_or_else(|| start.clone());
        let time_zone = event.start.as_ref().and_then(|s| s.time_zone.clone());
        let attendees = event
            .extra
            .get("attendees")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|a| a["email"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        let meet_link = event.hangout_link.clone().or_else(|| {
            event.extra.get("conferenceData")?["entryPoints"]
                .as_array()?
                .iter()
                .find(|e| e["entryPointType"] == "video")
                .and_then(|e| e["uri"].as_str().map(String::from))
        });

        Ok(EventResource {
            id,
            title: event.summary,
            description: event.description,
            location: event.location,
            start,
            end,
            time_zone,
            color_id: event.color_id,
            reminders: event.reminders,
            recurrence: event.recurrence.unwrap_or_default(),
            attendees,
            html_link: event.html_link,
            meet_link,
            request_meet_link: false,
            extra: event.extra,
        })
    }
}

impl From<&EventResource> for GoogleEvent {
    fn from(event: &EventResource) -> Self {
        let mut extra = event.extra.clone();
        if event.request_meet_link {
            extra.insert("conferenceData".to_string(), meet_request());
        }
        GoogleEvent {
            id: Some(event.id.clone()),
            summary: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start: Some(to_event_date_time(&event.start, event.time_zone.as_deref())),
            end: Some(to_event_date_time(&event.end, event.time_zone.as_deref())),
            color_id: event.color_id.clone(),
            reminders: event.reminders.clone(),
            recurrence: if event.recurrence.is_empty() {
                None
            } else {
                Some(event.recurrence.clone())
            },
            html_link: None,
            hangout_link: None,
            extra,
        }
    }
}

fn draft_to_event(draft: &EventDraft, tz: Tz) -> GoogleEvent {
    let zone = Some(tz.name());
    let color = draft.color.as_deref().and_then(|c| {
        let id = color_id(c);
        if id.is_none() {
            tracing::warn!("Unknown event color '{}', using the calendar default", c);
        }
        id
    });

    let mut extra = Map::new();
    if !draft.attendees.is_empty() {
        let attendees: Vec<Value> = draft
            .attendees
            .iter()
            .map(|email| json!({"email": email}))
            .collect();
        extra.insert("attendees".to_string(), Value::Array(attendees));
    }
    if draft.wants_meet_link() {
        extra.insert("conferenceData".to_string(), meet_request());
    }

    GoogleEvent {
        summary: Some(draft.title.clone()),
        description: draft.description.clone(),
        location: draft.location.clone(),
        start: Some(to_event_date_time(
            &EventTime::At(localize(draft.start, tz)),
            zone,
        )),
        end: Some(to_event_date_time(
            &EventTime::At(localize(draft.resolved_end(), tz)),
            zone,
        )),
        color_id: color.map(String::from),
        reminders: draft.reminders.clone(),
        recurrence: if draft.recurrence.is_empty() {
            None
        } else {
            Some(draft.recurrence.clone())
        },
        extra,
        ..Default::default()
    }
}

pub struct GoogleCalendar {
    client: Client,
    api_hostname: String,
    calendar_id: String,
    tokens: Arc<dyn TokenSource>,
    timezone: Tz,
}

impl GoogleCalendar {
    pub fn new(api_hostname: &str, tokens: Arc<dyn TokenSource>, timezone: Tz) -> Self {
        Self {
            client: Client::new(),
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            calendar_id: PRIMARY_CALENDAR.to_string(),
            tokens,
            timezone,
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendar/v3/calendars/{}/events",
            self.api_hostname,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(id))
    }

    async fn fetch_events(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<EventResource>, ProviderError> {
        let token = self.tokens.access_token().await?;
        let req = self
            .client
            .get(self.events_url())
            .bearer_auth(token)
            .query(query);
        let text = send(req).await?;
        let list: EventList = serde_json::from_str(&text)?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|e| {
                EventResource::try_from(e)
                    .inspect_err(|e| tracing::warn!("Skipping event: {}", e))
                    .ok()
            })
            .collect())
    }
}

fn window_query(window: &TimeWindow) -> Vec<(&'static str, String)> {
    vec![
        ("timeMin", window.start.to_rfc3339()),
        ("timeMax", window.end.to_rfc3339()),
        ("singleEvents", "true".to_string()),
        ("orderBy", "startTime".to_string()),
    ]
}

#[async_trait]
impl EventsProvider for GoogleCalendar {
    async fn create(&self, draft: &EventDraft) -> Result<CreatedEvent, ProviderError> {
        let token = self.tokens.access_token().await?;
        let body = draft_to_event(draft, self.timezone);
        let mut req = self.client.post(self.events_url()).bearer_auth(token);
        if draft.wants_meet_link() {
            req = req.query(&[("conferenceDataVersion", "1")]);
        }
        let text = send(req.json(&body)).await?;
        let created = EventResource::try_from(serde_json::from_str::<GoogleEvent>(&text)?)?;
        tracing::info!("Created event {}", created.id);
        Ok(CreatedEvent {
            id: created.id,
            html_link: created.html_link,
            meet_link: created.meet_link,
        })
    }

    async fn get(&self, id: &str) -> Result<EventResource, ProviderError> {
        let token = self.tokens.access_token().await?;
        let req = self.client.get(self.event_url(id)).bearer_auth(token);
        let text = send(req).await?;
        EventResource::try_from(serde_json::from_str::<GoogleEvent>(&text)?)
    }

    async fn update(&self, event: &EventResource) -> Result<EventResource, ProviderError> {
        let token = self.tokens.access_token().await?;
        let body = GoogleEvent::from(event);
        let mut req = self.client.put(self.event_url(&event.id)).bearer_auth(token);
        if body.extra.contains_key("conferenceData") {
            req = req.query(&[("conferenceDataVersion", "1")]);
        }
        let text = send(req.json(&body)).await?;
        EventResource::try_from(serde_json::from_str::<GoogleEvent>(&text)?)
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let token = self.tokens.access_token().await?;
        let req = self.client.delete(self.event_url(id)).bearer_auth(token);
        send(req).await?;
        Ok(())
    }

    async fn list(
        &self,
        window: &TimeWindow,
        max_results: u32,
    ) -> Result<Vec<EventResource>, ProviderError> {
        let mut query = window_query(window);
        query.push(("maxResults", max_results.to_string()));
        self.fetch_events(&query).await
    }

    async fn search(
        &self,
        query: Option<&str>,
        window: &TimeWindow,
    ) -> Result<Vec<EventResource>, ProviderError> {
        let mut params = window_query(window);
        params.push(("maxResults", SEARCH_MAX_RESULTS.to_string()));
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        self.fetch_events(&params).await
    }
}
