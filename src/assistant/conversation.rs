use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::broker::ConfirmationBroker;
use super::error::AssistantError;
use super::models::{ConverseRequest, ConverseResponse, Decision};
use super::provider::{EventsProvider, TasksProvider, TokenSource};
use crate::ai::completion::{self, Completion};
use crate::ai::prompt::{SYSTEM_INSTRUCTIONS, build_prompt};
use crate::ai::IntentInterpreter;
use crate::core::{AppConfig, Language};
use crate::google::{GoogleCalendar, GoogleTasks};

/// One conversational turn: interpret a new message, or settle a
/// pending action the caller echoed back.
pub struct Assistant {
    interpreter: IntentInterpreter,
    broker: ConfirmationBroker,
    system_prompt: String,
    timezone: Tz,
    language: Language,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn Completion>,
        events: Arc<dyn EventsProvider>,
        tasks: Arc<dyn TasksProvider>,
        timezone: Tz,
        language: Language,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            interpreter: IntentInterpreter::new(completion, language),
            broker: ConfirmationBroker::new(events, tasks, timezone, language),
            system_prompt: system_prompt.unwrap_or_else(|| SYSTEM_INSTRUCTIONS.to_string()),
            timezone,
            language,
        }
    }

    /// Wire the configured model backend and Google adapters around
    /// `tokens`.
    pub fn from_config(config: &AppConfig, tokens: Arc<dyn TokenSource>) -> Self {
        let events = Arc::new(GoogleCalendar::new(
            &config.google_api_hostname,
            tokens.clone(),
            config.timezone,
        ));
        let tasks = Arc::new(GoogleTasks::new(
            &config.google_api_hostname,
            tokens,
            config.timezone,
        ));
        Self::new(
            completion::from_config(config),
            events,
            tasks,
            config.timezone,
            config.language,
            config.system_prompt.clone(),
        )
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub async fn converse(
        &self,
        request: ConverseRequest,
        now: DateTime<Tz>,
    ) -> Result<ConverseResponse, AssistantError> {
        if let Some(reply) = request.pending_action {
            return match reply.decision {
                Decision::Confirm => self.broker.confirm(reply.action).await,
                Decision::Cancel => Ok(self.broker.cancel(&reply.action)),
            };
        }

        let prompt = build_prompt(
            &self.system_prompt,
            &request.conversation_history,
            now,
            &request.message,
        )
        .map_err(|e| AssistantError::Internal(e.into()))?;
        let interpretation = self.interpreter.interpret(&prompt).await?;
        self.broker.propose(interpretation, now).await
    }
}
