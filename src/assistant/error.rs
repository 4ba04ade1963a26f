use thiserror::Error;

use super::messages;
use super::provider::ProviderError;
use crate::core::Language;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Completion service unavailable: {0}")]
    ModelUnavailable(String),

    #[error("No connected account")]
    AuthRequired,

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Problem {action}: {reason}")]
    Upstream { action: String, reason: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AssistantError {
    /// Classify a provider failure that happened while performing
    /// `action` (e.g. "creating the event").
    pub fn from_provider(action: &str, err: ProviderError) -> Self {
        match err {
            ProviderError::NoToken => AssistantError::AuthRequired,
            ProviderError::Unauthorized(msg) | ProviderError::Refresh(msg) => {
                AssistantError::SessionExpired(msg)
            }
            other => AssistantError::Upstream {
                action: action.to_string(),
                reason: other.reason(),
            },
        }
    }

    /// What the end user gets to see. Internal details stay in the logs.
    pub fn user_message(&self, lang: Language) -> String {
        match self {
            AssistantError::ModelUnavailable(_) => messages::model_unavailable(lang).to_string(),
            AssistantError::AuthRequired => messages::auth_required(lang).to_string(),
            AssistantError::SessionExpired(_) => messages::session_expired(lang).to_string(),
            AssistantError::Upstream { action, reason } => messages::problem(lang, action, reason),
            AssistantError::Internal(_) => messages::internal_error(lang).to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AssistantError::ModelUnavailable(_) => "model_unavailable",
            AssistantError::AuthRequired => "auth_required",
            AssistantError::SessionExpired(_) => "session_expired",
            AssistantError::Upstream { .. } => "upstream",
            AssistantError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider() {
        assert!(matches!(
            AssistantError::from_provider("listing events", ProviderError::NoToken),
            AssistantError::AuthRequired
        ));
        assert!(matches!(
            AssistantError::from_provider(
                "listing events",
                ProviderError::Unauthorized("invalid_grant".to_string())
            ),
            AssistantError::SessionExpired(_)
        ));
        let err = AssistantError::from_provider(
            "creating the event",
            ProviderError::Api {
                status: 400,
                message: "Invalid start time".to_string(),
            },
        );
        assert_eq!(err.to_string(), "Problem creating the event: Invalid start time");
        assert_eq!(err.kind(), "upstream");
    }
}
