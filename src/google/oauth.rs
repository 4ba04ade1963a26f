//! OAuth2 token exchange and refresh against Google's token endpoint.
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use super::classify_failure;
use crate::assistant::provider::{ProviderError, TokenSource};

/// Scopes the assistant needs: read and write events and tasks.
pub const SCOPES: &str =
    "https://www.googleapis.com/auth/calendar.events https://www.googleapis.com/auth/tasks";

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

pub fn consent_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SCOPES)
    )
}

async fn request_token(
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<OAuthToken, ProviderError> {
    let res = reqwest::Client::new()
        .post(token_url)
        .form(form)
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(match classify_failure(status.as_u16(), &text) {
            ProviderError::Unauthorized(msg) => ProviderError::Unauthorized(msg),
            other => ProviderError::Refresh(other.reason()),
        });
    }
    Ok(serde_json::from_str(&text)?)
}

pub async fn exchange_code_for_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthToken, ProviderError> {
    request_token(
        token_url,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ],
    )
    .await
}

/// Trade a long lived refresh token for a new access token.
pub async fn refresh_access_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OAuthToken, ProviderError> {
    request_token(
        token_url,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ],
    )
    .await
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Access tokens minted from a stored refresh token, reused until a
/// minute before they expire.
pub struct RefreshingToken {
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshingToken {
    pub fn new(token_url: &str, client_id: &str, client_secret: &str, refresh_token: &str) -> Self {
        Self {
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenSource for RefreshingToken {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at - Duration::minutes(1) > Utc::now()
        {
            return Ok(token.access_token.clone());
        }

        tracing::debug!("Refreshing Google access token");
        let token = refresh_access_token(
            &self.token_url,
            &self.client_id,
            &self.client_secret,
            &self.refresh_token,
        )
        .await?;
        let expires_at = Utc::now() + Duration::seconds(token.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}
