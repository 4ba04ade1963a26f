//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};

use super::public;
use crate::api::state::AppState;
use crate::assistant::provider::{StaticToken, TokenSource};
use crate::assistant::{Assistant, AssistantError};
use crate::core::{AppConfig, Language, db::find_refresh_token};
use crate::google::RefreshingToken;

type SharedState = Arc<RwLock<AppState>>;

fn error_response(err: &AssistantError, lang: Language) -> Response {
    let status = match err {
        AssistantError::AuthRequired | AssistantError::SessionExpired(_) => {
            StatusCode::UNAUTHORIZED
        }
        AssistantError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AssistantError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        AssistantError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("{}", err);
    } else {
        tracing::warn!("{}", err);
    }
    let body = public::ChatErrorResponse {
        error: err.user_message(lang),
        kind: err.kind().to_string(),
    };
    (status, Json(body)).into_response()
}

/// Pick the credential for this turn: the caller's bearer token wins,
/// then the stored refresh token of `account`.
async fn token_source(
    state: &SharedState,
    config: &AppConfig,
    bearer: Option<Bearer>,
    account: Option<&str>,
) -> Result<Option<Arc<dyn TokenSource>>, crate::api::public::ApiError> {
    if let Some(bearer) = bearer {
        let tokens: Arc<dyn TokenSource> = Arc::new(StaticToken::new(bearer.token()));
        return Ok(Some(tokens));
    }
    let Some(account) = account else {
        return Ok(None);
    };
    let db = state.read().expect("Unable to read share state").db.clone();
    let refresh_token = find_refresh_token(&db, account).await?;
    Ok(refresh_token.map(|token| {
        Arc::new(RefreshingToken::new(
            &config.google_token_url,
            &config.google_client_id,
            &config.google_client_secret,
            &token,
        )) as Arc<dyn TokenSource>
    }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(payload): Json<public::ChatRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let config = state
        .read()
        .expect("Unable to read share state")
        .config
        .clone();
    let lang = config.language;
    let public::ChatRequest { converse, account } = payload;

    if converse.message.trim().is_empty() && converse.pending_action.is_none() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(public::ChatErrorResponse {
                error: "Missing message".to_string(),
                kind: "bad_request".to_string(),
            }),
        )
            .into_response());
    }

    tracing::info!(
        "Chat turn: {} history turns, pending action: {:?}",
        converse.conversation_history.len(),
        converse
            .pending_action
            .as_ref()
            .map(|p| (p.decision, p.action.intent_kind()))
    );

    let bearer = bearer.map(|TypedHeader(Authorization(bearer))| bearer);
    let Some(tokens) = token_source(&state, &config, bearer, account.as_deref()).await? else {
        return Ok(error_response(&AssistantError::AuthRequired, lang));
    };

    let assistant = Assistant::from_config(&config, tokens);
    let now = assistant.now();
    match assistant.converse(converse, now).await {
        Ok(resp) => {
            tracing::info!(
                "Chat reply: intent {:?}, needs confirmation {}",
                resp.intent,
                resp.needs_confirmation
            );
            Ok(Json(resp).into_response())
        }
        Err(err) => Ok(error_response(&err, lang)),
    }
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(chat_handler))
}
