//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use tempfile::TempDir;
use tokio_rusqlite::Connection;

use assistant::api::AppState;
use assistant::api::app;
use assistant::core::config::DEFAULT_TIMEZONE;
use assistant::core::db::async_db;
use assistant::core::db::initialize_db;
use assistant::core::{AppConfig, Language, LlmBackend};

/// A router wired to a throwaway credential store. Keep the whole
/// struct alive for the duration of the test, dropping it removes the
/// store.
pub struct TestApp {
    pub router: Router,
    pub db: Connection,
    _dir: TempDir,
}

/// Config pointing the completion service at `llm_host` and every
/// Google endpoint at `google_host`.
pub fn test_config(db_path: &str, llm_host: &str, google_host: &str) -> AppConfig {
    AppConfig {
        storage_path: db_path.to_string(),
        db_path: db_path.to_string(),
        llm_backend: LlmBackend::OpenAi,
        openai_api_hostname: llm_host.to_string(),
        openai_api_key: String::from("test-api-key"),
        openai_model: String::from("gpt-4.1-mini"),
        gemini_api_hostname: llm_host.to_string(),
        gemini_api_key: String::from("test-gemini-key"),
        gemini_model: String::from("gemini-2.5-flash"),
        google_client_id: String::from("test_client_id"),
        google_client_secret: String::from("test_client_secret"),
        google_api_hostname: google_host.to_string(),
        google_token_url: format!("{}/token", google_host),
        timezone: DEFAULT_TIMEZONE,
        language: Language::Es,
        system_prompt: None,
    }
}

pub async fn test_app(llm_host: &str, google_host: &str) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().to_str().unwrap().to_string();

    let db = async_db(&db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = test_config(&db_path, llm_host, google_host);
    let app_state = AppState::new(db.clone(), app_config);
    TestApp {
        router: app(Arc::new(RwLock::new(app_state))),
        db,
        _dir: dir,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Wrap `content` the way an OpenAI compatible chat completion does.
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
