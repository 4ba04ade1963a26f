use std::env;
use std::str::FromStr;

use chrono_tz::Tz;

/// Which completion service interprets user messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmBackend {
    /// Any OpenAI compatible `/v1/chat/completions` host (OpenAI, Groq,
    /// a local server).
    OpenAi,
    Gemini,
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "groq" => Ok(LlmBackend::OpenAi),
            "gemini" => Ok(LlmBackend::Gemini),
            other => Err(format!("Unknown LLM backend: {}", other)),
        }
    }
}

/// Language of the fixed replies that don't come from the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Es,
    En,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "es" | "spanish" => Ok(Language::Es),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Argentina::Buenos_Aires;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub llm_backend: LlmBackend,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub gemini_api_hostname: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_api_hostname: String,
    pub google_token_url: String,
    pub timezone: Tz,
    pub language: Language,
    pub system_prompt: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("ASSISTANT_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path.trim_end_matches('/'));
        let llm_backend = env::var("ASSISTANT_LLM_BACKEND")
            .ok()
            .and_then(|v| {
                v.parse()
                    .inspect_err(|e| tracing::warn!("{}, falling back to openai", e))
                    .ok()
            })
            .unwrap_or(LlmBackend::OpenAi);
        let openai_api_hostname = env::var("ASSISTANT_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model =
            env::var("ASSISTANT_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let gemini_api_hostname = env::var("ASSISTANT_GEMINI_HOST")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_model =
            env::var("ASSISTANT_GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let google_client_id = env::var("ASSISTANT_GOOGLE_CLIENT_ID").unwrap_or_default();
        let google_client_secret = env::var("ASSISTANT_GOOGLE_CLIENT_SECRET").unwrap_or_default();
        let google_api_hostname = env::var("ASSISTANT_GOOGLE_API_HOST")
            .unwrap_or_else(|_| "https://www.googleapis.com".to_string());
        let google_token_url = env::var("ASSISTANT_GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string());
        let timezone = env::var("ASSISTANT_TIMEZONE")
            .ok()
            .and_then(|v| {
                v.parse::<Tz>()
                    .inspect_err(|e| tracing::warn!("Invalid ASSISTANT_TIMEZONE: {}", e))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEZONE);
        let language = env::var("ASSISTANT_LANGUAGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let system_prompt = env::var("ASSISTANT_SYSTEM_PROMPT").ok();

        Self {
            storage_path,
            db_path,
            llm_backend,
            openai_api_hostname,
            openai_api_key,
            openai_model,
            gemini_api_hostname,
            gemini_api_key,
            gemini_model,
            google_client_id,
            google_client_secret,
            google_api_hostname,
            google_token_url,
            timezone,
            language,
            system_prompt,
        }
    }
}
