use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::core::{AppConfig, LlmBackend};
use crate::gemini;
use crate::openai::{self, Message, Role, SamplingOptions};

/// A text in, text out language model call.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Any service speaking the OpenAI chat completions protocol.
pub struct OpenAiCompletion {
    pub api_hostname: String,
    pub api_key: String,
    pub model: String,
}

#[async_trait]
impl Completion for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = vec![Message::new(Role::User, prompt)];
        let resp = openai::completion(
            &messages,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            SamplingOptions::default(),
        )
        .await?;
        openai::completion_content(&resp)
            .filter(|content| !content.trim().is_empty())
            .map(String::from)
            .ok_or_else(|| anyhow!("Completion response had no content: {}", resp))
    }
}

pub struct GeminiCompletion {
    pub api_hostname: String,
    pub api_key: String,
    pub model: String,
}

#[async_trait]
impl Completion for GeminiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let resp = gemini::generate_content(
            prompt,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            SamplingOptions::default(),
        )
        .await?;
        gemini::candidate_text(&resp)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow!("Gemini response had no candidates: {}", resp))
    }
}

pub fn from_config(config: &AppConfig) -> Arc<dyn Completion> {
    match config.llm_backend {
        LlmBackend::OpenAi => Arc::new(OpenAiCompletion {
            api_hostname: config.openai_api_hostname.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }),
        LlmBackend::Gemini => Arc::new(GeminiCompletion {
            api_hostname: config.gemini_api_hostname.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }),
    }
}
