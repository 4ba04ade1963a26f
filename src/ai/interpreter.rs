use std::sync::Arc;

use super::completion::Completion;
use super::intent::{Interpretation, parse_reply};
use crate::assistant::error::AssistantError;
use crate::core::Language;

/// Turns a rendered prompt into a typed `Interpretation` by asking the
/// language model.
pub struct IntentInterpreter {
    completion: Arc<dyn Completion>,
    language: Language,
}

impl IntentInterpreter {
    pub fn new(completion: Arc<dyn Completion>, language: Language) -> Self {
        Self {
            completion,
            language,
        }
    }

    /// Fails only when the model can't be reached. Unusable replies
    /// become conversational interpretations.
    pub async fn interpret(&self, prompt: &str) -> Result<Interpretation, AssistantError> {
        let raw = self.completion.complete(prompt).await.map_err(|e| {
            tracing::error!("Completion failed: {:#}", e);
            AssistantError::ModelUnavailable(e.to_string())
        })?;
        tracing::debug!("Model reply: {}", raw);
        let interpretation = parse_reply(&raw, self.language);
        tracing::info!("Interpreted intent {:?}", interpretation.intent.kind());
        Ok(interpretation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::completion::OpenAiCompletion;
    use crate::ai::intent::Intent;

    #[tokio::test]
    async fn test_interpret_with_openai_backend() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "```json\n{\"intent\": \"general\", \"response\": \"¡Hola!\"}\n```"}}]}"#,
            )
            .create_async()
            .await;

        let interpreter = IntentInterpreter::new(
            Arc::new(OpenAiCompletion {
                api_hostname: server.url(),
                api_key: "test-key".to_string(),
                model: "gpt-4.1-mini".to_string(),
            }),
            Language::Es,
        );
        let interp = interpreter.interpret("Hola").await.unwrap();
        assert_eq!(interp.intent, Intent::General);
        assert_eq!(interp.response, "¡Hola!");
    }

    #[tokio::test]
    async fn test_interpret_model_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let interpreter = IntentInterpreter::new(
            Arc::new(OpenAiCompletion {
                api_hostname: server.url(),
                api_key: "test-key".to_string(),
                model: "gpt-4.1-mini".to_string(),
            }),
            Language::Es,
        );
        assert!(matches!(
            interpreter.interpret("Hola").await,
            Err(AssistantError::ModelUnavailable(_))
        ));
    }
}
