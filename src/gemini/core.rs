use std::time::Duration;

use anyhow::{Error, Result};
use serde_json::{Value, json};

use crate::openai::SamplingOptions;

/// Single-turn `generateContent` call against the Gemini REST API.
pub async fn generate_content(
    prompt: &str,
    api_hostname: &str,
    api_key: &str,
    model: &str,
    options: SamplingOptions,
) -> Result<Value, Error> {
    let payload = json!({
        "contents": [
            {"role": "user", "parts": [{"text": prompt}]}
        ],
        "generationConfig": {
            "temperature": options.temperature,
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": options.max_tokens,
        }
    });
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        api_hostname.trim_end_matches("/"),
        model
    );
    let response = reqwest::Client::new()
        .post(url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 2))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response)
}

/// Concatenate the text parts of the first candidate.
pub fn candidate_text(resp: &Value) -> Option<String> {
    let parts = resp["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"intent\":"},{"text":"\"general\"}"}]}}]}"#,
            )
            .create();

        let resp = generate_content(
            "Hola",
            server.url().as_str(),
            "test-key",
            "gemini-2.5-flash",
            SamplingOptions::default(),
        )
        .await
        .unwrap();

        mock.assert();
        assert_eq!(
            candidate_text(&resp),
            Some(r#"{"intent":"general"}"#.to_string())
        );
    }

    #[test]
    fn test_candidate_text_missing() {
        assert_eq!(candidate_text(&json!({"candidates": []})), None);
        assert_eq!(candidate_text(&json!({"promptFeedback": {"blockReason": "SAFETY"}})), None);
    }
}
