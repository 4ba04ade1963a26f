pub mod colors;
pub mod gcal;
pub mod gtasks;
pub mod oauth;

pub use gcal::GoogleCalendar;
pub use gtasks::GoogleTasks;
pub use oauth::RefreshingToken;

use http::StatusCode;
use reqwest::RequestBuilder;
use serde_json::Value;

use crate::assistant::provider::ProviderError;

/// Send a request and return the body of a successful response.
async fn send(req: RequestBuilder) -> Result<String, ProviderError> {
    let res = req.send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        tracing::warn!("Google API request failed: {} ({})", status, text);
        return Err(classify_failure(status.as_u16(), &text));
    }
    Ok(text)
}

/// Rejected credentials show up as a 401 or as an error body naming
/// them, depending on the endpoint. Only the message field of a JSON
/// error body is kept, anything else is reduced to the status reason.
fn classify_failure(status: u16, body: &str) -> ProviderError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["error_description"].as_str())
                .or_else(|| v["error"].as_str())
        })
        .map(String::from)
        .unwrap_or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string()
        });

    if status == 401 || body.contains("invalid_grant") || body.contains("Invalid Credentials") {
        ProviderError::Unauthorized(message)
    } else {
        ProviderError::Api { status, message }
    }
}
