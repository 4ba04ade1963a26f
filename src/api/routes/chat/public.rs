//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::assistant::models::ConverseRequest;

pub use crate::assistant::models::ConverseResponse as ChatResponse;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(flatten)]
    pub converse: ConverseRequest,
    /// Stored account to act on when no bearer token is sent
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub error: String,
    pub kind: String,
}
