//! Anthropic Messages API client, streaming mode.
//!
//! Thin HTTP wrapper for `/v1/messages` with `stream: true`. The SSE body is
//! split into events by `eventsource-stream`; each event is decoded by the
//! pure `parse_stream_event` so the dialect is testable without a socket.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::Deserialize;

use super::types::{LlmError, LlmStream, TextStream};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

// =============================================================================
// CLIENT
// =============================================================================

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self { http, api_key, model }
    }
}

#[async_trait::async_trait]
impl LlmStream for AnthropicClient {
    async fn stream_text(&self, max_tokens: u32, system: &str, prompt: &str) -> Result<TextStream, LlmError> {
        let body = ApiRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: [ApiMessage { role: "user", content: prompt }],
            stream: true,
        };

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiResponse { status, body: text });
        }

        let deltas = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => parse_stream_event(&event.event, &event.data).transpose(),
                    Err(e) => Some(Err(LlmError::Stream(e.to_string()))),
                }
            });
        Ok(super::fuse_on_error(deltas))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [ApiMessage<'a>; 1],
    stream: bool,
}

#[derive(serde::Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct DeltaEvent {
    delta: Delta,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Delta {
    #[serde(rename = "text_delta")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorEvent {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

/// Decode one SSE event. `Ok(None)` for events that carry no text
/// (`message_start`, `ping`, tool deltas, ...).
fn parse_stream_event(event: &str, data: &str) -> Result<Option<String>, LlmError> {
    match event {
        "content_block_delta" => {
            let parsed: DeltaEvent = serde_json::from_str(data).map_err(|e| LlmError::ApiParse(e.to_string()))?;
            match parsed.delta {
                Delta::Text { text } => Ok(Some(text)),
                Delta::Other => Ok(None),
            }
        }
        "error" => {
            let message = serde_json::from_str::<ErrorEvent>(data)
                .map_or_else(|_| data.to_string(), |e| e.error.message);
            Err(LlmError::Stream(message))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
