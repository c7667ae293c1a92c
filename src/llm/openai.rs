//! OpenAI-compatible clients: streaming chat completions and image
//! generation.
//!
//! Both talk to `<base_url>/...` with bearer auth so any compatible gateway
//! works. Chat completions stream as SSE `data:` lines terminated by
//! `[DONE]`; images come back as base64 in a single JSON body.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::types::{ImageGen, LlmError, LlmStream, TextStream};

const DONE_SENTINEL: &str = "[DONE]";
const IMAGE_SIZE: &str = "1024x1024";

// =============================================================================
// CHAT COMPLETIONS
// =============================================================================

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: String, base_url: String, model: String) -> Self {
        Self { http, api_key, base_url, model }
    }
}

#[async_trait::async_trait]
impl LlmStream for OpenAiClient {
    async fn stream_text(&self, max_tokens: u32, system: &str, prompt: &str) -> Result<TextStream, LlmError> {
        let body = CcRequest {
            model: &self.model,
            max_tokens,
            stream: true,
            messages: [CcMessage { role: "system", content: system }, CcMessage { role: "user", content: prompt }],
        };
        let response = post_json(&self.http, &self.api_key, &format!("{}/chat/completions", self.base_url), &body)
            .await?;

        let deltas = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let done = matches!(event, Ok(e) if e.data.trim() == DONE_SENTINEL);
                futures::future::ready(!done)
            })
            .filter_map(|event| async move {
                match event {
                    Ok(event) => parse_chunk(&event.data).transpose(),
                    Err(e) => Some(Err(LlmError::Stream(e.to_string()))),
                }
            });
        Ok(super::fuse_on_error(deltas))
    }
}

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    messages: [CcMessage<'a>; 2],
}

#[derive(Serialize)]
struct CcMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CcChunk {
    #[serde(default)]
    choices: Vec<CcChoice>,
    #[serde(default)]
    error: Option<CcError>,
}

#[derive(Deserialize)]
struct CcChoice {
    #[serde(default)]
    delta: CcDelta,
}

#[derive(Deserialize, Default)]
struct CcDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct CcError {
    message: String,
}

/// Decode one chunk. Role-only and empty deltas yield `Ok(None)`.
fn parse_chunk(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: CcChunk = serde_json::from_str(data).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(LlmError::Stream(error.message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty()))
}

// =============================================================================
// IMAGES
// =============================================================================

pub struct OpenAiImageClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiImageClient {
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: String, base_url: String, model: String) -> Self {
        Self { http, api_key, base_url, model }
    }
}

#[async_trait::async_trait]
impl ImageGen for OpenAiImageClient {
    async fn generate_png(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ImageRequest { model: &self.model, prompt, n: 1, size: IMAGE_SIZE, response_format: "b64_json" };
        let response =
            post_json(&self.http, &self.api_key, &format!("{}/images/generations", self.base_url), &body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        parse_image_response(&text)
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

fn parse_image_response(json: &str) -> Result<String, LlmError> {
    let parsed: ImageResponse = serde_json::from_str(json).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    parsed
        .data
        .into_iter()
        .find_map(|d| d.b64_json)
        .filter(|b64| !b64.is_empty())
        .ok_or_else(|| LlmError::ApiParse("response contained no image data".into()))
}

// =============================================================================
// SHARED
// =============================================================================

async fn post_json(
    http: &reqwest::Client,
    api_key: &str,
    url: &str,
    body: &impl Serialize,
) -> Result<reqwest::Response, LlmError> {
    let response = http
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

    let status = response.status().as_u16();
    if status != 200 {
        let text = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiResponse { status, body: text });
    }
    Ok(response)
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
