//! LLM — multi-provider streaming adapter for window content generation.
//!
//! DESIGN
//! ======
//! Configuration comes from environment variables (see `config`). The
//! `LlmClient` enum dispatches to Anthropic or OpenAI based on
//! `LLM_PROVIDER`; both implement `LlmStream`, which is all generation
//! depends on. Image generation is a separate `ImageGen` client because it
//! is keyed and billed independently.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod types;

use std::time::Duration;

use futures::{Stream, StreamExt};

use config::{ImageConfig, LlmConfig, LlmProviderKind, LlmTimeouts};
use types::{LlmError, LlmStream, TextStream};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

pub enum LlmClient {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// Build an LLM client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing, the provider is unknown,
    /// or the HTTP client fails to build.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::from_env()?)
    }

    /// Build an LLM client from typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let http = build_http(config.timeouts)?;
        Ok(match config.provider {
            LlmProviderKind::Anthropic => {
                Self::Anthropic(anthropic::AnthropicClient::new(http, config.api_key, config.model))
            }
            LlmProviderKind::OpenAi => Self::OpenAi(openai::OpenAiClient::new(
                http,
                config.api_key,
                config.openai_base_url,
                config.model,
            )),
        })
    }
}

#[async_trait::async_trait]
impl LlmStream for LlmClient {
    async fn stream_text(&self, max_tokens: u32, system: &str, prompt: &str) -> Result<TextStream, LlmError> {
        match self {
            Self::Anthropic(c) => c.stream_text(max_tokens, system, prompt).await,
            Self::OpenAi(c) => c.stream_text(max_tokens, system, prompt).await,
        }
    }
}

/// Build the image client from environment variables.
///
/// # Errors
///
/// Returns an error if the image key is missing or the HTTP client fails.
pub fn image_client_from_env() -> Result<openai::OpenAiImageClient, LlmError> {
    let config = ImageConfig::from_env()?;
    let http = build_http(config.timeouts)?;
    Ok(openai::OpenAiImageClient::new(http, config.api_key, config.base_url, config.model))
}

// =============================================================================
// HELPERS
// =============================================================================

fn build_http(timeouts: LlmTimeouts) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| LlmError::HttpClientBuild(e.to_string()))
}

/// Box a delta stream so it ends right after the first error.
pub(crate) fn fuse_on_error<S>(stream: S) -> TextStream
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    stream
        .scan(false, |failed, item| {
            if *failed {
                return futures::future::ready(None);
            }
            *failed = item.is_err();
            futures::future::ready(Some(item))
        })
        .boxed()
}
