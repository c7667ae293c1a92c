//! LLM types — provider-neutral streaming trait and errors.
//!
//! Generation only ever needs "system prompt + user prompt in, text deltas
//! out", so the shared surface is a single streaming call. Providers hide
//! their SSE dialects behind `LlmStream`; tests swap in canned streams.

use futures::stream::BoxStream;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM and image client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// A response body or stream event could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The provider reported an error inside an open stream.
    #[error("stream error: {0}")]
    Stream(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::frame::ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::Stream(_) => "E_API_STREAM",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::ApiRequest(_) | Self::Stream(_) | Self::ApiResponse { status: 429 | 500..=599, .. }
        )
    }
}

// =============================================================================
// STREAMING TRAIT
// =============================================================================

/// Lazy sequence of text deltas. Ends after the first `Err`.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// Provider-neutral streaming text generation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LlmStream: Send + Sync {
    /// Open a streaming completion.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request cannot be sent or the provider
    /// rejects it before streaming starts. Failures mid-stream arrive as an
    /// `Err` item on the returned stream.
    async fn stream_text(&self, max_tokens: u32, system: &str, prompt: &str) -> Result<TextStream, LlmError>;
}

/// Image generation. Returns base64-encoded PNG bytes.
#[async_trait::async_trait]
pub trait ImageGen: Send + Sync {
    /// Generate one image for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response carries
    /// no image data.
    async fn generate_png(&self, prompt: &str) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ErrorCode;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(LlmError::Stream("x".into()).error_code(), "E_API_STREAM");
        assert_eq!(LlmError::MissingApiKey { var: "K".into() }.error_code(), "E_MISSING_API_KEY");
    }

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        assert!(LlmError::ApiResponse { status: 429, body: String::new() }.retryable());
        assert!(LlmError::ApiResponse { status: 503, body: String::new() }.retryable());
        assert!(!LlmError::ApiResponse { status: 400, body: String::new() }.retryable());
        assert!(!LlmError::ConfigParse("bad".into()).retryable());
    }
}
