//! Webhook delivery for the `send_webhook` interaction.

use std::time::Duration;

use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Request failed with status: {status} {reason}")]
    Status { status: u16, reason: String },
}

impl crate::frame::ErrorCode for WebhookError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_WEBHOOK_REQUEST",
            Self::Status { .. } => "E_WEBHOOK_STATUS",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    /// # Errors
    ///
    /// Returns [`WebhookError::ClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WebhookError::ClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    /// POST `payload` (already validated JSON text) to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Request`] on transport failure and
    /// [`WebhookError::Status`] for any non-2xx response.
    pub async fn post_json(&self, url: &str, payload: String) -> Result<u16, WebhookError> {
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| WebhookError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "webhook: non-success response");
            return Err(WebhookError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        info!(%url, status = status.as_u16(), "webhook: delivered");
        Ok(status.as_u16())
    }
}
