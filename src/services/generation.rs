//! Generation — turns an interaction history into streamed window HTML.
//!
//! ARCHITECTURE
//! ============
//! `Generator::stream` picks a path from the newest interaction and returns
//! a lazy, one-shot `BoxStream` of HTML chunks:
//!
//! - no history      → one orange notice
//! - `generate_logo` → spinner, then `<img>` with a data URL (or an error)
//! - `send_webhook`  → spinner, then a success or failure notice
//! - anything else   → system prompt + built prompt → LLM text deltas
//!
//! Every failure becomes a final red fragment inside the stream; the stream
//! itself never errors. `run_generation` drives one stream onto a
//! connection's outbound channel until it ends or its token is cancelled.
//!
//! TRADE-OFFS
//! ==========
//! A missing provider key is not a startup failure. The server runs without
//! generation and each request renders a configuration notice instead.

use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::interaction::{Interaction, InteractionKind};
use super::prompt::{build_prompt, system_prompt};
use super::webhook::WebhookClient;
use crate::frame::{Data, Frame};
use crate::llm::types::{ImageGen, LlmError, LlmStream};

/// HTML chunks for one window update.
pub type HtmlStream = BoxStream<'static, String>;

/// How a generation task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    Cancelled,
    /// The connection's outbound channel closed first.
    Disconnected,
}

// =============================================================================
// GENERATOR
// =============================================================================

#[derive(Clone)]
pub struct Generator {
    llm: Option<Arc<dyn LlmStream>>,
    images: Option<Arc<dyn ImageGen>>,
    webhook: WebhookClient,
    max_tokens: u32,
}

impl Generator {
    #[must_use]
    pub fn new(
        llm: Option<Arc<dyn LlmStream>>,
        images: Option<Arc<dyn ImageGen>>,
        webhook: WebhookClient,
        max_tokens: u32,
    ) -> Self {
        Self { llm, images, webhook, max_tokens }
    }

    /// Stream window content for `history` (newest first).
    #[must_use]
    pub fn stream(&self, history: &[Interaction], effective_len: usize) -> HtmlStream {
        let Some(current) = history.first() else {
            return stream::once(async { no_interaction_fragment() }).boxed();
        };

        match &current.kind {
            InteractionKind::GenerateLogo { name, description } => self.logo_stream(name.clone(), description.clone()),
            InteractionKind::SendWebhook { url, payload } => self.webhook_stream(url.clone(), payload.clone()),
            _ => self.llm_stream(history, effective_len),
        }
    }

    fn llm_stream(&self, history: &[Interaction], effective_len: usize) -> HtmlStream {
        let Some(llm) = self.llm.clone() else {
            return stream::once(async { config_error_fragment("The LLM API key") }).boxed();
        };
        let system = system_prompt(effective_len);
        let prompt = build_prompt(history, effective_len);
        let max_tokens = self.max_tokens;

        stream::once(async move { llm.stream_text(max_tokens, &system, &prompt).await })
            .flat_map(|opened| match opened {
                Ok(deltas) => deltas.left_stream(),
                Err(e) => stream::once(async move { Err::<String, LlmError>(e) }).right_stream(),
            })
            .map(|delta| match delta {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "generation: llm stream failed");
                    stream_error_fragment(&e.to_string())
                }
            })
            .boxed()
    }

    fn logo_stream(&self, name: String, description: String) -> HtmlStream {
        let images = self.images.clone();
        let result = async move {
            let Some(images) = images else {
                return config_error_fragment("The image API key");
            };
            match images.generate_png(&logo_prompt(&name, &description)).await {
                Ok(b64) => {
                    info!(logo = %name, "generation: logo rendered");
                    logo_fragment(&name, &b64)
                }
                Err(e) => {
                    warn!(error = %e, "generation: logo failed");
                    logo_error_fragment()
                }
            }
        };
        stream::once(async { spinner_fragment("...جاري تصميم شعارك") })
            .chain(result.into_stream())
            .boxed()
    }

    fn webhook_stream(&self, url: String, payload: String) -> HtmlStream {
        let webhook = self.webhook.clone();
        let result = async move {
            match webhook.post_json(&url, payload).await {
                Ok(_) => webhook_success_fragment(),
                Err(e) => webhook_error_fragment(&e.to_string()),
            }
        };
        stream::once(async { spinner_fragment("...جاري إرسال البيانات") })
            .chain(result.into_stream())
            .boxed()
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Forward `chunks` to `tx` as item frames replying to `request`, then a
/// terminal done frame. Cancellation sends a cancel frame instead.
pub async fn run_generation(
    mut chunks: HtmlStream,
    request: Frame,
    tx: mpsc::Sender<Frame>,
    token: CancellationToken,
) -> GenerationOutcome {
    loop {
        tokio::select! {
            biased;

            () = token.cancelled() => {
                let _ = tx.send(request.cancelled()).await;
                return GenerationOutcome::Cancelled;
            }
            chunk = chunks.next() => {
                let frame = match chunk {
                    Some(html) => request.item(Data::new()).with_content(html),
                    None => {
                        return if tx.send(request.done()).await.is_ok() {
                            GenerationOutcome::Completed
                        } else {
                            GenerationOutcome::Disconnected
                        };
                    }
                };
                if tx.send(frame).await.is_err() {
                    return GenerationOutcome::Disconnected;
                }
            }
        }
    }
}

// =============================================================================
// FRAGMENTS
// =============================================================================

fn logo_prompt(name: &str, description: &str) -> String {
    format!(
        "A professional logo for \"{name}\". {description}. The logo should be on a clean background, \
vector style, modern, and high quality."
    )
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn no_interaction_fragment() -> String {
    r#"<div class="p-4 text-orange-700 bg-orange-100 rounded-lg"><p class="font-bold text-lg">No interaction data provided.</p></div>"#
        .to_string()
}

fn config_error_fragment(what: &str) -> String {
    format!(
        r#"<div class="p-4 text-red-700 bg-red-100 rounded-lg"><p class="font-bold text-lg">Configuration Error</p><p class="mt-2">{what} is not configured. Set the corresponding environment variable and restart the server.</p></div>"#
    )
}

fn stream_error_fragment(details: &str) -> String {
    format!(
        r#"<div class="p-4 text-red-700 bg-red-100 rounded-lg"><p class="font-bold text-lg">Error Generating Content</p><p class="mt-2">An error occurred while generating content. Details: {}</p><p class="mt-1">This may be due to an API key issue, network problem, or misconfiguration.</p></div>"#,
        escape_html(details)
    )
}

fn spinner_fragment(label: &str) -> String {
    format!(
        r#"<div class="llm-container p-4 items-center"><div class="animate-spin rounded-full h-12 w-12 border-t-4 border-b-4 border-[#D4AF37]"></div><p class="llm-text mt-4">{label}</p></div>"#
    )
}

fn logo_fragment(name: &str, b64_png: &str) -> String {
    format!(
        r#"<div class="p-6 flex flex-col justify-center items-center gap-4"><img src="data:image/png;base64,{b64_png}" alt="Generated logo for {}" class="max-w-xs h-auto rounded-lg shadow-lg border-4 border-gray-500"><p class="llm-text">هذا هو شعارك!</p></div>"#,
        escape_html(name)
    )
}

fn logo_error_fragment() -> String {
    r#"<div class="p-4 text-red-700 bg-red-100 rounded-lg"><p class="font-bold text-lg">Error Generating Logo</p><p>Could not generate the logo. Please try again.</p></div>"#
        .to_string()
}

fn webhook_success_fragment() -> String {
    r#"<div class="llm-container p-4 items-center"><h2 class="llm-title">✅ تم الإرسال بنجاح</h2><p class="llm-text">تم إرسال بياناتك بنجاح.</p></div>"#
        .to_string()
}

fn webhook_error_fragment(message: &str) -> String {
    format!(
        r#"<div dir="rtl" class="p-4 text-red-700 bg-red-100 rounded-lg"><p class="font-bold text-lg">❌ خطأ في الإرسال</p><p>{}</p></div>"#,
        escape_html(message)
    )
}

#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;
