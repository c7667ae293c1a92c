use std::sync::Mutex;
use std::time::Duration;

use super::*;
use crate::frame::{FRAME_CONTENT, Status};
use crate::llm::types::TextStream;
use crate::services::interaction::{GENERATE_LOGO_ID, InteractionData, SEND_WEBHOOK_ID};

// =============================================================================
// mocks
// =============================================================================

/// Returns canned deltas and records the prompts it was given.
struct MockLlm {
    chunks: Vec<Result<String, &'static str>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockLlm {
    fn new(chunks: Vec<Result<String, &'static str>>) -> Arc<Self> {
        Arc::new(Self { chunks, prompts: Mutex::new(Vec::new()) })
    }
}

#[async_trait::async_trait]
impl LlmStream for MockLlm {
    async fn stream_text(&self, _max_tokens: u32, system: &str, prompt: &str) -> Result<TextStream, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        let items: Vec<Result<String, LlmError>> = self
            .chunks
            .iter()
            .map(|c| c.clone().map_err(|e| LlmError::Stream(e.to_string())))
            .collect();
        Ok(crate::llm::fuse_on_error(stream::iter(items)))
    }
}

struct RejectingLlm;

#[async_trait::async_trait]
impl LlmStream for RejectingLlm {
    async fn stream_text(&self, _: u32, _: &str, _: &str) -> Result<TextStream, LlmError> {
        Err(LlmError::ApiResponse { status: 401, body: "bad key".into() })
    }
}

/// Never yields; used to exercise cancellation.
struct PendingLlm;

#[async_trait::async_trait]
impl LlmStream for PendingLlm {
    async fn stream_text(&self, _: u32, _: &str, _: &str) -> Result<TextStream, LlmError> {
        Ok(stream::pending().boxed())
    }
}

struct MockImages(Result<&'static str, &'static str>);

#[async_trait::async_trait]
impl ImageGen for MockImages {
    async fn generate_png(&self, _prompt: &str) -> Result<String, LlmError> {
        self.0
            .map(str::to_string)
            .map_err(|e| LlmError::ApiRequest(e.into()))
    }
}

fn generator(llm: Option<Arc<dyn LlmStream>>, images: Option<Arc<dyn ImageGen>>) -> Generator {
    Generator::new(llm, images, WebhookClient::new(2).unwrap(), 256)
}

fn click(id: &str, value: Option<&str>) -> Interaction {
    Interaction::try_from(InteractionData {
        id: id.into(),
        kind: "button_press".into(),
        value: value.map(str::to_owned),
        element_type: "button".into(),
        element_text: id.into(),
        app_context: Some("notepad_app".into()),
    })
    .unwrap()
}

async fn collect(stream: HtmlStream) -> Vec<String> {
    stream.collect().await
}

// =============================================================================
// paths
// =============================================================================

#[tokio::test]
async fn empty_history_yields_notice() {
    let out = collect(generator(None, None).stream(&[], 3)).await;
    assert_eq!(out.len(), 1);
    assert!(out[0].contains("No interaction data provided."));
    assert!(out[0].contains("orange"));
}

#[tokio::test]
async fn missing_llm_yields_config_error() {
    let out = collect(generator(None, None).stream(&[click("save", None)], 3)).await;
    assert_eq!(out.len(), 1);
    assert!(out[0].contains("Configuration Error"));
}

#[tokio::test]
async fn llm_chunks_pass_through_in_order() {
    let llm = MockLlm::new(vec![Ok("<div>".into()), Ok("hello".into()), Ok("</div>".into())]);
    let content = generator(Some(llm.clone()), None);

    let history = [click("b", None), click("a", None)];
    let out = collect(content.stream(&history, 3)).await;
    assert_eq!(out, ["<div>", "hello", "</div>"]);

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].0.contains("up to 2 earlier interactions"));
    assert!(prompts[0].1.contains("Clicked on 'b'"));
    assert!(prompts[0].1.contains("1. (App: Notepad) Clicked 'a'"));
}

#[tokio::test]
async fn mid_stream_error_ends_with_error_fragment() {
    let llm = MockLlm::new(vec![Ok("partial".into()), Err("connection reset"), Ok("lost".into())]);
    let out = collect(generator(Some(llm), None).stream(&[click("x", None)], 1)).await;
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], "partial");
    assert!(out[1].contains("An error occurred while generating content. Details: stream error: connection reset"));
}

#[tokio::test]
async fn rejected_request_is_single_error_fragment() {
    let out = collect(generator(Some(Arc::new(RejectingLlm)), None).stream(&[click("x", None)], 1)).await;
    assert_eq!(out.len(), 1);
    assert!(out[0].contains("Error Generating Content"));
    assert!(out[0].contains("status 401"));
}

#[tokio::test]
async fn logo_shows_spinner_then_image() {
    let llm = MockLlm::new(vec![]);
    let content = generator(Some(llm.clone()), Some(Arc::new(MockImages(Ok("QUJD")))));
    let value = r#"{"logo_name_input":"Acme <Co>","logo_description_input":"rockets"}"#;

    let out = collect(content.stream(&[click(GENERATE_LOGO_ID, Some(value))], 3)).await;
    assert_eq!(out.len(), 2);
    assert!(out[0].contains("animate-spin"));
    assert!(out[1].contains(r#"src="data:image/png;base64,QUJD""#));
    assert!(out[1].contains("Generated logo for Acme &lt;Co&gt;"));
    assert!(llm.prompts.lock().unwrap().is_empty(), "logo must bypass the llm");
}

#[tokio::test]
async fn logo_failure_is_error_fragment() {
    let content = generator(None, Some(Arc::new(MockImages(Err("quota")))));
    let out = collect(content.stream(&[click(GENERATE_LOGO_ID, Some("{}"))], 3)).await;
    assert!(out[1].contains("Error Generating Logo"));
}

#[tokio::test]
async fn logo_without_image_client_is_config_error() {
    let out = collect(generator(None, None).stream(&[click(GENERATE_LOGO_ID, Some("{}"))], 3)).await;
    assert!(out[1].contains("Configuration Error"));
}

#[tokio::test]
async fn webhook_failure_is_rtl_error_fragment() {
    let value = r#"{"webhook_url_input":"http://127.0.0.1:9/hook","webhook_payload_input":"{}"}"#;
    let out = collect(generator(None, None).stream(&[click(SEND_WEBHOOK_ID, Some(value))], 3)).await;
    assert_eq!(out.len(), 2);
    assert!(out[0].contains("animate-spin"));
    assert!(out[1].contains(r#"dir="rtl""#));
}

#[test]
fn escape_html_covers_markup() {
    assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
}

// =============================================================================
// driver
// =============================================================================

async fn recv(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    tokio::time::timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("frame within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn driver_sends_items_then_done() {
    let (tx, mut rx) = mpsc::channel(16);
    let request = Frame::request("generate:stream", Data::new());
    let chunks = stream::iter(vec!["a".to_string(), "b".to_string()]).boxed();

    let outcome = run_generation(chunks, request.clone(), tx, CancellationToken::new()).await;
    assert_eq!(outcome, GenerationOutcome::Completed);

    let first = recv(&mut rx).await;
    assert_eq!(first.status, Status::Item);
    assert_eq!(first.parent_id, Some(request.id));
    assert_eq!(first.str_field(FRAME_CONTENT), Some("a"));
    assert_eq!(recv(&mut rx).await.str_field(FRAME_CONTENT), Some("b"));
    assert_eq!(recv(&mut rx).await.status, Status::Done);
}

#[tokio::test]
async fn driver_stops_on_cancel() {
    let (tx, mut rx) = mpsc::channel(16);
    let token = CancellationToken::new();
    let request = Frame::request("generate:stream", Data::new());
    let chunks = generator(Some(Arc::new(PendingLlm)), None).stream(&[click("x", None)], 1);

    let task = tokio::spawn(run_generation(chunks, request, tx, token.clone()));
    token.cancel();

    assert_eq!(task.await.unwrap(), GenerationOutcome::Cancelled);
    assert_eq!(recv(&mut rx).await.status, Status::Cancel);
}

#[tokio::test]
async fn driver_reports_closed_channel() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let chunks = stream::iter(vec!["a".to_string()]).boxed();
    let outcome = run_generation(chunks, Frame::request("generate:stream", Data::new()), tx, CancellationToken::new()).await;
    assert_eq!(outcome, GenerationOutcome::Disconnected);
}
