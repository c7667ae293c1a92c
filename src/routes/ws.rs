//! WebSocket handler — one desktop tab per connection.
//!
//! DESIGN
//! ======
//! On upgrade, assigns a client id and a display user id, then enters a
//! `select!` loop over three sources:
//! - incoming client frames → parse + dispatch by syscall prefix
//! - frames from this tab's generation task → forward to client
//! - session bus events → cross-tab notifier → `session:sync`
//!
//! Handler functions validate, mutate the tab, and return an `Outcome`. The
//! dispatch layer sends the done reply followed by the outcome's follow-up
//! frames (toasts, generation announcements). A rejected request produces an
//! optional error toast followed by the structured error frame.
//!
//! GENERATION
//! ==========
//! At most one generation runs per tab. Starting one cancels the previous
//! token. The server announces it with a `generate:stream` request whose
//! `parent_id` is the triggering request; item frames carry HTML chunks and
//! a done or cancel frame ends it. A client cancels with a cancel frame whose
//! `parent_id` is the `generate:stream` id.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id` and `user_id`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Close → cancel any running generation

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, ErrorCode, Frame, Status};
use crate::services::bus::StorageEvent;
use crate::services::desktop::{self, AppDefinition, CommandRoute, JoinedSession, TabContext, Toast};
use crate::services::generation;
use crate::services::interaction::{Interaction, InteractionData};
use crate::services::notifier::SyncUpdate;
use crate::services::session::{self, ActivityNotification, ChatMessage, SessionData, SessionError};
use crate::services::voice::{RecognitionLocale, StartOutcome};
use crate::state::AppState;

/// Per-connection buffer for generation frames.
const OUTBOUND_CAPACITY: usize = 256;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. Handlers never send frames
/// directly; dispatch sends `done(reply)` first, then `follow_ups` in order.
#[derive(Default)]
struct Outcome {
    reply: Data,
    follow_ups: Vec<Frame>,
}

impl Outcome {
    fn done() -> Self {
        Self::default()
    }

    fn reply(reply: Data) -> Self {
        Self { reply, follow_ups: Vec::new() }
    }

    fn toast(mut self, toast: &Toast) -> Self {
        self.follow_ups.push(toast_frame(toast));
        self
    }

    fn then(mut self, frame: Frame) -> Self {
        self.follow_ups.push(frame);
        self
    }

    fn then_some(mut self, frame: Option<Frame>) -> Self {
        self.follow_ups.extend(frame);
        self
    }
}

/// Handler failure: the error frame, preceded by a toast when the user
/// should see it.
struct Rejection {
    error: Frame,
    toast: Option<Toast>,
}

impl Rejection {
    /// Structured error frame plus a toast with the error's own text.
    fn from_err(req: &Frame, err: &impl ErrorCode) -> Self {
        Self { error: req.error_from(err), toast: Some(Toast::error(err.to_string())) }
    }

    /// Plain error frame plus a toast with the same text.
    fn message(req: &Frame, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { error: req.error(message.clone()), toast: Some(Toast::error(message)) }
    }

    /// Error frame only.
    fn quiet(error: Frame) -> Self {
        Self { error, toast: None }
    }

    fn with_toast(mut self, message: impl Into<String>) -> Self {
        self.toast = Some(Toast::error(message));
        self
    }
}

type HandlerResult = Result<Outcome, Rejection>;

// =============================================================================
// CONNECTION
// =============================================================================

struct ActiveGeneration {
    /// Id of the `generate:stream` frame.
    id: Uuid,
    token: CancellationToken,
}

/// Everything one socket task owns.
struct Connection {
    tab: TabContext,
    generation: Option<ActiveGeneration>,
    outbound: mpsc::Sender<Frame>,
}

impl Connection {
    fn new(state: &AppState, client_id: Uuid, user_id: String, outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            tab: TabContext::new(client_id, user_id, state.config.max_history_length),
            generation: None,
            outbound,
        }
    }

    /// Cancel the running generation, if any. Returns its stream id.
    fn cancel_generation(&mut self) -> Option<Uuid> {
        let active = self.generation.take()?;
        active.token.cancel();
        Some(active.id)
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let user_id = session::generate_user_id();

    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(OUTBOUND_CAPACITY);
    let mut bus_rx = state.sessions.bus().subscribe();
    let mut conn = Connection::new(&state, client_id, user_id.clone(), client_tx);

    let welcome = Frame::request("session:connected", Data::new())
        .with_data("client_id", client_id.to_string())
        .with_data("user_id", user_id.clone())
        .with_data("max_history_length", conn.tab.history.max_len());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, %user_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for frame in process_inbound_text(&state, &mut conn, &text).await {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
            event = bus_rx.recv() => match event {
                Ok(event) => {
                    if let Some(frame) = sync_frame(&mut conn.tab, &event) {
                        if send_frame(&mut socket, &frame).await.is_err() {
                            break;
                        }
                    }
                }
                // The next event carries the whole record, so the length
                // diff in the notifier catches up.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%client_id, skipped, "ws: session bus lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    if let Some(stream_id) = conn.cancel_generation() {
        info!(%client_id, %stream_id, "ws: generation cancelled on disconnect");
    }
    info!(%client_id, "ws: client disconnected");
}

/// Fold a bus event into the tab's notifier. Returns the `session:sync`
/// frame when the event changed something this tab shows.
fn sync_frame(tab: &mut TabContext, event: &StorageEvent) -> Option<Frame> {
    let joined = tab.session_mut()?;
    let update = joined.notifier.apply(event)?;
    Some(Frame::request("session:sync", sync_data(&update)).with_session(joined.code.clone()))
}

/// Fold this tab's own committed write into its notifier. Returns a
/// `session:sync` when the record also held entries from other tabs.
fn local_sync_frame(tab: &mut TabContext, committed: &SessionData) -> Option<Frame> {
    let joined = tab.session_mut()?;
    let update = joined.notifier.record_local(committed)?;
    Some(Frame::request("session:sync", sync_data(&update)).with_session(joined.code.clone()))
}

fn sync_data(update: &SyncUpdate) -> Data {
    let mut data = Data::new();
    if let Some(messages) = &update.messages {
        data.insert("messages".into(), json!(messages));
    }
    if let Some(activity) = &update.activity {
        data.insert("activity".into(), json!(activity));
    }
    data.insert("has_unread".into(), json!(update.has_unread));
    data
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// Generation output is not returned here; it arrives later through the
/// connection's outbound channel.
async fn process_inbound_text(state: &AppState, conn: &mut Connection, text: &str) -> Vec<Frame> {
    let client_id = conn.tab.client_id;
    let mut req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    req.from = Some(conn.tab.user_id.clone());
    info!(%client_id, id = %req.id, syscall = %req.syscall, status = ?req.status, "ws: recv frame");

    if req.status == Status::Cancel {
        handle_cancel(conn, &req);
        return Vec::new();
    }

    let result = match req.prefix() {
        "session" => handle_session(state, conn, &req).await,
        "chat" => handle_chat(state, conn, &req).await,
        "notify" => handle_notify(conn, &req),
        "app" => handle_app(state, conn, &req).await,
        "command" => handle_command(state, conn, &req).await,
        "interaction" => handle_interaction(state, conn, &req),
        "history" => handle_history(conn, &req),
        "voice" => handle_voice(state, conn, &req).await,
        prefix => Err(Rejection::quiet(req.error(format!("unknown prefix: {prefix}")))),
    };

    match result {
        Ok(outcome) => {
            let mut done = req.done_with(outcome.reply);
            done.session = conn.tab.session_code().map(str::to_owned);
            let mut frames = Vec::with_capacity(1 + outcome.follow_ups.len());
            frames.push(done);
            frames.extend(outcome.follow_ups);
            frames
        }
        Err(rejection) => {
            let mut frames = Vec::with_capacity(2);
            if let Some(toast) = &rejection.toast {
                frames.push(toast_frame(toast));
            }
            frames.push(rejection.error);
            frames
        }
    }
}

fn handle_cancel(conn: &mut Connection, req: &Frame) {
    let client_id = conn.tab.client_id;
    let targets_active = conn
        .generation
        .as_ref()
        .is_some_and(|active| Some(active.id) == req.parent_id);
    if targets_active {
        if let Some(stream_id) = conn.cancel_generation() {
            info!(%client_id, %stream_id, "ws: generation cancelled by client");
        }
    } else {
        info!(%client_id, target = ?req.parent_id, "ws: cancel for inactive stream ignored");
    }
}

fn unknown_op(req: &Frame) -> Rejection {
    Rejection::quiet(req.error(format!("unknown {} op: {}", req.prefix(), req.op())))
}

fn require_session<'a>(tab: &'a TabContext, req: &Frame) -> Result<&'a JoinedSession, Rejection> {
    tab.session()
        .ok_or_else(|| Rejection::message(req, "Join or create a session first."))
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

async fn handle_session(state: &AppState, conn: &mut Connection, req: &Frame) -> HandlerResult {
    let client_id = conn.tab.client_id;
    match req.op() {
        "create" => {
            let code = state
                .sessions
                .create(Some(client_id))
                .await
                .map_err(|e| Rejection::from_err(req, &e))?;
            let key = state.sessions.key_for(&code);
            let reply = session_snapshot(conn.tab.join(code.clone(), key, SessionData::default()));
            info!(%client_id, %code, "ws: session created");
            Ok(Outcome::reply(reply).toast(&Toast::success(format!("Session created: {code}. Share this code!"))))
        }
        "join" => {
            // Validation runs before any store access.
            let code = session::validate_code(req.str_field("code").unwrap_or_default())
                .map_err(|e| Rejection::from_err(req, &e))?;
            let found = state
                .sessions
                .exists(&code)
                .await
                .map_err(|e| Rejection::from_err(req, &e))?;
            if !found {
                let err = SessionError::NotFound(code);
                return Err(Rejection::from_err(req, &err).with_toast("Session code not found."));
            }
            let data = state
                .sessions
                .read(&code)
                .await
                .map_err(|e| Rejection::from_err(req, &e))?;
            let key = state.sessions.key_for(&code);
            let reply = session_snapshot(conn.tab.join(code.clone(), key, data));
            info!(%client_id, %code, "ws: session joined");
            Ok(Outcome::reply(reply).toast(&Toast::success(format!("Joined session: {code}"))))
        }
        "read" => Ok(Outcome::reply(session_snapshot(require_session(&conn.tab, req)?))),
        "leave" => {
            let left = conn.tab.leave();
            if let Some(code) = &left {
                info!(%client_id, %code, "ws: session left");
            }
            let mut data = Data::new();
            data.insert("code".into(), json!(left));
            Ok(Outcome::reply(data))
        }
        _ => Err(unknown_op(req)),
    }
}

fn session_snapshot(joined: &JoinedSession) -> Data {
    let notifier = &joined.notifier;
    let mut data = Data::new();
    data.insert("code".into(), json!(joined.code));
    data.insert("display".into(), json!(session::display_code(&joined.code)));
    data.insert("messages".into(), json!(notifier.messages()));
    data.insert("activity".into(), json!(notifier.activity()));
    data.insert("has_unread".into(), json!(notifier.has_unread()));
    data.insert("panel_open".into(), json!(notifier.panel_open()));
    data
}

async fn handle_chat(state: &AppState, conn: &mut Connection, req: &Frame) -> HandlerResult {
    match req.op() {
        "send" => {
            let text = req.str_field("text").map(str::trim).unwrap_or_default();
            if text.is_empty() {
                return Err(Rejection::quiet(req.error("text required")));
            }
            let code = require_session(&conn.tab, req)?.code.clone();
            let message = ChatMessage::new(text, conn.tab.user_id.as_str());
            match state
                .sessions
                .append_message(&code, message.clone(), Some(conn.tab.client_id))
                .await
            {
                Ok(committed) => {
                    let sync = local_sync_frame(&mut conn.tab, &committed);
                    let mut data = Data::new();
                    data.insert("message".into(), json!(message));
                    Ok(Outcome::reply(data).then_some(sync))
                }
                Err(e @ SessionError::NotFound(_)) => {
                    warn!(client_id = %conn.tab.client_id, %code, "ws: chat message dropped; session missing");
                    Err(Rejection::quiet(req.error_from(&e)))
                }
                Err(e) => Err(Rejection::from_err(req, &e)),
            }
        }
        _ => Err(unknown_op(req)),
    }
}

fn handle_notify(conn: &mut Connection, req: &Frame) -> HandlerResult {
    let Some(joined) = conn.tab.session_mut() else {
        return Err(Rejection::message(req, "Join or create a session first."));
    };
    let notifier = &mut joined.notifier;
    match req.op() {
        "toggle" => {
            notifier.toggle_panel();
        }
        "clear" => notifier.clear_notifications(),
        _ => return Err(unknown_op(req)),
    }

    let mut data = Data::new();
    data.insert("panel_open".into(), json!(notifier.panel_open()));
    data.insert("has_unread".into(), json!(notifier.has_unread()));
    data.insert("activity".into(), json!(notifier.activity()));
    Ok(Outcome::reply(data))
}

/// Append an activity to the joined session, if any. Failures are logged
/// only; the local action has already happened. Returns a `session:sync`
/// when the committed record carried other tabs' entries.
async fn post_activity(state: &AppState, tab: &mut TabContext, activity: ActivityNotification) -> Option<Frame> {
    let code = tab.session_code()?.to_owned();
    match state
        .sessions
        .append_activity(&code, activity, Some(tab.client_id))
        .await
    {
        Ok(committed) => local_sync_frame(tab, &committed),
        Err(e) => {
            warn!(client_id = %tab.client_id, %code, error = %e, "ws: activity not posted");
            None
        }
    }
}

// =============================================================================
// DESKTOP HANDLERS
// =============================================================================

async fn handle_app(state: &AppState, conn: &mut Connection, req: &Frame) -> HandlerResult {
    match req.op() {
        "open" => {
            let app_id = req.str_field("app_id").unwrap_or_default();
            let Some(app) = desktop::find_app(app_id) else {
                return Err(Rejection::message(req, format!("Unknown app: '{app_id}'")));
            };
            Ok(open_app(state, conn, req, app).await)
        }
        "exit" => {
            if let Some(stream_id) = conn.cancel_generation() {
                info!(client_id = %conn.tab.client_id, %stream_id, "ws: generation cancelled on exit");
            }
            let activity = conn.tab.exit_to_desktop();
            let sync = post_activity(state, &mut conn.tab, activity).await;
            Ok(Outcome::done()
                .then_some(sync)
                .toast(&Toast::info("Returned to Desktop")))
        }
        _ => Err(unknown_op(req)),
    }
}

async fn open_app(state: &AppState, conn: &mut Connection, req: &Frame, app: &'static AppDefinition) -> Outcome {
    let opened = conn.tab.open_app(app);
    let sync = post_activity(state, &mut conn.tab, opened.activity).await;

    let mut data = Data::new();
    data.insert("app".into(), json!(opened.app));
    let outcome = Outcome::reply(data).then_some(sync);
    match opened.interaction {
        Some(interaction) => outcome.then(start_generation(state, conn, req, interaction)),
        None => outcome,
    }
}

async fn handle_command(state: &AppState, conn: &mut Connection, req: &Frame) -> HandlerResult {
    match req.op() {
        "submit" => {
            let command = req.str_field("command").map(str::trim).unwrap_or_default();
            if command.is_empty() {
                return Err(Rejection::quiet(req.error("command required")));
            }
            submit_command(state, conn, req, command).await
        }
        _ => Err(unknown_op(req)),
    }
}

async fn submit_command(state: &AppState, conn: &mut Connection, req: &Frame, command: &str) -> HandlerResult {
    match conn.tab.route_command(command) {
        CommandRoute::OpenApp(app) => Ok(open_app(state, conn, req, app).await),
        CommandRoute::Interact(interaction) => {
            let stream = start_generation(state, conn, req, interaction);
            Ok(Outcome::done().then(stream))
        }
        CommandRoute::Unrecognized(message) => Err(Rejection::message(req, message)),
    }
}

fn handle_interaction(state: &AppState, conn: &mut Connection, req: &Frame) -> HandlerResult {
    match req.op() {
        "submit" => {
            let raw = req
                .data
                .get("interaction")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            let mut data: InteractionData = serde_json::from_value(raw)
                .map_err(|e| Rejection::quiet(req.error(format!("invalid interaction: {e}"))))?;
            if data.app_context.is_none() {
                data.app_context = conn.tab.current_app().map(|app| app.id.to_owned());
            }
            // Malformed logo/webhook values stop here, before any network call.
            let interaction = Interaction::try_from(data).map_err(|e| Rejection::from_err(req, &e))?;
            Ok(Outcome::done().then(start_generation(state, conn, req, interaction)))
        }
        _ => Err(unknown_op(req)),
    }
}

fn handle_history(conn: &mut Connection, req: &Frame) -> HandlerResult {
    if req.op() != "configure" {
        return Err(unknown_op(req));
    }

    let max_length = match req.data.get("max_length") {
        None => None,
        Some(raw) => match raw.as_u64().and_then(|n| usize::try_from(n).ok()) {
            Some(n) => Some(n),
            None => return Err(Rejection::message(req, "max_length must be a non-negative integer")),
        },
    };
    let statefulness = match req.data.get("statefulness") {
        None => None,
        Some(raw) => match raw.as_bool() {
            Some(enabled) => Some(enabled),
            None => return Err(Rejection::message(req, "statefulness must be a boolean")),
        },
    };

    let history = &mut conn.tab.history;
    let mut toasts = Vec::new();
    if let Some(len) = max_length {
        history.set_max_len(len);
        toasts.push(Toast::info(format!("Max history length set to {len}.")));
    }
    if let Some(enabled) = statefulness {
        history.set_statefulness(enabled);
        let text = if enabled { "Statefulness enabled." } else { "Statefulness disabled." };
        toasts.push(Toast::info(text));
    }

    let mut data = Data::new();
    data.insert("max_length".into(), json!(history.max_len()));
    data.insert("statefulness".into(), json!(history.statefulness_enabled()));
    Ok(toasts.iter().fold(Outcome::reply(data), Outcome::toast))
}

// =============================================================================
// VOICE HANDLERS
// =============================================================================

async fn handle_voice(state: &AppState, conn: &mut Connection, req: &Frame) -> HandlerResult {
    let outcome = match req.op() {
        "start" => {
            let started = conn.tab.voice.start();
            let mut data = voice_data(&conn.tab);
            data.insert("outcome".into(), json!(start_outcome_str(started)));
            Outcome::reply(data)
        }
        "stop" => {
            let stopped = conn.tab.voice.stop();
            let mut data = voice_data(&conn.tab);
            data.insert("stopped".into(), json!(stopped));
            Outcome::reply(data)
        }
        "result" => {
            let transcript = req.str_field("transcript").unwrap_or_default();
            let command = conn
                .tab
                .voice
                .on_result(transcript)
                .map_err(|e| Rejection::quiet(req.error_from(&e)))?;
            info!(client_id = %conn.tab.client_id, %command, "ws: voice command");

            let routed = submit_command(state, conn, req, &command).await;
            conn.tab.voice.finish_processing();
            let mut outcome = routed?;
            outcome.reply.extend(voice_data(&conn.tab));
            outcome.reply.insert("transcript".into(), json!(command));
            outcome
        }
        "error" => {
            let code = req.str_field("error").unwrap_or("unknown");
            let shown = conn.tab.voice.on_error(code);
            let outcome = Outcome::reply(voice_data(&conn.tab));
            match shown {
                Some(message) => outcome.toast(&Toast::error(message)),
                None => outcome,
            }
        }
        "end" => {
            conn.tab.voice.on_end();
            Outcome::reply(voice_data(&conn.tab))
        }
        "locale" => {
            let locale: RecognitionLocale = req
                .str_field("locale")
                .unwrap_or_default()
                .parse()
                .map_err(|e| Rejection::from_err(req, &e))?;
            conn.tab.voice.set_locale(locale);
            Outcome::reply(voice_data(&conn.tab))
        }
        _ => return Err(unknown_op(req)),
    };
    Ok(outcome)
}

fn voice_data(tab: &TabContext) -> Data {
    let mut data = Data::new();
    data.insert("status".into(), json!(tab.voice.status().as_str()));
    data.insert("locale".into(), json!(tab.voice.locale().tag()));
    data
}

fn start_outcome_str(outcome: StartOutcome) -> &'static str {
    match outcome {
        StartOutcome::Started => "started",
        StartOutcome::Stopped => "stopped",
        StartOutcome::Refused => "refused",
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Record `interaction`, supersede any running generation, and spawn a new
/// one. Returns the `generate:stream` frame announcing it, which must reach
/// the client before any of its items.
fn start_generation(state: &AppState, conn: &mut Connection, req: &Frame, interaction: Interaction) -> Frame {
    let client_id = conn.tab.client_id;
    let interaction_id = interaction.data.id.clone();
    let history = conn.tab.history.record(interaction);
    let chunks = state
        .generator
        .stream(&history, conn.tab.history.effective_len());

    if let Some(previous) = conn.cancel_generation() {
        info!(%client_id, %previous, "ws: generation superseded");
    }

    let mut announce = Frame::request("generate:stream", Data::new()).with_data("interaction_id", interaction_id);
    announce.parent_id = Some(req.id);
    announce.session = conn.tab.session_code().map(str::to_owned);

    let token = CancellationToken::new();
    conn.generation = Some(ActiveGeneration { id: announce.id, token: token.clone() });

    let stream_id = announce.id;
    let tx = conn.outbound.clone();
    let request = announce.clone();
    tokio::spawn(async move {
        let outcome = generation::run_generation(chunks, request, tx, token).await;
        info!(%client_id, %stream_id, ?outcome, "ws: generation finished");
    });
    announce
}

// =============================================================================
// HELPERS
// =============================================================================

fn toast_frame(toast: &Toast) -> Frame {
    Frame::request("toast", Data::new())
        .with_data("message", toast.message.clone())
        .with_data("kind", json!(toast.kind))
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };

    // Generation items are too chatty to log one by one.
    if frame.status == Status::Error {
        let code = frame.str_field("code").unwrap_or("-");
        let message = frame.str_field("message").unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else if frame.status != Status::Item {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }

    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
