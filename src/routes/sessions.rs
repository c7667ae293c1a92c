//! Session REST routes.
//!
//! DESIGN
//! ======
//! Thin wrappers over `SessionStore` for callers that are not desktop tabs.
//! Writes carry no origin, so every joined tab sees them as remote updates
//! and receives a `session:sync`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::session::{self, ActivityNotification, ChatMessage, SessionData, SessionError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub code: String,
    /// `XXX-XXX` grouping for display.
    pub display: String,
    #[serde(flatten)]
    pub data: SessionData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub text: String,
    pub sender_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBody {
    pub message: String,
    pub sender_id: String,
}

pub(crate) fn session_error_to_status(err: SessionError) -> StatusCode {
    match err {
        SessionError::InvalidCode(_) => StatusCode::BAD_REQUEST,
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::WriteConflict(_) => StatusCode::CONFLICT,
        SessionError::Corrupt(_) | SessionError::Store(_) => {
            warn!(error = %err, "session route failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `POST /api/sessions`: create an empty session.
pub async fn create_session(State(state): State<AppState>) -> Result<(StatusCode, Json<SessionResponse>), StatusCode> {
    let code = state
        .sessions
        .create(None)
        .await
        .map_err(session_error_to_status)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse { display: session::display_code(&code), code, data: SessionData::default() }),
    ))
}

/// `GET /api/sessions/{code}`: the stored record. Unknown codes are 404
/// here even though tabs read them as empty.
pub async fn get_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let code = existing_code(&state, &code).await?;
    let data = state
        .sessions
        .read(&code)
        .await
        .map_err(session_error_to_status)?;
    Ok(Json(SessionResponse { display: session::display_code(&code), code, data }))
}

/// `POST /api/sessions/{code}/messages`
pub async fn post_message(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<ChatMessage>), StatusCode> {
    let code = session::validate_code(&code).map_err(session_error_to_status)?;
    let (text, sender_id) = (body.text.trim(), body.sender_id.trim());
    if text.is_empty() || sender_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let message = ChatMessage::new(text, sender_id);
    state
        .sessions
        .append_message(&code, message.clone(), None)
        .await
        .map_err(session_error_to_status)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /api/sessions/{code}/activity`
pub async fn post_activity(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<ActivityBody>,
) -> Result<(StatusCode, Json<ActivityNotification>), StatusCode> {
    let code = session::validate_code(&code).map_err(session_error_to_status)?;
    let (message, sender_id) = (body.message.trim(), body.sender_id.trim());
    if message.is_empty() || sender_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let activity = ActivityNotification::new(message, sender_id);
    state
        .sessions
        .append_activity(&code, activity.clone(), None)
        .await
        .map_err(session_error_to_status)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn existing_code(state: &AppState, raw: &str) -> Result<String, StatusCode> {
    let code = session::validate_code(raw).map_err(session_error_to_status)?;
    if state
        .sessions
        .exists(&code)
        .await
        .map_err(session_error_to_status)?
    {
        Ok(code)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;
