//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the websocket endpoint every desktop tab holds
//! open, a small REST surface over sessions for scripts and bots, the app
//! catalog, and a health check.

pub mod sessions;
pub mod ws;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::desktop::{APP_CATALOG, AppDefinition};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ws", get(ws::handle_ws))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/{code}", get(sessions::get_session))
        .route("/api/sessions/{code}/messages", post(sessions::post_message))
        .route("/api/sessions/{code}/activity", post(sessions::post_activity))
        .route("/api/apps", get(list_apps))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_apps() -> Json<&'static [AppDefinition]> {
    Json(APP_CATALOG)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
