//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the session client (store + bus) and the content generator.
//! Per-tab state lives in each websocket task, not here.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::generation::Generator;
use crate::services::session::SessionStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub generator: Generator,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, sessions: SessionStore, generator: Generator) -> Self {
        Self { config: Arc::new(config), sessions, generator }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
