//! Desktop — per-connection shell state and the app catalog.
//!
//! ARCHITECTURE
//! ============
//! Every websocket connection owns one `TabContext`: its user id, the joined
//! session (if any) with its notifier, the open app, interaction history,
//! and voice status. Nothing here touches the store or the network; the
//! websocket layer applies the returned effects (activity to post, toast to
//! show, interaction to generate for).
//!
//! Command routing with no app open matches the first catalog app whose
//! name appears in the command, case-insensitively. Catalog order is
//! therefore significant.

use serde::Serialize;
use uuid::Uuid;

use super::interaction::{Interaction, InteractionHistory};
use super::notifier::CrossTabNotifier;
use super::session::{ActivityNotification, SessionData};
use super::voice::VoiceControl;

/// App that opens its own chat UI instead of generated content.
pub const MESSENGER_APP_ID: &str = "messenger_app";

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const fn app(id: &'static str, name: &'static str, icon: &'static str, color: &'static str) -> AppDefinition {
    AppDefinition { id, name, icon, color }
}

pub static APP_CATALOG: &[AppDefinition] = &[
    app("my_computer", "My Computer", "💻", "#e3f2fd"),
    app("documents", "Documents", "📁", "#f1f8e9"),
    app("notepad_app", "Notepad", "📝", "#fffde7"),
    app("settings_app", "Settings", "⚙️", "#e7f3ff"),
    app("trash_bin", "Trash Bin", "🗑️", "#ffebee"),
    app("web_browser_app", "Web Browser", "🌐", "#e0f7fa"),
    app("calculator_app", "Calculator", "🧮", "#f5f5f5"),
    app("travel_app", "Travel", "✈️", "#e8f5e9"),
    app("shopping_app", "Shopping", "🛍️", "#fce4ec"),
    app("gaming_app", "Games", "🎮", "#f3e5f5"),
    app("logo_studio_app", "Logo Studio", "🎨", "#fff8e1"),
    app("webhook_app", "Webhook Sender", "🔗", "#ede7f6"),
    app(MESSENGER_APP_ID, "Messenger", "💬", "#e8eaf6"),
];

#[must_use]
pub fn find_app(id: &str) -> Option<&'static AppDefinition> {
    APP_CATALOG.iter().find(|a| a.id == id)
}

/// First catalog app whose name is contained in `command`.
#[must_use]
pub fn find_app_by_command(command: &str) -> Option<&'static AppDefinition> {
    let command = command.to_lowercase();
    APP_CATALOG
        .iter()
        .find(|a| command.contains(&a.name.to_lowercase()))
}

/// Catalog display name for an app id, falling back to the id itself.
#[must_use]
pub fn app_display_name(id: &str) -> &str {
    find_app(id).map_or(id, |a| a.name)
}

// =============================================================================
// TOASTS AND ACTIVITY TEXT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

impl Toast {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: ToastKind::Info }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: ToastKind::Success }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), kind: ToastKind::Error }
    }
}

#[must_use]
pub fn opened_app_message(user_id: &str, app_name: &str) -> String {
    format!("{user_id} opened the {app_name} app.")
}

#[must_use]
pub fn returned_to_desktop_message(user_id: &str) -> String {
    format!("{user_id} returned to the desktop.")
}

// =============================================================================
// TAB CONTEXT
// =============================================================================

/// Outcome of opening an app.
#[derive(Debug)]
pub struct AppOpened {
    pub app: &'static AppDefinition,
    pub activity: ActivityNotification,
    /// `None` for apps that render without generation.
    pub interaction: Option<Interaction>,
}

/// Where a command-bar submission goes.
#[derive(Debug)]
pub enum CommandRoute {
    OpenApp(&'static AppDefinition),
    Interact(Interaction),
    Unrecognized(String),
}

pub struct JoinedSession {
    pub code: String,
    pub notifier: CrossTabNotifier,
}

pub struct TabContext {
    pub client_id: Uuid,
    pub user_id: String,
    pub history: InteractionHistory,
    pub voice: VoiceControl,
    session: Option<JoinedSession>,
    current_app: Option<&'static AppDefinition>,
}

impl TabContext {
    #[must_use]
    pub fn new(client_id: Uuid, user_id: String, default_history_len: usize) -> Self {
        Self {
            client_id,
            user_id,
            history: InteractionHistory::new(default_history_len),
            voice: VoiceControl::new(),
            session: None,
            current_app: None,
        }
    }

    #[must_use]
    pub fn session_code(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.code.as_str())
    }

    #[must_use]
    pub fn session(&self) -> Option<&JoinedSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut JoinedSession> {
        self.session.as_mut()
    }

    /// Enter a session seeded with its current record. Replaces any
    /// previous session.
    pub fn join(&mut self, code: String, key: String, initial: SessionData) -> &JoinedSession {
        let notifier = CrossTabNotifier::new(key, self.client_id, self.user_id.clone(), initial);
        self.session.insert(JoinedSession { code, notifier })
    }

    /// Leave the current session. Returns the code that was left.
    pub fn leave(&mut self) -> Option<String> {
        self.session.take().map(|s| s.code)
    }

    #[must_use]
    pub fn current_app(&self) -> Option<&'static AppDefinition> {
        self.current_app
    }

    pub fn open_app(&mut self, app: &'static AppDefinition) -> AppOpened {
        self.current_app = Some(app);
        let activity = ActivityNotification::new(opened_app_message(&self.user_id, app.name), &self.user_id);
        let interaction = (app.id != MESSENGER_APP_ID).then(|| Interaction::app_open(app.id, app.name));
        AppOpened { app, activity, interaction }
    }

    /// Close the open app. History is kept so reopening has context.
    pub fn exit_to_desktop(&mut self) -> ActivityNotification {
        self.current_app = None;
        ActivityNotification::new(returned_to_desktop_message(&self.user_id), &self.user_id)
    }

    #[must_use]
    pub fn route_command(&self, command: &str) -> CommandRoute {
        match self.current_app {
            Some(app) => CommandRoute::Interact(Interaction::command_bar(command, Some(app.id))),
            None => match find_app_by_command(command) {
                Some(app) => CommandRoute::OpenApp(app),
                None => CommandRoute::Unrecognized(format!("Command not recognized: '{command}'")),
            },
        }
    }
}

#[cfg(test)]
#[path = "desktop_test.rs"]
mod tests;
