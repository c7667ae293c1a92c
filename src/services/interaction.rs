//! Interactions — validated UI events and the bounded history fed to
//! generation.
//!
//! DESIGN
//! ======
//! Tabs send interactions in the loose wire shape
//! `{id, type, value?, elementType, elementText, appContext}`. At the
//! boundary they are classified into an `InteractionKind`; the two ids that
//! trigger side effects (`generate_logo`, `send_webhook`) must carry a
//! well-formed JSON value or the interaction is rejected before any network
//! call.
//!
//! History is newest-first. With statefulness off it holds only the latest
//! interaction; with it on, it is truncated to `max_len` on every record.

use serde::{Deserialize, Serialize};

pub const GENERATE_LOGO_ID: &str = "generate_logo";
pub const SEND_WEBHOOK_ID: &str = "send_webhook";
pub const COMMAND_BAR_ID: &str = "command_bar_submit";

// =============================================================================
// WIRE SHAPE
// =============================================================================

/// Interaction as sent by a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionData {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub element_type: String,
    #[serde(default)]
    pub element_text: String,
    #[serde(default)]
    pub app_context: Option<String>,
}

// =============================================================================
// VALIDATED SHAPE
// =============================================================================

/// What an interaction asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    /// An app window was opened from its icon.
    AppOpen,
    /// Free text submitted through the command bar (typed or spoken).
    CommandBar { command: String },
    /// Render a logo image instead of generating text.
    GenerateLogo { name: String, description: String },
    /// POST a JSON payload to a user-supplied URL.
    SendWebhook { url: String, payload: String },
    /// Any other click or form submission inside generated content.
    Element,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub data: InteractionData,
    pub kind: InteractionKind,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("interaction id is required")]
    MissingId,
    #[error("{id} value must be a JSON object: {reason}")]
    MalformedValue { id: String, reason: String },
    #[error("Webhook URL is required.")]
    MissingWebhookUrl,
    #[error("invalid webhook URL '{0}'")]
    InvalidWebhookUrl(String),
    #[error("webhook payload is not valid JSON: {0}")]
    InvalidWebhookPayload(String),
}

impl crate::frame::ErrorCode for InteractionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingId => "E_INTERACTION_ID",
            Self::MalformedValue { .. } => "E_INTERACTION_VALUE",
            Self::MissingWebhookUrl | Self::InvalidWebhookUrl(_) => "E_WEBHOOK_URL",
            Self::InvalidWebhookPayload(_) => "E_WEBHOOK_PAYLOAD",
        }
    }
}

impl TryFrom<InteractionData> for Interaction {
    type Error = InteractionError;

    fn try_from(data: InteractionData) -> Result<Self, Self::Error> {
        if data.id.trim().is_empty() {
            return Err(InteractionError::MissingId);
        }

        let kind = match (data.id.as_str(), data.value.as_deref()) {
            (GENERATE_LOGO_ID, Some(value)) => {
                let fields = parse_value_object(GENERATE_LOGO_ID, value)?;
                InteractionKind::GenerateLogo {
                    name: string_field(&fields, "logo_name_input"),
                    description: string_field(&fields, "logo_description_input"),
                }
            }
            (SEND_WEBHOOK_ID, Some(value)) => {
                let fields = parse_value_object(SEND_WEBHOOK_ID, value)?;
                let url = string_field(&fields, "webhook_url_input");
                if url.trim().is_empty() {
                    return Err(InteractionError::MissingWebhookUrl);
                }
                if reqwest::Url::parse(url.trim()).is_err() {
                    return Err(InteractionError::InvalidWebhookUrl(url));
                }
                let payload = string_field(&fields, "webhook_payload_input");
                if let Err(e) = serde_json::from_str::<serde_json::Value>(&payload) {
                    return Err(InteractionError::InvalidWebhookPayload(e.to_string()));
                }
                InteractionKind::SendWebhook { url: url.trim().to_owned(), payload }
            }
            _ if data.kind == "app_open" => InteractionKind::AppOpen,
            _ if data.kind == "command_bar" => {
                InteractionKind::CommandBar { command: data.value.clone().unwrap_or_default() }
            }
            _ => InteractionKind::Element,
        };

        Ok(Self { data, kind })
    }
}

fn parse_value_object(
    id: &str,
    value: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, InteractionError> {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(InteractionError::MalformedValue { id: id.into(), reason: "not an object".into() }),
        Err(e) => Err(InteractionError::MalformedValue { id: id.into(), reason: e.to_string() }),
    }
}

fn string_field(fields: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    match fields.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl Interaction {
    /// An app-open interaction for the given catalog app.
    #[must_use]
    pub fn app_open(app_id: &str, app_name: &str) -> Self {
        Self {
            data: InteractionData {
                id: app_id.into(),
                kind: "app_open".into(),
                value: None,
                element_type: "icon".into(),
                element_text: app_name.into(),
                app_context: Some(app_id.into()),
            },
            kind: InteractionKind::AppOpen,
        }
    }

    /// A command-bar submission inside the given app context.
    #[must_use]
    pub fn command_bar(command: &str, app_context: Option<&str>) -> Self {
        Self {
            data: InteractionData {
                id: COMMAND_BAR_ID.into(),
                kind: "command_bar".into(),
                value: Some(command.into()),
                element_type: "input".into(),
                element_text: "Command Bar".into(),
                app_context: app_context.map(str::to_owned),
            },
            kind: InteractionKind::CommandBar { command: command.into() },
        }
    }
}

// =============================================================================
// HISTORY
// =============================================================================

/// Newest-first bounded interaction history.
#[derive(Debug, Clone)]
pub struct InteractionHistory {
    entries: Vec<Interaction>,
    max_len: usize,
    default_len: usize,
}

impl InteractionHistory {
    /// `default_len` is both the starting length and the length restored
    /// when statefulness is switched back on from zero.
    #[must_use]
    pub fn new(default_len: usize) -> Self {
        Self { entries: Vec::new(), max_len: default_len, default_len }
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Statefulness is derived: on iff history is allowed to hold anything.
    #[must_use]
    pub fn statefulness_enabled(&self) -> bool {
        self.max_len > 0
    }

    /// History length the generation prompt should describe.
    #[must_use]
    pub fn effective_len(&self) -> usize {
        if self.statefulness_enabled() { self.max_len } else { 1 }
    }

    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
    }

    pub fn set_statefulness(&mut self, enabled: bool) {
        if !enabled {
            self.max_len = 0;
        } else if self.max_len == 0 {
            self.max_len = self.default_len.max(1);
        }
    }

    /// Record an interaction and return the history to send with it.
    pub fn record(&mut self, interaction: Interaction) -> Vec<Interaction> {
        if self.statefulness_enabled() {
            self.entries.insert(0, interaction);
            self.entries.truncate(self.max_len);
        } else {
            self.entries = vec![interaction];
        }
        self.entries.clone()
    }

    #[must_use]
    pub fn entries(&self) -> &[Interaction] {
        &self.entries
    }
}

#[cfg(test)]
#[path = "interaction_test.rs"]
mod tests;
