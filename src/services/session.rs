//! Session store — shared chat and activity records keyed by a short code.
//!
//! ARCHITECTURE
//! ============
//! A session is one JSON record `{messages, activity}` stored under
//! `<prefix><CODE>` in the key-value store. Tabs create a session, share the
//! 6-character code out of band, and join from another tab. Both sequences
//! are append-only; every append rewrites the whole record.
//!
//! TRADE-OFFS
//! ==========
//! Appends are read-modify-write with a version check. Two tabs appending at
//! the same moment both land: the loser of the compare-and-set re-reads and
//! retries. After `MAX_APPEND_ATTEMPTS` conflicts the append fails loudly
//! rather than overwriting the other writer.

use std::fmt::Write;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::bus::{SessionBus, StorageEvent};
use crate::frame::now_ms;
use crate::store::{KvStore, StoreError};

/// Alphabet for session codes.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a session code after normalization.
pub const CODE_LEN: usize = 6;

const MAX_CREATE_ATTEMPTS: usize = 8;
const MAX_APPEND_ATTEMPTS: usize = 8;

// =============================================================================
// TYPES
// =============================================================================

/// One chat line. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender_id: String,
    pub timestamp: i64,
}

impl ChatMessage {
    #[must_use]
    pub fn new(text: impl Into<String>, sender_id: impl Into<String>) -> Self {
        let timestamp = now_ms();
        Self { id: record_id("msg", timestamp), text: text.into(), sender_id: sender_id.into(), timestamp }
    }
}

/// A broadcast record of a user action. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityNotification {
    pub id: String,
    pub message: String,
    pub timestamp: i64,
    pub sender_id: String,
}

impl ActivityNotification {
    #[must_use]
    pub fn new(message: impl Into<String>, sender_id: impl Into<String>) -> Self {
        let timestamp = now_ms();
        Self { id: record_id("act", timestamp), message: message.into(), timestamp, sender_id: sender_id.into() }
    }
}

/// The whole stored record for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub activity: Vec<ActivityNotification>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session code '{0}': expected {CODE_LEN} characters A-Z or 0-9")]
    InvalidCode(String),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("session {0} is being written concurrently; try again")]
    WriteConflict(String),
    #[error("session record is corrupt: {0}")]
    Corrupt(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl crate::frame::ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode(_) => "E_INVALID_SESSION_CODE",
            Self::NotFound(_) => "E_SESSION_NOT_FOUND",
            Self::WriteConflict(_) => "E_SESSION_CONFLICT",
            Self::Corrupt(_) => "E_SESSION_CORRUPT",
            Self::Store(_) => "E_STORE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::WriteConflict(_) | Self::Store(_))
    }
}

// =============================================================================
// CODES AND IDS
// =============================================================================

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02X}");
    }
    s
}

/// Generate a random session code from [`CODE_ALPHABET`].
#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Generate a display id for a connected tab, e.g. `User-3FA2`.
#[must_use]
pub fn generate_user_id() -> String {
    let bytes: [u8; 2] = rand::rng().random();
    format!("User-{}", bytes_to_hex(&bytes))
}

fn record_id(prefix: &str, timestamp: i64) -> String {
    let suffix: u32 = rand::rng().random();
    format!("{prefix}-{timestamp}-{suffix:08x}")
}

/// Canonicalize user input: uppercase, hyphens stripped, whitespace trimmed.
#[must_use]
pub fn normalize_code(input: &str) -> String {
    input.trim().replace('-', "").to_uppercase()
}

/// Normalize and validate a session code.
///
/// # Errors
///
/// Returns [`SessionError::InvalidCode`] if the normalized code is not
/// exactly [`CODE_LEN`] characters from [`CODE_ALPHABET`].
pub fn validate_code(input: &str) -> Result<String, SessionError> {
    let code = normalize_code(input);
    let valid = code.len() == CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b));
    if valid { Ok(code) } else { Err(SessionError::InvalidCode(input.to_owned())) }
}

/// Group a code for display: `ABC123` → `ABC-123`.
#[must_use]
pub fn display_code(code: &str) -> String {
    if code.len() != CODE_LEN || !code.is_ascii() {
        return code.to_owned();
    }
    let (head, tail) = code.split_at(CODE_LEN / 2);
    format!("{head}-{tail}")
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Session client over a [`KvStore`]. Cheap to clone; publishes every
/// committed write on the [`SessionBus`].
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KvStore>,
    bus: SessionBus,
    prefix: Arc<str>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>, bus: SessionBus, prefix: &str) -> Self {
        Self { kv, bus, prefix: Arc::from(prefix) }
    }

    /// Storage key for a normalized code.
    #[must_use]
    pub fn key_for(&self, code: &str) -> String {
        format!("{}{code}", self.prefix)
    }

    #[must_use]
    pub fn bus(&self) -> &SessionBus {
        &self.bus
    }

    /// Create a new empty session and return its code.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backend write fails, or a conflict if no
    /// free code was found after several attempts.
    pub async fn create(&self, origin: Option<Uuid>) -> Result<String, SessionError> {
        let initial = encode(&SessionData::default())?;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let code = generate_code();
            let key = self.key_for(&code);
            if self
                .kv
                .compare_and_set(&key, None, initial.clone())
                .await?
                .is_some()
            {
                info!(%code, "session created");
                self.bus
                    .publish(StorageEvent { key, new_value: initial, origin });
                return Ok(code);
            }
            warn!(%code, "session code collision; regenerating");
        }
        Err(SessionError::WriteConflict("<new>".into()))
    }

    /// True iff a record exists for `code`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backend read fails.
    pub async fn exists(&self, code: &str) -> Result<bool, SessionError> {
        Ok(self.kv.get(&self.key_for(code)).await?.is_some())
    }

    /// Read a session. Missing or unparseable records read as empty.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backend read fails.
    pub async fn read(&self, code: &str) -> Result<SessionData, SessionError> {
        let Some(entry) = self.kv.get(&self.key_for(code)).await? else {
            return Ok(SessionData::default());
        };
        match serde_json::from_str(&entry.value) {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!(%code, error = %e, "unparseable session record; reading as empty");
                Ok(SessionData::default())
            }
        }
    }

    /// Append a chat message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the session does not exist.
    pub async fn append_message(
        &self,
        code: &str,
        message: ChatMessage,
        origin: Option<Uuid>,
    ) -> Result<SessionData, SessionError> {
        self.append_with(code, origin, |data| data.messages.push(message.clone()))
            .await
    }

    /// Append an activity notification.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the session does not exist.
    pub async fn append_activity(
        &self,
        code: &str,
        activity: ActivityNotification,
        origin: Option<Uuid>,
    ) -> Result<SessionData, SessionError> {
        self.append_with(code, origin, |data| data.activity.push(activity.clone()))
            .await
    }

    async fn append_with(
        &self,
        code: &str,
        origin: Option<Uuid>,
        mutate: impl Fn(&mut SessionData),
    ) -> Result<SessionData, SessionError> {
        let key = self.key_for(code);
        for attempt in 0..MAX_APPEND_ATTEMPTS {
            let Some(entry) = self.kv.get(&key).await? else {
                return Err(SessionError::NotFound(code.to_owned()));
            };
            let mut data: SessionData =
                serde_json::from_str(&entry.value).map_err(|e| SessionError::Corrupt(e.to_string()))?;
            mutate(&mut data);
            let encoded = encode(&data)?;

            if self
                .kv
                .compare_and_set(&key, Some(entry.version), encoded.clone())
                .await?
                .is_some()
            {
                self.bus
                    .publish(StorageEvent { key, new_value: encoded, origin });
                return Ok(data);
            }
            warn!(%code, attempt, "session append conflict; retrying");
        }
        Err(SessionError::WriteConflict(code.to_owned()))
    }
}

fn encode(data: &SessionData) -> Result<String, SessionError> {
    serde_json::to_string(data).map_err(|e| SessionError::Corrupt(e.to_string()))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
