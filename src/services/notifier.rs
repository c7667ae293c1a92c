//! Cross-tab notifier — folds other tabs' session writes into local state.
//!
//! DESIGN
//! ======
//! Each connection keeps its own copy of the joined session's `messages`
//! and `activity`. Bus events for the session key replace a local sequence
//! only when the incoming one is longer; the append-only record makes
//! length a sufficient diff. Writes made by this connection never arrive
//! here (filtered by origin), so the write call site folds in the committed
//! record through `record_local`. Taking the committed record rather than
//! pushing the new entry keeps foreign writes that raced ahead of ours.
//!
//! Unread tracking: a new activity from someone else raises `has_unread`
//! unless the notification panel is open, in which case it counts as seen.

use tracing::warn;
use uuid::Uuid;

use super::bus::StorageEvent;
use super::session::{ActivityNotification, ChatMessage, SessionData};

/// What changed after applying one event. `None` fields were untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    pub messages: Option<Vec<ChatMessage>>,
    pub activity: Option<Vec<ActivityNotification>>,
    pub has_unread: bool,
}

pub struct CrossTabNotifier {
    key: String,
    client_id: Uuid,
    user_id: String,
    messages: Vec<ChatMessage>,
    activity: Vec<ActivityNotification>,
    panel_open: bool,
    has_unread: bool,
}

impl CrossTabNotifier {
    /// Start observing `key` seeded with the record read at join time.
    #[must_use]
    pub fn new(key: String, client_id: Uuid, user_id: String, initial: SessionData) -> Self {
        Self {
            key,
            client_id,
            user_id,
            messages: initial.messages,
            activity: initial.activity,
            panel_open: false,
            has_unread: false,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn activity(&self) -> &[ActivityNotification] {
        &self.activity
    }

    #[must_use]
    pub fn has_unread(&self) -> bool {
        self.has_unread
    }

    #[must_use]
    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    /// Apply a bus event. Returns `None` when the event is not for this
    /// session, came from this connection, or changed nothing.
    pub fn apply(&mut self, event: &StorageEvent) -> Option<SyncUpdate> {
        if event.key != self.key || event.origin == Some(self.client_id) {
            return None;
        }

        let incoming: SessionData = match serde_json::from_str(&event.new_value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %self.key, error = %e, "notifier: ignoring malformed session update");
                return None;
            }
        };

        let mut update = SyncUpdate { messages: None, activity: None, has_unread: self.has_unread };

        if incoming.messages.len() > self.messages.len() {
            self.messages = incoming.messages;
            update.messages = Some(self.messages.clone());
        }

        if incoming.activity.len() > self.activity.len() {
            self.activity = incoming.activity;
            let from_other = self
                .activity
                .last()
                .is_some_and(|latest| latest.sender_id != self.user_id);
            if from_other && !self.panel_open {
                self.has_unread = true;
            }
            update.activity = Some(self.activity.clone());
        }

        if update.messages.is_none() && update.activity.is_none() {
            return None;
        }
        update.has_unread = self.has_unread;
        Some(update)
    }

    /// Fold in the record committed by this connection's own write. The
    /// committed record may also carry entries other tabs wrote since this
    /// connection last heard from the bus; their events will then look
    /// stale to `apply`, so they are reported here instead.
    ///
    /// Returns an update only when the record held entries besides the one
    /// this connection just appended.
    pub fn record_local(&mut self, committed: &SessionData) -> Option<SyncUpdate> {
        let mut update = SyncUpdate { messages: None, activity: None, has_unread: self.has_unread };

        let seen = self.messages.len();
        if committed.messages.len() > seen {
            self.messages.clone_from(&committed.messages);
            if committed.messages.len() - seen > 1 {
                update.messages = Some(self.messages.clone());
            }
        }

        let seen = self.activity.len();
        if committed.activity.len() > seen {
            self.activity.clone_from(&committed.activity);
            let added = &self.activity[seen..];
            let from_other = added.iter().any(|a| a.sender_id != self.user_id);
            if from_other && !self.panel_open {
                self.has_unread = true;
            }
            if added.len() > 1 {
                update.activity = Some(self.activity.clone());
            }
        }

        if update.messages.is_none() && update.activity.is_none() {
            return None;
        }
        update.has_unread = self.has_unread;
        Some(update)
    }

    /// Toggle the notification panel. Opening marks everything read.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_open = !self.panel_open;
        if self.panel_open {
            self.has_unread = false;
        }
        self.panel_open
    }

    /// Clear the local notification list, mark read, and close the panel.
    /// The stored record keeps its entries.
    pub fn clear_notifications(&mut self) {
        self.activity.clear();
        self.has_unread = false;
        self.panel_open = false;
    }
}

#[cfg(test)]
#[path = "notifier_test.rs"]
mod tests;
