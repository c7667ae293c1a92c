//! Key-value store — versioned string values shared by every connected tab.
//!
//! DESIGN
//! ======
//! The session layer only needs whole-record reads and whole-record writes
//! keyed by a namespaced string. Every value carries a version that the
//! backend bumps on each write, so callers can do read-modify-write with
//! `compare_and_set` instead of racing on last-write-wins.
//!
//! Backends:
//! - `MemoryStore`: process-local map, used when no database is configured.
//! - `PgStore`: `kv_entries` table in Postgres.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// =============================================================================
// TYPES
// =============================================================================

/// A stored value together with its write version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Backend-neutral async key-value store. Enables swapping Postgres for the
/// in-memory map in tests and single-process deployments.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Read the current value and version for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend is unreachable.
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError>;

    /// Write `value` only if the stored version equals `expected`
    /// (`None` means the key must be absent). Returns the new version, or
    /// `None` when another writer got there first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend is unreachable.
    async fn compare_and_set(&self, key: &str, expected: Option<u64>, value: String)
    -> Result<Option<u64>, StoreError>;
}
