//! In-memory key-value backend.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{KvStore, StoreError, Versioned};

/// Process-local store. Contents live until the process exits.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Versioned>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<u64>,
        value: String,
    ) -> Result<Option<u64>, StoreError> {
        let mut entries = self.entries.write().await;
        let current = entries.get(key).map(|v| v.version);
        if current != expected {
            return Ok(None);
        }
        let version = current.map_or(1, |v| v + 1);
        entries.insert(key.to_owned(), Versioned { value, version });
        Ok(Some(version))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
