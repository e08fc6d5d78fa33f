//! In-memory seen-set store for testing and ephemeral runs

use async_trait::async_trait;
use room_watch_domain::{SeenStore, StoreError};
use std::collections::HashSet;
use std::sync::RwLock;

/// In-memory seen-set store; contents are lost on exit
pub struct InMemorySeenStore {
    ids: RwLock<HashSet<String>>,
}

impl InMemorySeenStore {
    pub fn new() -> Self {
        Self {
            ids: RwLock::new(HashSet::new()),
        }
    }

    /// Pre-populated store
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl Default for InMemorySeenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeenStore for InMemorySeenStore {
    async fn load(&self) -> Result<HashSet<String>, StoreError> {
        let ids = self
            .ids
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(ids.clone())
    }

    async fn append(&self, id: &str) -> Result<(), StoreError> {
        let mut ids = self
            .ids
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        ids.insert(id.to_string());
        Ok(())
    }
}
