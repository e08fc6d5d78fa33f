//! Seen-set: the in-memory mirror of the persisted notified-listing record

use std::collections::HashSet;
use std::sync::Arc;

use crate::ports::{SeenStore, StoreError};

/// Identifiers of listings that have already been notified
///
/// Hydrated once from the store; afterwards every insertion goes through
/// [`SeenSet::record`], which persists before updating memory.
pub struct SeenSet<St: SeenStore + ?Sized> {
    store: Arc<St>,
    ids: HashSet<String>,
}

impl<St: SeenStore + ?Sized> SeenSet<St> {
    /// Load every previously recorded identifier
    pub async fn load(store: Arc<St>) -> Result<Self, StoreError> {
        let ids = store.load().await?;
        tracing::info!(count = ids.len(), "Loaded seen-set");
        Ok(Self { store, ids })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Persist `id`, then mark it seen in memory
    ///
    /// If the append fails the identifier stays unseen.
    pub async fn record(&mut self, id: &str) -> Result<(), StoreError> {
        if self.ids.contains(id) {
            return Ok(());
        }
        self.store.append(id).await?;
        self.ids.insert(id.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All identifiers, sorted
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
