use super::{FilterStore, StoredState};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;

/// Volatile store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: RwLock<Option<StoredState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoredState) -> Self {
        Self {
            doc: RwLock::new(Some(state)),
        }
    }
}

#[async_trait]
impl FilterStore for MemoryStore {
    async fn load(&self) -> Result<Option<StoredState>> {
        Ok(self.doc.read().unwrap().clone())
    }

    async fn save(&self, state: &StoredState) -> Result<()> {
        *self.doc.write().unwrap() = Some(state.clone());
        Ok(())
    }
}
