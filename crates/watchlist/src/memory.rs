use std::sync::Arc;

use async_trait::async_trait;
use scoring_core::{DataResult, WatchlistEntry, WatchlistStore};
use tokio::sync::Mutex;

/// Process-local store. Clones share the same list.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Vec<WatchlistEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn load(&self) -> DataResult<Vec<WatchlistEntry>> {
        Ok(self.entries.lock().await.clone())
    }

    async fn save(&self, entries: &[WatchlistEntry]) -> DataResult<()> {
        *self.entries.lock().await = entries.to_vec();
        Ok(())
    }
}
