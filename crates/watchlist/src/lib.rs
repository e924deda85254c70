//! Saved watchlist of scored symbols.
//!
//! `Watchlist` owns the in-memory list and writes the whole list back to its
//! store after every change. Symbols are unique and compared case-insensitively.

pub mod json_store;
pub mod memory;
pub mod sqlite_store;

use scoring_core::{DataResult, WatchlistEntry, WatchlistStore};

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite_store::SqliteWatchlistStore;

pub struct Watchlist<S: WatchlistStore> {
    store: S,
    entries: Vec<WatchlistEntry>,
}

impl<S: WatchlistStore> Watchlist<S> {
    /// Load the current list from `store`.
    pub async fn load(store: S) -> DataResult<Self> {
        let entries = store.load().await?;
        tracing::debug!("Loaded watchlist with {} entries", entries.len());
        Ok(Self { store, entries })
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchlistEntry> {
        self.position(symbol).map(|i| &self.entries[i])
    }

    /// Add an entry. An existing symbol keeps its place and `added_at` but
    /// takes the new name and score.
    pub async fn add(&mut self, entry: WatchlistEntry) -> DataResult<()> {
        let entry = normalize(entry);
        let mut next = self.entries.clone();
        let added = match self.position(&entry.symbol) {
            Some(i) => {
                let existing = &mut next[i];
                existing.name = entry.name;
                existing.score = entry.score;
                None
            }
            None => {
                let symbol = entry.symbol.clone();
                next.push(entry);
                Some(symbol)
            }
        };

        self.commit(next).await?;
        if let Some(symbol) = added {
            tracing::info!("Added {} to watchlist", symbol);
        }
        Ok(())
    }

    /// Returns whether the symbol was present.
    pub async fn remove(&mut self, symbol: &str) -> DataResult<bool> {
        let Some(i) = self.position(symbol) else {
            return Ok(false);
        };
        let mut next = self.entries.clone();
        let removed = next.remove(i);
        self.commit(next).await?;
        tracing::info!("Removed {} from watchlist", removed.symbol);
        Ok(true)
    }

    /// Remove the symbol if present, add it otherwise. Returns whether the
    /// symbol is on the list afterwards.
    pub async fn toggle(&mut self, entry: WatchlistEntry) -> DataResult<bool> {
        if self.remove(&entry.symbol).await? {
            Ok(false)
        } else {
            self.add(entry).await?;
            Ok(true)
        }
    }

    pub async fn clear(&mut self) -> DataResult<()> {
        self.commit(Vec::new()).await
    }

    fn position(&self, symbol: &str) -> Option<usize> {
        let symbol = symbol.trim();
        self.entries
            .iter()
            .position(|e| e.symbol.eq_ignore_ascii_case(symbol))
    }

    /// The in-memory list only changes once the store has accepted it.
    async fn commit(&mut self, next: Vec<WatchlistEntry>) -> DataResult<()> {
        self.store.save(&next).await?;
        self.entries = next;
        Ok(())
    }
}

fn normalize(mut entry: WatchlistEntry) -> WatchlistEntry {
    entry.symbol = entry.symbol.trim().to_uppercase();
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scoring_core::DataError;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn watchlist() -> Watchlist<MemoryStore> {
        Watchlist::load(MemoryStore::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_is_idempotent_and_refreshes() {
        let mut wl = watchlist().await;
        wl.add(WatchlistEntry::new("sap.de", "SAP", 70)).await.unwrap();
        let added_at = wl.entries()[0].added_at;

        wl.add(WatchlistEntry::new("SAP.DE", "SAP SE", 74)).await.unwrap();

        assert_eq!(wl.len(), 1);
        let entry = wl.get("sap.de").unwrap();
        assert_eq!(entry.symbol, "SAP.DE");
        assert_eq!(entry.name, "SAP SE");
        assert_eq!(entry.score, 74);
        assert_eq!(entry.added_at, added_at);
    }

    #[tokio::test]
    async fn test_every_change_is_persisted() {
        let mut wl = watchlist().await;
        wl.add(WatchlistEntry::new("AAPL", "Apple Inc", 61)).await.unwrap();
        wl.add(WatchlistEntry::new("MSFT", "Microsoft Corporation", 66)).await.unwrap();
        assert_eq!(wl.store().load().await.unwrap().len(), 2);

        assert!(wl.remove("aapl").await.unwrap());
        assert!(!wl.remove("aapl").await.unwrap());
        let saved = wl.store().load().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].symbol, "MSFT");

        wl.clear().await.unwrap();
        assert!(wl.store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle() {
        let mut wl = watchlist().await;
        let entry = WatchlistEntry::new("TSLA", "Tesla Inc", 48);

        assert!(wl.toggle(entry.clone()).await.unwrap());
        assert!(wl.contains("tsla"));
        assert!(!wl.toggle(entry).await.unwrap());
        assert!(!wl.contains("TSLA"));
        assert!(wl.is_empty());
    }

    #[tokio::test]
    async fn test_reload_keeps_order() {
        let store = MemoryStore::new();
        {
            let mut wl = Watchlist::load(store.clone()).await.unwrap();
            for (symbol, score) in [("B", 1), ("A", 2), ("C", 3)] {
                wl.add(WatchlistEntry::new(symbol, symbol, score)).await.unwrap();
            }
        }

        let wl = Watchlist::load(store).await.unwrap();
        let symbols: Vec<&str> = wl.entries().iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B", "A", "C"]);
    }

    /// Accepts saves until `fail` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: AtomicBool,
    }

    #[async_trait]
    impl WatchlistStore for FlakyStore {
        async fn load(&self) -> DataResult<Vec<WatchlistEntry>> {
            self.inner.load().await
        }

        async fn save(&self, entries: &[WatchlistEntry]) -> DataResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DataError::Api("disk full".to_string()));
            }
            self.inner.save(entries).await
        }
    }

    #[tokio::test]
    async fn test_failed_save_leaves_list_unchanged() {
        let mut wl = Watchlist::load(FlakyStore::default()).await.unwrap();
        wl.add(WatchlistEntry::new("MSFT", "Microsoft Corporation", 66)).await.unwrap();
        wl.store().fail.store(true, Ordering::SeqCst);

        assert!(wl.add(WatchlistEntry::new("AAPL", "Apple Inc", 61)).await.is_err());
        assert_eq!(wl.len(), 1);
        assert!(!wl.contains("AAPL"));

        assert!(wl.add(WatchlistEntry::new("MSFT", "Microsoft", 10)).await.is_err());
        assert_eq!(wl.get("MSFT").unwrap().score, 66);

        assert!(wl.remove("MSFT").await.is_err());
        assert!(wl.contains("MSFT"));

        assert!(wl.clear().await.is_err());
        assert_eq!(wl.len(), 1);

        // Memory and store still agree
        assert_eq!(wl.store().load().await.unwrap(), wl.entries().to_vec());
    }
}
