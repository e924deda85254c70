use async_trait::async_trait;

use crate::{CompanySnapshot, DataResult, WatchlistEntry};

/// Supplies resolved company records to the scoring engine.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Short identifier used in logs and in `CompanySnapshot::source`
    fn name(&self) -> &str;

    /// Fetch one symbol. A symbol the source does not know is `DataError::NotFound`.
    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot>;

    /// Every record the source can enumerate. Remote APIs cannot, and return
    /// an empty list.
    async fn list(&self) -> DataResult<Vec<CompanySnapshot>> {
        Ok(Vec::new())
    }
}

/// Persists the watchlist as a whole.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn load(&self) -> DataResult<Vec<WatchlistEntry>>;

    async fn save(&self, entries: &[WatchlistEntry]) -> DataResult<()>;
}
