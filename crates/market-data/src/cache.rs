use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use scoring_core::{CompanySnapshot, DataResult, MetricsSource};

pub const DEFAULT_TTL_SECS: i64 = 300;

/// Internal cache entry with timestamp
struct CacheEntry {
    data: CompanySnapshot,
    cached_at: DateTime<Utc>,
}

/// Memoises successful fetches of the wrapped source for `ttl`.
/// Failures are never cached.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl<S: MetricsSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: MetricsSource> MetricsSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
        let cache_key = symbol.trim().to_uppercase();
        if let Some(entry) = self.entries.get(&cache_key) {
            if Utc::now() - entry.cached_at < self.ttl {
                tracing::trace!("Cache hit for {}", cache_key);
                return Ok(entry.data.clone());
            }
        }

        let snapshot = self.inner.fetch(symbol).await?;

        self.entries.insert(
            cache_key,
            CacheEntry {
                data: snapshot.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(snapshot)
    }

    async fn list(&self) -> DataResult<Vec<CompanySnapshot>> {
        self.inner.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixtureSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        inner: FixtureSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricsSource for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(symbol).await
        }
    }

    fn counting() -> Counting {
        Counting {
            inner: FixtureSource::new(),
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_hits_within_ttl() {
        let cached = CachedSource::new(counting());
        cached.fetch("AAPL").await.unwrap();
        cached.fetch("aapl").await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.name(), "counting");
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let cached = CachedSource::with_ttl(counting(), Duration::zero());
        cached.fetch("MSFT").await.unwrap();
        cached.fetch("MSFT").await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cached = CachedSource::new(counting());
        assert!(cached.fetch("NOPE").await.is_err());
        assert!(cached.fetch("NOPE").await.is_err());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let cached = CachedSource::new(counting());
        cached.fetch("TSLA").await.unwrap();
        cached.clear();
        assert!(cached.is_empty());
        cached.fetch("TSLA").await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
