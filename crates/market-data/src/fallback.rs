use std::sync::Arc;

use async_trait::async_trait;
use scoring_core::{CompanySnapshot, DataError, DataResult, MetricsSource};
use tracing::{debug, warn};

/// Tries each source in order and returns the first record found.
#[derive(Clone, Default)]
pub struct FallbackSource {
    sources: Vec<Arc<dyn MetricsSource>>,
}

impl FallbackSource {
    pub fn new(sources: Vec<Arc<dyn MetricsSource>>) -> Self {
        Self { sources }
    }

    pub fn with_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl MetricsSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    /// `NotFound` when every source lacks the symbol. If any source failed
    /// for another reason, the last such error is returned instead.
    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
        let mut last_failure: Option<DataError> = None;

        for source in &self.sources {
            match source.fetch(symbol).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if e.is_no_data() => {
                    debug!("{}: no data for {} ({})", source.name(), symbol, e);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", source.name(), symbol, e);
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| DataError::NotFound(symbol.to_string())))
    }

    /// Listing of the first source that can enumerate its records.
    async fn list(&self) -> DataResult<Vec<CompanySnapshot>> {
        for source in &self.sources {
            let records = source.list().await?;
            if !records.is_empty() {
                return Ok(records);
            }
        }
        Ok(Vec::new())
    }
}
