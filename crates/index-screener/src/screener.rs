use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use scoring_core::{DataResult, MetricsSource};
use scoring_engine::ScoringEngine;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::{rank, MarketIndex, RankedCompany, ScoreCache, ScoredCompany, ScreenerError};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1000);

/// A symbol that could not be evaluated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
    /// The source had no record, as opposed to a transport failure
    pub no_data: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub index_name: String,
    pub ranked: Vec<RankedCompany>,
    pub failures: Vec<SymbolFailure>,
    pub evaluated_at: DateTime<Utc>,
}

impl IndexReport {
    pub fn requested(&self) -> usize {
        self.ranked.len() + self.failures.len()
    }

    pub fn companies(&self) -> Vec<ScoredCompany> {
        self.ranked.iter().map(|r| r.company.clone()).collect()
    }
}

/// Fetches and scores whole indices, a batch at a time.
pub struct IndexScreener {
    source: Arc<dyn MetricsSource>,
    engine: Arc<ScoringEngine>,
    cache: ScoreCache,
    batch_size: usize,
    batch_delay: Duration,
}

impl IndexScreener {
    pub fn new(source: Arc<dyn MetricsSource>, engine: Arc<ScoringEngine>) -> Self {
        Self {
            source,
            engine,
            cache: ScoreCache::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Fetch and score one symbol.
    pub async fn score_symbol(&self, symbol: &str) -> DataResult<ScoredCompany> {
        let snapshot = self.source.fetch(symbol).await?;
        snapshot.metrics.validate()?;
        let score = self
            .cache
            .get_or_score(&self.engine, &snapshot.symbol, &snapshot.metrics);
        Ok(ScoredCompany::new(snapshot, score))
    }

    pub async fn evaluate_index(&self, key: &str) -> Result<IndexReport, ScreenerError> {
        let index = MarketIndex::by_key(key).ok_or_else(|| ScreenerError::UnknownIndex(key.to_string()))?;
        Ok(self.evaluate_symbols(index.name, index.symbols).await)
    }

    /// Evaluate an arbitrary symbol list. Symbols in a batch are fetched
    /// concurrently; batches are separated by the configured delay.
    pub async fn evaluate_symbols<S: AsRef<str>>(&self, index_name: &str, symbols: &[S]) -> IndexReport {
        tracing::info!("📊 Evaluating {} ({} symbols)", index_name, symbols.len());

        let mut scored = Vec::new();
        let mut failures = Vec::new();

        for (i, batch) in symbols.chunks(self.batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let mut tasks = JoinSet::new();
            let mut pending: Vec<String> = Vec::with_capacity(batch.len());
            for symbol in batch {
                let symbol = symbol.as_ref().to_string();
                pending.push(symbol.clone());
                let source = Arc::clone(&self.source);
                tasks.spawn(async move {
                    let result = source.fetch(&symbol).await;
                    (symbol, result)
                });
            }

            while let Some(result) = tasks.join_next().await {
                if let Ok((symbol, _)) = &result {
                    if let Some(i) = pending.iter().position(|p| p == symbol) {
                        pending.swap_remove(i);
                    }
                }
                match result {
                    Ok((symbol, Ok(snapshot))) => match snapshot.metrics.validate() {
                        Ok(()) => {
                            let score = self
                                .cache
                                .get_or_score(&self.engine, &snapshot.symbol, &snapshot.metrics);
                            scored.push(ScoredCompany::new(snapshot, score));
                        }
                        Err(e) => failures.push(failure(symbol, &e)),
                    },
                    Ok((symbol, Err(e))) => {
                        if e.is_no_data() {
                            tracing::debug!("No data for {}: {}", symbol, e);
                        } else {
                            tracing::warn!("Failed to fetch {}: {}", symbol, e);
                        }
                        failures.push(failure(symbol, &e));
                    }
                    Err(e) => {
                        tracing::error!("Task error: {}", e);
                    }
                }
            }

            // Tasks that panicked or were cancelled never reported their symbol
            for symbol in pending {
                failures.push(SymbolFailure {
                    symbol,
                    error: "evaluation task failed".to_string(),
                    no_data: false,
                });
            }
        }

        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let ranked = rank(scored);

        tracing::info!(
            "✅ {} evaluated: {} scored, {} failed",
            index_name,
            ranked.len(),
            failures.len()
        );

        IndexReport {
            index_name: index_name.to_string(),
            ranked,
            failures,
            evaluated_at: Utc::now(),
        }
    }
}

fn failure(symbol: String, error: &scoring_core::DataError) -> SymbolFailure {
    SymbolFailure {
        symbol,
        error: error.to_string(),
        no_data: error.is_no_data(),
    }
}
