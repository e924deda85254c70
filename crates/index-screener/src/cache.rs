use dashmap::DashMap;
use scoring_core::{CompanyMetrics, ScoreResult};
use scoring_engine::ScoringEngine;

struct CachedScore {
    fingerprint: String,
    result: ScoreResult,
}

/// Memoises the latest score per symbol.
///
/// Scoring is deterministic, so a result stays valid for as long as the
/// metrics it was computed from do not change. New metrics for a symbol
/// replace its entry, so the cache holds at most one score per symbol.
#[derive(Default)]
pub struct ScoreCache {
    entries: DashMap<String, CachedScore>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_score(&self, engine: &ScoringEngine, symbol: &str, metrics: &CompanyMetrics) -> ScoreResult {
        let key = symbol.trim().to_uppercase();
        let fingerprint = metrics.fingerprint();
        if let Some(hit) = self.entries.get(&key) {
            if hit.fingerprint == fingerprint {
                return hit.result.clone();
            }
        }

        let result = engine.score(metrics);
        self.entries.insert(
            key,
            CachedScore {
                fingerprint,
                result: result.clone(),
            },
        );
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
