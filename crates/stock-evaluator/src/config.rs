use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use scoring_engine::{AggregationMode, PositivityPolicy, ScoringPolicy, TierThresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistBackend {
    Json,
    Sqlite,
}

impl FromStr for WatchlistBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(WatchlistBackend::Json),
            "sqlite" => Ok(WatchlistBackend::Sqlite),
            other => Err(anyhow!("Unknown watchlist backend: {} (expected json or sqlite)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    // Data sources, tried in this order: CSV, Yahoo, Alpha Vantage, fixtures
    pub stock_data_csv: Option<PathBuf>,
    pub use_yahoo_finance: bool,
    pub alpha_vantage_key: String,     // "demo" disables Alpha Vantage
    pub use_fixtures: bool,
    pub cache_ttl_seconds: i64,        // 300 (5 minutes)

    // Index evaluation
    pub batch_size: usize,             // 5
    pub batch_delay_ms: u64,           // 1000

    // Watchlist
    pub watchlist_backend: WatchlistBackend,
    pub watchlist_path: PathBuf,
    pub database_url: String,

    // Scoring
    pub positivity: PositivityPolicy,
    pub aggregation: AggregationMode,
    pub tier_good: u32,                // 70
    pub tier_average: u32,             // 50
    pub sector_table_path: Option<PathBuf>,
}

impl EvaluatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys take their defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let path = |key: &str| var(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let config = Self {
            stock_data_csv: path("STOCK_DATA_CSV"),
            use_yahoo_finance: get("USE_YAHOO_FINANCE", "true")
                .parse()
                .context("USE_YAHOO_FINANCE must be true or false")?,
            alpha_vantage_key: get("ALPHA_VANTAGE_KEY", market_data::alpha_vantage::DEMO_KEY),
            use_fixtures: get("USE_FIXTURES", "true")
                .parse()
                .context("USE_FIXTURES must be true or false")?,
            cache_ttl_seconds: get("CACHE_TTL_SECONDS", "300")
                .parse()
                .context("CACHE_TTL_SECONDS must be a number")?,

            batch_size: get("BATCH_SIZE", "5").parse().context("BATCH_SIZE must be a number")?,
            batch_delay_ms: get("BATCH_DELAY_MS", "1000")
                .parse()
                .context("BATCH_DELAY_MS must be a number")?,

            watchlist_backend: get("WATCHLIST_BACKEND", "json").parse()?,
            watchlist_path: PathBuf::from(get("WATCHLIST_PATH", "watchlist.json")),
            database_url: get("DATABASE_URL", "sqlite:watchlist.db?mode=rwc"),

            positivity: get("SCORE_POSITIVITY", "strict").parse()?,
            aggregation: get("SCORE_AGGREGATION", "sum").parse()?,
            tier_good: get("TIER_GOOD", "70").parse().context("TIER_GOOD must be a number")?,
            tier_average: get("TIER_AVERAGE", "50")
                .parse()
                .context("TIER_AVERAGE must be a number")?,
            sector_table_path: path("SECTOR_TABLE_PATH"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("BATCH_SIZE must be at least 1");
        }
        if self.cache_ttl_seconds < 0 {
            bail!("CACHE_TTL_SECONDS must not be negative");
        }
        self.cache_ttl()?;
        self.tier_thresholds()?;
        Ok(())
    }

    pub fn tier_thresholds(&self) -> Result<TierThresholds> {
        let defaults = TierThresholds::default();
        Ok(TierThresholds::new(
            defaults.excellent,
            self.tier_good,
            self.tier_average,
            defaults.weak,
        )?)
    }

    pub fn scoring_policy(&self) -> Result<ScoringPolicy> {
        Ok(ScoringPolicy::default()
            .with_positivity(self.positivity)
            .with_aggregation(self.aggregation)
            .with_tiers(self.tier_thresholds()?))
    }

    pub fn cache_ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_seconds(self.cache_ttl_seconds)
            .ok_or_else(|| anyhow!("CACHE_TTL_SECONDS is out of range: {}", self.cache_ttl_seconds))
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn alpha_vantage_enabled(&self) -> bool {
        self.alpha_vantage_key != market_data::alpha_vantage::DEMO_KEY
    }
}
