use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{DataError, DataResult};

/// Fundamental metrics for one company.
///
/// Every ratio is optional: `None` means "not reported", which is never the
/// same thing as `Some(0.0)`. Fractions (margins, returns, yields, growth)
/// are stored as fractions, e.g. `0.20` for 20%.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetrics {
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default, rename = "forwardPE")]
    pub forward_pe: Option<f64>,
    #[serde(default)]
    pub pb: Option<f64>,
    #[serde(default)]
    pub peg: Option<f64>,
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub roa: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,
    #[serde(default)]
    pub quick_ratio: Option<f64>,
    #[serde(default)]
    pub interest_coverage: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub payout_ratio: Option<f64>,
    #[serde(default)]
    pub revenue_growth: Option<f64>,
    #[serde(default)]
    pub earnings_growth: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl CompanyMetrics {
    /// Reject records the engine must never see: any present value that is
    /// NaN or infinite.
    pub fn validate(&self) -> DataResult<()> {
        let numeric = [
            ("pe", self.pe),
            ("forwardPE", self.forward_pe),
            ("pb", self.pb),
            ("peg", self.peg),
            ("profitMargin", self.profit_margin),
            ("roe", self.roe),
            ("roa", self.roa),
            ("debtToEquity", self.debt_to_equity),
            ("currentRatio", self.current_ratio),
            ("quickRatio", self.quick_ratio),
            ("interestCoverage", self.interest_coverage),
            ("dividendYield", self.dividend_yield),
            ("payoutRatio", self.payout_ratio),
            ("revenueGrowth", self.revenue_growth),
            ("earningsGrowth", self.earnings_growth),
            ("marketCap", self.market_cap),
        ];

        for (name, value) in numeric {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(DataError::InvalidData(format!(
                        "{} is not a finite number ({})",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of scoring metrics that are present.
    pub fn present_count(&self) -> usize {
        Metric::ALL
            .iter()
            .filter(|m| m.value_in(self).is_some())
            .count()
    }

    /// SHA-256 of the canonical JSON encoding. Two snapshots with the same
    /// fingerprint always score identically.
    pub fn fingerprint(&self) -> String {
        // Serializing a plain struct of options and strings cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Scoring metrics echoed for display, absent ones as `None`.
    pub fn details(&self) -> BTreeMap<String, Option<f64>> {
        Metric::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), m.value_in(self)))
            .collect()
    }
}

/// The metrics the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Pe,
    Pb,
    Peg,
    ProfitMargin,
    Roe,
    Roa,
    DebtToEquity,
    CurrentRatio,
    InterestCoverage,
    DividendYield,
    PayoutRatio,
    RevenueGrowth,
    EarningsGrowth,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::Pe,
        Metric::Pb,
        Metric::Peg,
        Metric::ProfitMargin,
        Metric::Roe,
        Metric::Roa,
        Metric::DebtToEquity,
        Metric::CurrentRatio,
        Metric::InterestCoverage,
        Metric::DividendYield,
        Metric::PayoutRatio,
        Metric::RevenueGrowth,
        Metric::EarningsGrowth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Pe => "pe",
            Metric::Pb => "pb",
            Metric::Peg => "peg",
            Metric::ProfitMargin => "profitMargin",
            Metric::Roe => "roe",
            Metric::Roa => "roa",
            Metric::DebtToEquity => "debtToEquity",
            Metric::CurrentRatio => "currentRatio",
            Metric::InterestCoverage => "interestCoverage",
            Metric::DividendYield => "dividendYield",
            Metric::PayoutRatio => "payoutRatio",
            Metric::RevenueGrowth => "revenueGrowth",
            Metric::EarningsGrowth => "earningsGrowth",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Pe => "P/E",
            Metric::Pb => "P/B",
            Metric::Peg => "PEG",
            Metric::ProfitMargin => "Profit Margin",
            Metric::Roe => "ROE",
            Metric::Roa => "ROA",
            Metric::DebtToEquity => "Debt/Equity",
            Metric::CurrentRatio => "Current Ratio",
            Metric::InterestCoverage => "Interest Coverage",
            Metric::DividendYield => "Dividend Yield",
            Metric::PayoutRatio => "Payout Ratio",
            Metric::RevenueGrowth => "Revenue Growth",
            Metric::EarningsGrowth => "Earnings Growth",
        }
    }

    pub fn value_in(&self, metrics: &CompanyMetrics) -> Option<f64> {
        match self {
            Metric::Pe => metrics.pe,
            Metric::Pb => metrics.pb,
            Metric::Peg => metrics.peg,
            Metric::ProfitMargin => metrics.profit_margin,
            Metric::Roe => metrics.roe,
            Metric::Roa => metrics.roa,
            Metric::DebtToEquity => metrics.debt_to_equity,
            Metric::CurrentRatio => metrics.current_ratio,
            Metric::InterestCoverage => metrics.interest_coverage,
            Metric::DividendYield => metrics.dividend_yield,
            Metric::PayoutRatio => metrics.payout_ratio,
            Metric::RevenueGrowth => metrics.revenue_growth,
            Metric::EarningsGrowth => metrics.earnings_growth,
        }
    }
}

/// Score categories and their caps. The caps sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreCategory {
    Valuation,
    Profitability,
    Stability,
    Dividend,
    Growth,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Valuation,
        ScoreCategory::Profitability,
        ScoreCategory::Stability,
        ScoreCategory::Dividend,
        ScoreCategory::Growth,
    ];

    pub fn cap(&self) -> u32 {
        match self {
            ScoreCategory::Valuation => 25,
            ScoreCategory::Profitability => 25,
            ScoreCategory::Stability => 20,
            ScoreCategory::Dividend => 15,
            ScoreCategory::Growth => 15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Valuation => "Valuation",
            ScoreCategory::Profitability => "Profitability",
            ScoreCategory::Stability => "Stability",
            ScoreCategory::Dividend => "Dividend",
            ScoreCategory::Growth => "Growth",
        }
    }
}

/// Downside caps applied after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NegativeFilter {
    /// ROE below zero
    NegativeRoe,
    /// Debt/Equity above 2.0
    ExcessiveDebt,
    /// Negative margin together with shrinking earnings
    PersistentLosses,
}

impl NegativeFilter {
    pub const ALL: [NegativeFilter; 3] = [
        NegativeFilter::NegativeRoe,
        NegativeFilter::ExcessiveDebt,
        NegativeFilter::PersistentLosses,
    ];

    /// Highest total a company can reach once this filter fires.
    pub fn cap(&self) -> u32 {
        match self {
            NegativeFilter::NegativeRoe => 30,
            NegativeFilter::ExcessiveDebt => 50,
            NegativeFilter::PersistentLosses => 40,
        }
    }

    pub fn triggered_by(&self, metrics: &CompanyMetrics) -> bool {
        match self {
            NegativeFilter::NegativeRoe => metrics.roe.is_some_and(|roe| roe < 0.0),
            NegativeFilter::ExcessiveDebt => metrics.debt_to_equity.is_some_and(|d| d > 2.0),
            NegativeFilter::PersistentLosses => {
                metrics.profit_margin.is_some_and(|m| m < 0.0)
                    && metrics.earnings_growth.is_some_and(|g| g < 0.0)
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            NegativeFilter::NegativeRoe => "Negative return on equity",
            NegativeFilter::ExcessiveDebt => "Debt/Equity above 2.0",
            NegativeFilter::PersistentLosses => "Losses with declining earnings",
        }
    }
}

/// A negative filter that fired, with the cap it imposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub filter: NegativeFilter,
    pub cap: u32,
}

/// Points one metric earned within its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: Metric,
    pub category: ScoreCategory,
    /// Raw input value (after sector adjustment for P/E and PEG)
    pub value: f64,
    pub points: u32,
    pub max: u32,
}

/// Display tier for a total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreTier {
    Excellent,
    Good,
    Average,
    Weak,
    VeryWeak,
}

impl ScoreTier {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::Excellent => "Excellent",
            ScoreTier::Good => "Good",
            ScoreTier::Average => "Average",
            ScoreTier::Weak => "Weak",
            ScoreTier::VeryWeak => "Very Weak",
        }
    }

    /// Traffic-light class used by table views
    pub fn color(&self) -> &'static str {
        match self {
            ScoreTier::Excellent | ScoreTier::Good => "green",
            ScoreTier::Average => "yellow",
            ScoreTier::Weak | ScoreTier::VeryWeak => "red",
        }
    }
}

/// Output of one evaluation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Composite score, 0 to 100
    pub total: u32,
    pub valuation: u32,
    pub profitability: u32,
    pub stability: u32,
    pub dividend: u32,
    pub growth: u32,
    pub tier: ScoreTier,
    /// Raw metric values echoed for display, `null` when absent
    pub details: BTreeMap<String, Option<f64>>,
    pub breakdown: Vec<MetricScore>,
    pub penalties: Vec<Penalty>,
}

impl ScoreResult {
    pub fn category(&self, category: ScoreCategory) -> u32 {
        match category {
            ScoreCategory::Valuation => self.valuation,
            ScoreCategory::Profitability => self.profitability,
            ScoreCategory::Stability => self.stability,
            ScoreCategory::Dividend => self.dividend,
            ScoreCategory::Growth => self.growth,
        }
    }

    /// Sum of the five sub-scores before any negative filter
    pub fn raw_sum(&self) -> u32 {
        ScoreCategory::ALL.iter().map(|c| self.category(*c)).sum()
    }

    pub fn is_penalized(&self) -> bool {
        !self.penalties.is_empty()
    }
}

/// A resolved company record as returned by a metrics source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySnapshot {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    pub metrics: CompanyMetrics,
    /// Name of the source that produced this record
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl CompanySnapshot {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            currency: None,
            country: None,
            industry: None,
            current_price: None,
            metrics: CompanyMetrics::default(),
            source: source.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: CompanyMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Content key: symbol plus metrics fingerprint
    pub fn content_key(&self) -> String {
        format!("{}:{}", self.symbol, self.metrics.fingerprint())
    }
}

/// One saved watchlist row. Older stores only kept `{symbol, name, score}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub symbol: String,
    pub name: String,
    pub score: u32,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, score: u32) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            score,
            added_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_sum_to_100() {
        let total: u32 = ScoreCategory::ALL.iter().map(|c| c.cap()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_zero_is_not_absent() {
        let metrics = CompanyMetrics {
            dividend_yield: Some(0.0),
            ..Default::default()
        };
        let details = metrics.details();
        assert_eq!(details.get("dividendYield"), Some(&Some(0.0)));
        assert_eq!(details.get("payoutRatio"), Some(&None));
        assert_eq!(metrics.present_count(), 1);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let metrics = CompanyMetrics {
            pe: Some(f64::NAN),
            ..Default::default()
        };
        let err = metrics.validate().unwrap_err();
        assert!(err.is_no_data());
        assert!(err.to_string().contains("pe"));

        let metrics = CompanyMetrics {
            roe: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(metrics.validate().is_err());

        assert!(CompanyMetrics::default().validate().is_ok());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = CompanyMetrics {
            pe: Some(12.0),
            ..Default::default()
        };
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.pe = Some(12.5);
        assert_ne!(a.fingerprint(), b.fingerprint());

        // Absent and zero must hash differently
        let zero = CompanyMetrics {
            pb: Some(0.0),
            ..Default::default()
        };
        assert_ne!(zero.fingerprint(), CompanyMetrics::default().fingerprint());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = r#"{"pe": 15.8, "forwardPE": 14.2, "debtToEquity": 0.35, "sector": "Technology"}"#;
        let metrics: CompanyMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.pe, Some(15.8));
        assert_eq!(metrics.forward_pe, Some(14.2));
        assert_eq!(metrics.debt_to_equity, Some(0.35));
        assert_eq!(metrics.sector.as_deref(), Some("Technology"));
        assert_eq!(metrics.roe, None);
    }

    #[test]
    fn test_negative_filters_trigger() {
        let metrics = CompanyMetrics {
            roe: Some(-0.05),
            debt_to_equity: Some(2.0),
            profit_margin: Some(-0.1),
            ..Default::default()
        };
        assert!(NegativeFilter::NegativeRoe.triggered_by(&metrics));
        // 2.0 is not above 2.0
        assert!(!NegativeFilter::ExcessiveDebt.triggered_by(&metrics));
        // Needs earnings growth as well
        assert!(!NegativeFilter::PersistentLosses.triggered_by(&metrics));
    }

    #[test]
    fn test_watchlist_entry_accepts_legacy_rows() {
        let entries: Vec<WatchlistEntry> =
            serde_json::from_str(r#"[{"symbol": "SAP.DE", "name": "SAP SE", "score": 72}]"#).unwrap();
        assert_eq!(entries[0].symbol, "SAP.DE");
        assert_eq!(entries[0].score, 72);
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(ScoreTier::Excellent.color(), "green");
        assert_eq!(ScoreTier::Average.color(), "yellow");
        assert_eq!(ScoreTier::VeryWeak.label(), "Very Weak");
    }
}
