//! Stock Scoring Engine
//!
//! Turns one company's fundamental metrics into a 0-100 score built from
//! five capped sub-scores (valuation, profitability, stability, dividend,
//! growth), then applies downside caps for structural red flags.
//!
//! The engine is pure: no I/O, no shared mutable state, and it never fails.
//! Inputs must already be validated (see `CompanyMetrics::validate`).

pub mod classification;
pub mod policy;
pub mod subscores;

use std::sync::Arc;

use scoring_core::{CompanyMetrics, NegativeFilter, Penalty, ScoreCategory, ScoreResult, ScoreTier, SectorTable};
use tracing::{debug, warn};

pub use classification::classify;
pub use policy::{AggregationMode, PolicyError, PositivityPolicy, ScoringPolicy, TierThresholds};
pub use subscores::SubScore;

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
    sectors: Arc<SectorTable>,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            sectors: Arc::new(SectorTable::builtin()),
        }
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        if policy.aggregation == AggregationMode::Weighted {
            warn!(
                "Weighted aggregation selected: category caps are applied twice, \
                 totals are not comparable with the default sum"
            );
        }
        self.policy = policy;
        self
    }

    pub fn with_sectors(mut self, sectors: Arc<SectorTable>) -> Self {
        self.sectors = sectors;
        self
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn sectors(&self) -> &SectorTable {
        &self.sectors
    }

    /// Score one company.
    pub fn score(&self, metrics: &CompanyMetrics) -> ScoreResult {
        let parts = [
            self.valuation(metrics),
            subscores::profitability(metrics),
            subscores::stability(metrics),
            subscores::dividend(metrics, self.policy.positivity),
            subscores::growth(metrics),
        ];

        let aggregated = self.aggregate(&parts);
        let (capped, penalties) = apply_negative_filters(aggregated, metrics);
        let total = capped.round().clamp(0.0, 100.0) as u32;

        debug!(
            sector = metrics.sector.as_deref().unwrap_or("-"),
            aggregated,
            total,
            penalties = penalties.len(),
            "Scored company"
        );

        let points = |category: ScoreCategory| {
            parts
                .iter()
                .find(|p| p.category == category)
                .map(|p| p.points)
                .unwrap_or(0)
        };

        ScoreResult {
            total,
            valuation: points(ScoreCategory::Valuation),
            profitability: points(ScoreCategory::Profitability),
            stability: points(ScoreCategory::Stability),
            dividend: points(ScoreCategory::Dividend),
            growth: points(ScoreCategory::Growth),
            tier: self.classify(total),
            details: metrics.details(),
            breakdown: parts.into_iter().flat_map(|p| p.components).collect(),
            penalties,
        }
    }

    pub fn valuation_score(&self, metrics: &CompanyMetrics) -> u32 {
        self.valuation(metrics).points
    }

    pub fn profitability_score(&self, metrics: &CompanyMetrics) -> u32 {
        subscores::profitability(metrics).points
    }

    pub fn stability_score(&self, metrics: &CompanyMetrics) -> u32 {
        subscores::stability(metrics).points
    }

    pub fn dividend_score(&self, metrics: &CompanyMetrics) -> u32 {
        subscores::dividend(metrics, self.policy.positivity).points
    }

    pub fn growth_score(&self, metrics: &CompanyMetrics) -> u32 {
        subscores::growth(metrics).points
    }

    pub fn classify(&self, total: u32) -> ScoreTier {
        classify(total, &self.policy.tiers)
    }

    fn valuation(&self, metrics: &CompanyMetrics) -> SubScore {
        let adjustment = self.sectors.lookup(metrics.sector.as_deref());
        subscores::valuation(metrics, adjustment, self.policy.positivity)
    }

    fn aggregate(&self, parts: &[SubScore]) -> f64 {
        match self.policy.aggregation {
            AggregationMode::Sum => parts.iter().map(|p| p.points as f64).sum(),
            AggregationMode::Weighted => parts
                .iter()
                .map(|p| p.points as f64 * p.category.cap() as f64 / 100.0)
                .sum(),
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply every triggered downside cap to `total`.
///
/// Each cap only lowers the running value, so the result is the minimum of
/// `total` and all triggered caps regardless of order.
pub fn apply_negative_filters(total: f64, metrics: &CompanyMetrics) -> (f64, Vec<Penalty>) {
    let mut running = total;
    let mut penalties = Vec::new();

    for filter in NegativeFilter::ALL {
        if filter.triggered_by(metrics) {
            running = running.min(filter.cap() as f64);
            penalties.push(Penalty {
                filter,
                cap: filter.cap(),
            });
        }
    }

    (running, penalties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario() -> CompanyMetrics {
        CompanyMetrics {
            pe: Some(12.0),
            pb: Some(1.5),
            peg: Some(0.8),
            profit_margin: Some(0.22),
            roe: Some(0.18),
            roa: Some(0.09),
            debt_to_equity: Some(0.4),
            current_ratio: Some(2.1),
            dividend_yield: Some(0.035),
            payout_ratio: Some(0.45),
            revenue_growth: Some(0.12),
            earnings_growth: Some(0.11),
            sector: Some("Technology".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_company_scores_84() {
        let engine = ScoringEngine::new();
        let result = engine.score(&scenario());

        assert_eq!(result.valuation, 23);
        assert_eq!(result.profitability, 22);
        assert_eq!(result.stability, 15);
        assert_eq!(result.dividend, 13);
        assert_eq!(result.growth, 11);
        assert_eq!(result.total, 84);
        assert_eq!(result.raw_sum(), 84);
        assert_eq!(result.tier, ScoreTier::Excellent);
        assert!(result.penalties.is_empty());

        // interest coverage absent, every other metric contributes
        assert_eq!(result.breakdown.len(), 12);
        assert_eq!(result.details.get("interestCoverage"), Some(&None));
        assert_eq!(result.details.get("pe"), Some(&Some(12.0)));
    }

    #[test]
    fn test_negative_roe_caps_at_30() {
        let metrics = CompanyMetrics {
            roe: Some(-0.05),
            ..scenario()
        };
        let result = ScoringEngine::new().score(&metrics);

        assert!(result.raw_sum() > 30);
        assert_eq!(result.total, 30);
        assert_eq!(
            result.penalties,
            vec![Penalty {
                filter: NegativeFilter::NegativeRoe,
                cap: 30
            }]
        );
        assert_eq!(result.tier, ScoreTier::VeryWeak);
    }

    #[test]
    fn test_multiple_filters_take_minimum() {
        let metrics = CompanyMetrics {
            debt_to_equity: Some(2.5),
            profit_margin: Some(-0.1),
            earnings_growth: Some(-0.2),
            ..scenario()
        };
        let result = ScoringEngine::new().score(&metrics);
        assert_eq!(result.penalties.len(), 2);
        assert_eq!(result.total, 40);
    }

    #[test]
    fn test_sector_only_scores_zero() {
        let engine = ScoringEngine::new();
        let metrics = CompanyMetrics {
            sector: Some("Energy".to_string()),
            ..Default::default()
        };
        for m in [CompanyMetrics::default(), metrics] {
            let result = engine.score(&m);
            assert_eq!(result.total, 0);
            assert_eq!(result.raw_sum(), 0);
            assert!(result.breakdown.is_empty());
            assert!(result.penalties.is_empty());
            assert!(result.details.values().all(|v| v.is_none()));
        }
    }

    #[test]
    fn test_bounds_over_value_grid() {
        let engine = ScoringEngine::new();
        let ratios = [-5.0, -0.5, 0.0, 0.3, 0.9, 1.7, 2.5, 8.0, 45.0, 400.0];
        let fractions = [-0.8, -0.05, 0.0, 0.02, 0.07, 0.12, 0.18, 0.45, 0.75, 1.5];

        for &r in &ratios {
            for &f in &fractions {
                let metrics = CompanyMetrics {
                    pe: Some(r),
                    pb: Some(r),
                    peg: Some(r / 10.0),
                    profit_margin: Some(f),
                    roe: Some(f),
                    roa: Some(f / 2.0),
                    debt_to_equity: Some(r / 4.0),
                    current_ratio: Some(r / 3.0),
                    interest_coverage: Some(r),
                    dividend_yield: Some(f / 10.0),
                    payout_ratio: Some(f),
                    revenue_growth: Some(f),
                    earnings_growth: Some(-f),
                    sector: Some("Utilities".to_string()),
                    ..Default::default()
                };
                let result = engine.score(&metrics);
                assert!(result.total <= 100);
                for category in ScoreCategory::ALL {
                    assert!(result.category(category) <= category.cap());
                }
                for component in &result.breakdown {
                    assert!(component.points <= component.max);
                }
            }
        }
    }

    #[test]
    fn test_lower_pe_never_hurts_valuation() {
        let engine = ScoringEngine::new();
        let mut previous = 0;
        let mut pe = 80.0;
        while pe > 0.5 {
            let metrics = CompanyMetrics {
                pe: Some(pe),
                ..scenario()
            };
            let points = engine.valuation_score(&metrics);
            assert!(points >= previous, "pe {} scored {} < {}", pe, points, previous);
            previous = points;
            pe -= 0.5;
        }
    }

    #[test]
    fn test_higher_roe_never_hurts_profitability() {
        let engine = ScoringEngine::new();
        let mut previous = 0;
        for step in -50..=60 {
            let metrics = CompanyMetrics {
                roe: Some(step as f64 / 100.0),
                ..scenario()
            };
            let points = engine.profitability_score(&metrics);
            assert!(points >= previous);
            previous = points;
        }
    }

    #[test]
    fn test_filters_are_order_independent_and_idempotent() {
        let metrics = CompanyMetrics {
            roe: Some(-0.1),
            debt_to_equity: Some(3.0),
            profit_margin: Some(-0.2),
            earnings_growth: Some(-0.3),
            ..Default::default()
        };

        let (once, penalties) = apply_negative_filters(77.0, &metrics);
        assert_relative_eq!(once, 30.0);
        assert_eq!(penalties.len(), 3);

        let (twice, _) = apply_negative_filters(once, &metrics);
        assert_relative_eq!(twice, once);

        let reversed = NegativeFilter::ALL
            .iter()
            .rev()
            .filter(|f| f.triggered_by(&metrics))
            .fold(77.0_f64, |acc, f| acc.min(f.cap() as f64));
        assert_relative_eq!(reversed, once);

        // Caps never raise a low total
        let (low, _) = apply_negative_filters(12.0, &metrics);
        assert_relative_eq!(low, 12.0);
    }

    #[test]
    fn test_weighted_aggregation() {
        let policy = ScoringPolicy::default().with_aggregation(AggregationMode::Weighted);
        let engine = ScoringEngine::new().with_policy(policy);
        let result = engine.score(&scenario());

        // (23*25 + 22*25 + 15*20 + 13*15 + 11*15) / 100 = 17.85
        assert_eq!(result.total, 18);
        assert_eq!(result.valuation, 23);
    }

    #[test]
    fn test_half_point_totals_round_up() {
        let engine = ScoringEngine::new()
            .with_policy(ScoringPolicy::default().with_aggregation(AggregationMode::Weighted));

        // Margin 25% earns 10 profitability points: 10 * 25 / 100 = 2.5
        let metrics = CompanyMetrics {
            profit_margin: Some(0.25),
            ..Default::default()
        };
        assert_eq!(engine.profitability_score(&metrics), 10);
        assert_eq!(engine.score(&metrics).total, 3);

        // Margin 1% earns 2 points: 2 * 25 / 100 = 0.5
        let metrics = CompanyMetrics {
            profit_margin: Some(0.01),
            ..Default::default()
        };
        assert_eq!(engine.profitability_score(&metrics), 2);
        assert_eq!(engine.score(&metrics).total, 1);
    }

    #[test]
    fn test_lax_positivity() {
        let metrics = CompanyMetrics {
            pb: Some(0.0),
            ..Default::default()
        };
        let strict = ScoringEngine::new();
        let lax = ScoringEngine::new()
            .with_policy(ScoringPolicy::default().with_positivity(PositivityPolicy::Lax));

        assert_eq!(strict.valuation_score(&metrics), 0);
        assert_eq!(lax.valuation_score(&metrics), 10);
    }

    #[test]
    fn test_payout_in_band() {
        let metrics = CompanyMetrics {
            payout_ratio: Some(0.6),
            ..Default::default()
        };
        assert_eq!(ScoringEngine::new().dividend_score(&metrics), 7);
    }

    #[test]
    fn test_custom_sector_table() {
        let json = r#"{
            "defaultSector": "Other",
            "sectors": {"Other": {"peMultiplier": 1.0, "pegMultiplier": 1.0}}
        }"#;
        let table = SectorTable::from_json(json).unwrap();
        let engine = ScoringEngine::new().with_sectors(Arc::new(table));

        // 12 is no longer divided by 1.3
        let metrics = CompanyMetrics {
            pe: Some(12.0),
            sector: Some("Technology".to_string()),
            ..Default::default()
        };
        assert_eq!(engine.valuation_score(&metrics), 8);
        assert_eq!(ScoringEngine::new().valuation_score(&metrics), 10);
    }

    #[test]
    fn test_custom_tiers() {
        let tiers = TierThresholds::new(80, 65, 41, 35).unwrap();
        let engine = ScoringEngine::new().with_policy(ScoringPolicy::default().with_tiers(tiers));
        assert_eq!(engine.classify(66), ScoreTier::Good);
        assert_eq!(ScoringEngine::new().classify(66), ScoreTier::Average);
    }

    #[test]
    fn test_result_serializes() {
        let result = ScoringEngine::new().score(&scenario());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total"], 84);
        assert!(json["details"]["interestCoverage"].is_null());
    }
}
