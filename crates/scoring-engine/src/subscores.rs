//! The five independent sub-scorers.
//!
//! Each one reads only the metrics of its category and degrades to zero
//! points for anything absent. Percent metrics are compared after `× 100`.

use scoring_core::{CompanyMetrics, Metric, MetricScore, ScoreCategory, SectorAdjustment};

use crate::policy::PositivityPolicy;

/// Points for one category plus the per-metric contributions behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct SubScore {
    pub category: ScoreCategory,
    pub points: u32,
    pub components: Vec<MetricScore>,
}

impl SubScore {
    fn new(category: ScoreCategory) -> Self {
        Self {
            category,
            points: 0,
            components: Vec::new(),
        }
    }

    fn add(&mut self, metric: Metric, value: f64, points: u32, max: u32) {
        let points = points.min(max);
        self.points += points;
        self.components.push(MetricScore {
            metric,
            category: self.category,
            value,
            points,
            max,
        });
    }

    fn capped(mut self) -> Self {
        self.points = self.points.min(self.category.cap());
        self
    }
}

fn passes(value: f64, require_positive: bool) -> bool {
    !require_positive || value > 0.0
}

/// Valuation (cap 25): P/E 10, P/B 10, PEG 5. Lower is better.
pub fn valuation(
    metrics: &CompanyMetrics,
    adjustment: SectorAdjustment,
    positivity: PositivityPolicy,
) -> SubScore {
    let mut score = SubScore::new(ScoreCategory::Valuation);

    if let Some(pe) = metrics.pe.filter(|pe| *pe > 0.0) {
        let adjusted = adjustment.adjust_pe(pe);
        let points = if adjusted < 10.0 {
            10
        } else if adjusted < 15.0 {
            8
        } else if adjusted < 20.0 {
            6
        } else if adjusted < 25.0 {
            4
        } else if adjusted < 30.0 {
            2
        } else {
            0
        };
        score.add(Metric::Pe, adjusted, points, 10);
    }

    let pb_strict = positivity == PositivityPolicy::Strict;
    if let Some(pb) = metrics.pb.filter(|pb| passes(*pb, pb_strict)) {
        let points = if pb < 1.0 {
            10
        } else if pb < 2.0 {
            8
        } else if pb < 3.0 {
            6
        } else if pb < 5.0 {
            4
        } else if pb < 7.0 {
            2
        } else {
            0
        };
        score.add(Metric::Pb, pb, points, 10);
    }

    if let Some(peg) = metrics.peg.filter(|peg| *peg > 0.0) {
        let adjusted = adjustment.adjust_peg(peg);
        let points = if adjusted < 1.0 {
            5
        } else if adjusted < 1.5 {
            4
        } else if adjusted < 2.0 {
            3
        } else if adjusted < 2.5 {
            2
        } else if adjusted < 3.0 {
            1
        } else {
            0
        };
        score.add(Metric::Peg, adjusted, points, 5);
    }

    score.capped()
}

/// Profitability (cap 25): margin 10, ROE 10, ROA 5. Higher is better.
pub fn profitability(metrics: &CompanyMetrics) -> SubScore {
    let mut score = SubScore::new(ScoreCategory::Profitability);

    if let Some(margin) = metrics.profit_margin {
        let pct = margin * 100.0;
        let points = if pct >= 20.0 {
            10
        } else if pct >= 15.0 {
            8
        } else if pct >= 10.0 {
            6
        } else if pct >= 5.0 {
            4
        } else if pct >= 0.0 {
            2
        } else {
            0
        };
        score.add(Metric::ProfitMargin, margin, points, 10);
    }

    if let Some(roe) = metrics.roe {
        let pct = roe * 100.0;
        let points = if pct >= 20.0 {
            10
        } else if pct >= 15.0 {
            8
        } else if pct >= 10.0 {
            6
        } else if pct >= 5.0 {
            4
        } else if pct > 0.0 {
            2
        } else {
            0
        };
        score.add(Metric::Roe, roe, points, 10);
    }

    if let Some(roa) = metrics.roa {
        let pct = roa * 100.0;
        let points = if pct >= 10.0 {
            5
        } else if pct >= 7.0 {
            4
        } else if pct >= 5.0 {
            3
        } else if pct >= 3.0 {
            2
        } else if pct > 0.0 {
            1
        } else {
            0
        };
        score.add(Metric::Roa, roa, points, 5);
    }

    score.capped()
}

/// Stability (cap 20): debt/equity 10, current ratio 5, interest coverage 5.
pub fn stability(metrics: &CompanyMetrics) -> SubScore {
    let mut score = SubScore::new(ScoreCategory::Stability);

    if let Some(dte) = metrics.debt_to_equity.filter(|d| *d >= 0.0) {
        let points = if dte < 0.5 {
            10
        } else if dte < 1.0 {
            8
        } else if dte < 1.5 {
            6
        } else if dte < 2.0 {
            4
        } else if dte < 3.0 {
            2
        } else {
            0
        };
        score.add(Metric::DebtToEquity, dte, points, 10);
    }

    if let Some(cr) = metrics.current_ratio {
        let points = if cr >= 2.0 {
            5
        } else if cr >= 1.5 {
            4
        } else if cr >= 1.0 {
            3
        } else if cr >= 0.8 {
            2
        } else if cr > 0.0 {
            1
        } else {
            0
        };
        score.add(Metric::CurrentRatio, cr, points, 5);
    }

    // Several sources never report coverage; absence is simply no points.
    if let Some(coverage) = metrics.interest_coverage {
        let points = if coverage >= 10.0 {
            5
        } else if coverage >= 5.0 {
            4
        } else if coverage >= 3.0 {
            3
        } else if coverage >= 2.0 {
            2
        } else if coverage > 1.0 {
            1
        } else {
            0
        };
        score.add(Metric::InterestCoverage, coverage, points, 5);
    }

    score.capped()
}

/// Dividend (cap 15): yield 8, payout ratio 7.
pub fn dividend(metrics: &CompanyMetrics, positivity: PositivityPolicy) -> SubScore {
    let mut score = SubScore::new(ScoreCategory::Dividend);

    let yield_strict = positivity == PositivityPolicy::Strict;
    if let Some(dividend_yield) = metrics.dividend_yield.filter(|y| passes(*y, yield_strict)) {
        let pct = dividend_yield * 100.0;
        let points = if pct >= 4.0 {
            8
        } else if pct >= 3.0 {
            6
        } else if pct >= 2.0 {
            4
        } else if pct >= 1.0 {
            2
        } else {
            0
        };
        score.add(Metric::DividendYield, dividend_yield, points, 8);
    }

    // Payout is a band around 30-60%, not a monotonic scale.
    if let Some(payout) = metrics.payout_ratio.filter(|p| *p > 0.0) {
        let pct = payout * 100.0;
        let points = if (30.0..=60.0).contains(&pct) {
            7
        } else if (20.0..=70.0).contains(&pct) {
            5
        } else if (10.0..=80.0).contains(&pct) {
            3
        } else if pct < 100.0 {
            1
        } else {
            0
        };
        score.add(Metric::PayoutRatio, payout, points, 7);
    }

    score.capped()
}

/// Growth (cap 15): revenue 8, earnings 7. Negative growth is a valid input.
pub fn growth(metrics: &CompanyMetrics) -> SubScore {
    let mut score = SubScore::new(ScoreCategory::Growth);

    if let Some(revenue) = metrics.revenue_growth {
        let pct = revenue * 100.0;
        let points = if pct >= 15.0 {
            8
        } else if pct >= 10.0 {
            6
        } else if pct >= 5.0 {
            4
        } else if pct >= 0.0 {
            2
        } else {
            0
        };
        score.add(Metric::RevenueGrowth, revenue, points, 8);
    }

    if let Some(earnings) = metrics.earnings_growth {
        let pct = earnings * 100.0;
        let points = if pct >= 15.0 {
            7
        } else if pct >= 10.0 {
            5
        } else if pct >= 5.0 {
            3
        } else if pct >= 0.0 {
            1
        } else {
            0
        };
        score.add(Metric::EarningsGrowth, earnings, points, 7);
    }

    score.capped()
}
