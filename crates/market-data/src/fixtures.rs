use std::collections::BTreeMap;

use async_trait::async_trait;
use scoring_core::{CompanyMetrics, CompanySnapshot, DataError, DataResult, MetricsSource};

pub const SOURCE_NAME: &str = "fixtures";

struct Fixture {
    symbol: &'static str,
    name: &'static str,
    price: f64,
    currency: &'static str,
    sector: &'static str,
    industry: &'static str,
    country: &'static str,
    market_cap: f64,
    // pe, forward pe, pb, peg
    valuation: [f64; 4],
    // margin, roe, roa
    profitability: [f64; 3],
    // debt/equity, current ratio, quick ratio
    stability: [f64; 3],
    dividend_yield: f64,
    // revenue, earnings
    growth: [f64; 2],
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        symbol: "AAPL",
        name: "Apple Inc",
        price: 192.53,
        currency: "USD",
        sector: "Technology",
        industry: "Consumer Electronics",
        country: "United States",
        market_cap: 3.0e12,
        valuation: [28.4, 24.2, 42.5, 2.1],
        profitability: [0.28, 0.85, 0.18],
        stability: [0.62, 1.18, 1.08],
        dividend_yield: 0.0045,
        growth: [0.06, 0.10],
    },
    Fixture {
        symbol: "MSFT",
        name: "Microsoft Corporation",
        price: 425.89,
        currency: "USD",
        sector: "Technology",
        industry: "Software - Infrastructure",
        country: "United States",
        market_cap: 3.15e12,
        valuation: [35.2, 29.8, 12.1, 2.45],
        profitability: [0.34, 0.42, 0.15],
        stability: [0.45, 1.94, 1.88],
        dividend_yield: 0.0069,
        growth: [0.16, 0.15],
    },
    Fixture {
        symbol: "TSLA",
        name: "Tesla Inc",
        price: 248.45,
        currency: "USD",
        sector: "Consumer Cyclical",
        industry: "Auto Manufacturers",
        country: "United States",
        market_cap: 7.85e11,
        valuation: [68.9, 45.3, 24.5, 1.95],
        profitability: [0.10, 0.25, 0.08],
        stability: [0.20, 1.31, 1.01],
        dividend_yield: 0.0,
        growth: [0.33, 0.45],
    },
    Fixture {
        symbol: "SAP.DE",
        name: "SAP SE",
        price: 98.50,
        currency: "EUR",
        sector: "Technology",
        industry: "Software - Application",
        country: "Germany",
        market_cap: 1.2e11,
        valuation: [15.8, 14.2, 3.2, 1.1],
        profitability: [0.22, 0.20, 0.12],
        stability: [0.35, 1.22, 1.18],
        dividend_yield: 0.015,
        growth: [0.08, 0.12],
    },
];

impl Fixture {
    fn snapshot(&self) -> CompanySnapshot {
        let [pe, forward_pe, pb, peg] = self.valuation;
        let [profit_margin, roe, roa] = self.profitability;
        let [debt_to_equity, current_ratio, quick_ratio] = self.stability;
        let [revenue_growth, earnings_growth] = self.growth;

        let metrics = CompanyMetrics {
            pe: Some(pe),
            forward_pe: Some(forward_pe),
            pb: Some(pb),
            peg: Some(peg),
            profit_margin: Some(profit_margin),
            roe: Some(roe),
            roa: Some(roa),
            debt_to_equity: Some(debt_to_equity),
            current_ratio: Some(current_ratio),
            quick_ratio: Some(quick_ratio),
            interest_coverage: None,
            dividend_yield: Some(self.dividend_yield),
            payout_ratio: None,
            revenue_growth: Some(revenue_growth),
            earnings_growth: Some(earnings_growth),
            sector: Some(self.sector.to_string()),
            market_cap: Some(self.market_cap),
        };

        let mut snapshot = CompanySnapshot::new(self.symbol, self.name, SOURCE_NAME).with_metrics(metrics);
        snapshot.currency = Some(self.currency.to_string());
        snapshot.country = Some(self.country.to_string());
        snapshot.industry = Some(self.industry.to_string());
        snapshot.current_price = Some(self.price);
        snapshot
    }
}

/// Built-in sample records for offline use and demos.
pub struct FixtureSource {
    records: BTreeMap<String, CompanySnapshot>,
}

impl FixtureSource {
    pub fn new() -> Self {
        let records = FIXTURES
            .iter()
            .map(|f| (f.symbol.to_string(), f.snapshot()))
            .collect();
        Self { records }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsSource for FixtureSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, symbol: &str) -> DataResult<CompanySnapshot> {
        let mut snapshot = self
            .records
            .get(&symbol.trim().to_uppercase())
            .cloned()
            .ok_or_else(|| DataError::NotFound(symbol.to_string()))?;
        snapshot.fetched_at = chrono::Utc::now();
        Ok(snapshot)
    }

    async fn list(&self) -> DataResult<Vec<CompanySnapshot>> {
        Ok(self.records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_symbols() {
        let source = FixtureSource::new();
        assert_eq!(source.symbols(), vec!["AAPL", "MSFT", "SAP.DE", "TSLA"]);

        let sap = source.fetch("sap.de").await.unwrap();
        assert_eq!(sap.name, "SAP SE");
        assert_eq!(sap.currency.as_deref(), Some("EUR"));
        assert_eq!(sap.metrics.interest_coverage, None);
        assert!(sap.metrics.validate().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_silently_replaced() {
        let err = FixtureSource::new().fetch("GOOG").await.unwrap_err();
        assert!(matches!(err, DataError::NotFound(ref s) if s == "GOOG"));
    }

    #[tokio::test]
    async fn test_tesla_pays_no_dividend() {
        let tsla = FixtureSource::new().fetch("TSLA").await.unwrap();
        assert_eq!(tsla.metrics.dividend_yield, Some(0.0));
    }
}
